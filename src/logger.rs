//! Terminal output: prefixed log lines, the watch-mode status block and the
//! batch progress counter.
//!
//! ```ignore
//! log!("install"; "installed {}", name);
//! debug!("watch"; "{} events", n); // only with --verbose
//!
//! let progress = ProgressLine::new("install", 8);
//! progress.inc();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Set by `--verbose`.
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// A progress line owns the current terminal row.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message with a colored module prefix
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Print one prefixed line. An active progress line is wiped first and
/// redrawn on its next update.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "install" | "control" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "compat" => prefix.bright_magenta().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

/// Wall clock as `HH:MM:SS` (UTC).
fn clock() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

// ============================================================================
// Status block
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Success,
    Unchanged,
    Error,
    Warning,
}

impl Mark {
    fn symbol(self) -> String {
        match self {
            Self::Success => "✓".green().to_string(),
            Self::Unchanged => String::new(),
            Self::Error => "✗".red().to_string(),
            Self::Warning => "⚠".yellow().to_string(),
        }
    }
}

/// The last status message in watch mode. Each new message replaces the
/// previous one, so countdown ticks and batch results share one block.
struct StatusBlock {
    /// Rows the previous message occupies.
    rows: usize,
}

static STATUS: LazyLock<Mutex<StatusBlock>> = LazyLock::new(|| Mutex::new(StatusBlock { rows: 0 }));

impl StatusBlock {
    fn show(&mut self, mark: Mark, message: &str) {
        let mut stdout = stdout().lock();

        if self.rows > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let rows = self.rows.min(u16::MAX as usize) as u16;
            execute!(stdout, cursor::MoveUp(rows), Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", clock()).dimmed().to_string();
        let body = match mark {
            Mark::Unchanged => message.dimmed().to_string(),
            _ => message.to_owned(),
        };
        let symbol = mark.symbol();
        if symbol.is_empty() {
            writeln!(stdout, "{stamp} {body}").ok();
        } else {
            writeln!(stdout, "{stamp} {symbol} {body}").ok();
        }
        stdout.flush().ok();

        self.rows = row_count(message);
    }
}

fn row_count(message: &str) -> usize {
    message.lines().count().max(1)
}

pub fn status_success(message: &str) {
    STATUS.lock().show(Mark::Success, message);
}

/// Dimmed, no symbol. Used for countdowns and no-op results.
pub fn status_unchanged(message: &str) {
    STATUS.lock().show(Mark::Unchanged, message);
}

/// Summary line plus an optional detail block.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_owned()
    } else {
        format!("{summary}\n{detail}")
    };
    STATUS.lock().show(Mark::Error, &message);
}

pub fn status_warning(detail: &str) {
    STATUS.lock().show(Mark::Warning, detail);
}

// ============================================================================
// Progress line
// ============================================================================

/// In-place `[install] 5/8` counter for one batch.
///
/// Updates from other threads never block: when a redraw is already in
/// progress the update is only counted.
pub struct ProgressLine {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
    redraw: Mutex<()>,
}

impl ProgressLine {
    pub fn new(label: &'static str, total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        let line = Self {
            label,
            total,
            done: AtomicUsize::new(0),
            redraw: Mutex::new(()),
        };
        line.draw(false);
        line
    }

    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.redraw.try_lock() {
            self.draw(false);
        }
    }

    /// Leave the final count on screen.
    pub fn finish(self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        {
            let _guard = self.redraw.lock();
            self.draw(true);
        }
        std::mem::forget(self);
    }

    fn render(&self) -> String {
        let done = self.done.load(Ordering::Relaxed).min(self.total);
        format!("{} {}/{}", colorize_prefix(self.label), done, self.total)
    }

    fn draw(&self, newline: bool) {
        let line = self.render();
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(stdout, "{line}").ok();
        } else {
            write!(stdout, "{line}").ok();
        }
        stdout.flush().ok();
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count() {
        assert_eq!(row_count(""), 1);
        assert_eq!(row_count("installed: Family Regular"), 1);
        assert_eq!(row_count("aborted: Family.designspace\nunresolvable glyphs:\na\nb"), 4);
    }

    #[test]
    fn test_colorize_prefix_keeps_module_name() {
        assert!(colorize_prefix("install").contains("[install]"));
        assert!(colorize_prefix("Compat").contains("[Compat]"));
    }

    #[test]
    fn test_progress_render_clamps_to_total() {
        let line = ProgressLine {
            label: "install",
            total: 2,
            done: AtomicUsize::new(5),
            redraw: Mutex::new(()),
        };
        assert!(line.render().ends_with(" 2/2"));
        std::mem::forget(line);
    }
}
