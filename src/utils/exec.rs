//! Running the font compiler and the cache refresh command.
//!
//! ```ignore
//! Cmd::new("fontmake")
//!     .args(["-u", "Regular.ufo", "-o", "otf"])
//!     .env("SOURCE_DATE_EPOCH", "0")
//!     .quiet(&FONTMAKE_NOISE)
//!     .run()?;
//! ```

use anyhow::{Context, Result};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Output},
};

/// Failure messages keep at most this many stderr lines (the tail).
const MAX_ERROR_LINES: usize = 20;

/// Log lines that are never worth surfacing.
pub struct Noise(&'static [&'static str]);

impl Noise {
    fn is_noise(&self, line: &str) -> bool {
        let line = line.trim();
        line.is_empty() || self.0.iter().any(|prefix| line.starts_with(prefix))
    }

    /// Meaningful lines of a captured stream, colors removed.
    fn keep(&self, stream: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(stream)
            .lines()
            .map(strip_ansi)
            .filter(|line| !self.is_noise(line))
            .collect()
    }
}

pub const NO_NOISE: Noise = Noise(&[]);

/// fontmake/fontTools progress chatter.
pub const FONTMAKE_NOISE: Noise = Noise(&["INFO:", "DEBUG:"]);

#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    noise: Option<&'static Noise>,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// From a configured argv such as `["fc-cache", "-f"]`.
    pub fn from_slice<S: AsRef<OsStr>>(argv: &[S]) -> Self {
        match argv.split_first() {
            Some((program, rest)) => Self::new(program).args(rest),
            None => Self::default(),
        }
    }

    /// Append arguments; empty ones are dropped.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|arg| arg.as_ref().to_owned())
                .filter(|arg| !arg.is_empty()),
        );
        self
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn quiet(mut self, noise: &'static Noise) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Run to completion. A non-zero exit is an error carrying the tail of
    /// stderr; otherwise stderr goes to the debug log.
    pub fn run(self) -> Result<Output> {
        let name = self.program.to_string_lossy().into_owned();
        anyhow::ensure!(!name.is_empty(), "empty command");
        let noise = self.noise.unwrap_or(&NO_NOISE);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        let stderr = noise.keep(&output.stderr);
        if !output.status.success() {
            anyhow::bail!(failure_message(&name, &output, &stderr));
        }
        if !stderr.is_empty() {
            crate::debug!(&name; "{}", stderr.join("\n"));
        }
        Ok(output)
    }
}

fn failure_message(name: &str, output: &Output, stderr: &[String]) -> String {
    let mut msg = format!("`{name}` failed with {}", output.status);
    let tail = &stderr[stderr.len().saturating_sub(MAX_ERROR_LINES)..];
    for line in tail {
        msg.push('\n');
        msg.push_str(line);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if tail.is_empty() && !stdout.trim().is_empty() {
        msg.push('\n');
        msg.push_str(stdout.trim());
    }
    msg
}

/// Drop `ESC [ ... m` color sequences.
fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.by_ref().find(|&c| c == 'm');
            continue;
        }
        out.push(ch);
    }
    out
}
