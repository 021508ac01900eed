//! Build progress reporting. Purely observational.

use crate::logger::ProgressLine;

/// Steps per font: generate, retire old, install new, finalize.
pub const FONT_STEPS: usize = 4;
/// Steps per design space: one extra for the compatibility pass.
pub const DESIGNSPACE_STEPS: usize = 5;

/// Receives a monotonically increasing step counter per batch.
pub trait Progress: Send {
    fn begin(&mut self, total: usize);
    fn step(&mut self);
    fn finish(&mut self);
}

/// Discards progress.
#[derive(Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn begin(&mut self, _total: usize) {}
    fn step(&mut self) {}
    fn finish(&mut self) {}
}

/// Renders `[install] n/total` on the terminal.
#[derive(Default)]
pub struct TerminalProgress {
    line: Option<ProgressLine>,
}

impl Progress for TerminalProgress {
    fn begin(&mut self, total: usize) {
        self.line = Some(ProgressLine::new("install", total));
    }

    fn step(&mut self) {
        if let Some(line) = &self.line {
            line.inc();
        }
    }

    fn finish(&mut self) {
        if let Some(line) = self.line.take() {
            line.finish();
        }
    }
}
