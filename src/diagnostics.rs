use log::Level;
use std::fmt;
use std::io::{self, Write};

/// Where the gateway sends its human-readable lines.
pub trait DiagnosticSink: Send + Sync {
    fn line(&self, level: Level, message: fmt::Arguments<'_>);
}

/// Forwards to the `log` facade.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn line(&self, level: Level, message: fmt::Arguments<'_>) {
        log::log!(target: "activity_tap", level, "{}", message);
    }
}

/// Prints every line to standard output, whatever its level.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn line(&self, _level: Level, message: fmt::Arguments<'_>) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        // stdout going away is not our problem
        let _ = writeln!(lock, "{}", message);
    }
}

#[derive(Debug, Default, Copy, Clone)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn line(&self, _level: Level, _message: fmt::Arguments<'_>) {}
}
