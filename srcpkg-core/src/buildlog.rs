use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Severity of a single log line, mirrored both to the per-package log file
/// and to the process-wide tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Append-only sink for one package's operation log. Opened in append mode
/// so repeated operations accumulate rather than truncate, and flushed
/// after every line so an operator tailing the file sees output live.
pub struct BuildLog {
    file: File,
    package: String,
}

impl BuildLog {
    pub fn open(path: &Path, package: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BuildLog {
            file,
            package: package.to_string(),
        })
    }

    pub fn line(&mut self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!(package = %self.package, "{message}"),
            Level::Warn => tracing::warn!(package = %self.package, "{message}"),
            Level::Error => tracing::error!(package = %self.package, "{message}"),
        }
        let prefix = match level {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        };
        let _ = writeln!(self.file, "[{prefix}] {message}");
        let _ = self.file.flush();
    }

    /// Appends a raw line of interleaved subprocess stdout/stderr without
    /// routing it through tracing, since build-script output is opaque
    /// text rather than a structured event.
    pub fn raw_line(&mut self, line: &str) {
        let _ = writeln!(self.file, "{line}");
        let _ = self.file.flush();
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.line(Level::Info, message.as_ref());
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.line(Level::Warn, message.as_ref());
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.line(Level::Error, message.as_ref());
    }
}
