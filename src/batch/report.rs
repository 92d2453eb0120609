//! Batch outcomes, the conversion log file and the summary printout

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::SubreportDiagnostic;
use crate::error::RdlMigrateError;

/// Kind of a conversion log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Success,
    Failed,
    Conflict,
    Subreport,
    SubreportFail,
}

impl LogKind {
    pub fn label(self) -> &'static str {
        match self {
            LogKind::Success => "SUCCESS",
            LogKind::Failed => "FAILED",
            LogKind::Conflict => "CONFLICT",
            LogKind::Subreport => "SUBREPORT",
            LogKind::SubreportFail => "SUBREPORT FAIL",
        }
    }
}

/// One line of the conversion log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub kind: LogKind,
    /// Report the line is about
    pub subject: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(kind: LogKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Entry for a subreport the converter found but skipped.
    pub fn from_diagnostic(diagnostic: &SubreportDiagnostic) -> Self {
        match diagnostic {
            SubreportDiagnostic::ResolutionFailure { path } => {
                Self::new(LogKind::SubreportFail, path.as_str(), diagnostic.to_string())
            }
            SubreportDiagnostic::NameConflict { name, .. } => {
                Self::new(LogKind::Conflict, name.as_str(), diagnostic.to_string())
            }
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}  {}", self.kind.label(), self.subject, self.message)
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Converted report files, in the order they were written
    pub converted: Vec<PathBuf>,
    pub entries: Vec<LogEntry>,
    /// Where the conversion log was written
    pub log_path: PathBuf,
}

impl BatchSummary {
    pub fn count(&self, kind: LogKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// True when no report failed outright.
    pub fn is_success(&self) -> bool {
        self.count(LogKind::Failed) == 0
    }
}

/// Write one line per entry to `path`, replacing any previous log.
pub fn write_conversion_log(path: &Path, entries: &[LogEntry]) -> Result<(), RdlMigrateError> {
    let mut content = String::new();
    for entry in entries {
        content.push_str(&entry.to_string());
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| RdlMigrateError::OutputWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Print the batch summary to stdout.
pub fn print_summary(summary: &BatchSummary) {
    println!("=== Report Conversion Summary ===");
    println!();

    for kind in [
        LogKind::Failed,
        LogKind::Conflict,
        LogKind::SubreportFail,
    ] {
        let entries: Vec<&LogEntry> = summary.entries.iter().filter(|e| e.kind == kind).collect();
        if entries.is_empty() {
            continue;
        }
        println!("--- {} ({}) ---", kind.label(), entries.len());
        for entry in entries {
            println!("  {}: {}", entry.subject, entry.message);
        }
        println!();
    }

    println!(
        "Summary: {} converted, {} subreports found, {} failed, {} conflicts",
        summary.count(LogKind::Success),
        summary.count(LogKind::Subreport),
        summary.count(LogKind::Failed),
        summary.count(LogKind::Conflict)
    );
    println!("Log written to {}", summary.log_path.display());
}
