use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::date::Candidate;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Copied or moved (or planned, in a dry run) to this path.
    Transferred(PathBuf),
    /// An identical file already sits at this path.
    SkippedIdentical(PathBuf),
    /// A different file already sits at this path; source left alone.
    Conflict(PathBuf),
    /// Comparing or transferring failed.
    Failed(String),
}

/// Result of processing one file. Folded into a [`RunSummary`] by the driver.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    pub date: Option<Candidate>,
    pub disposition: Disposition,
}

impl FileReport {
    pub fn warnings(&self) -> u64 {
        let undated = u64::from(self.date.is_none());
        let identical = u64::from(matches!(self.disposition, Disposition::SkippedIdentical(_)));
        undated + identical
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.disposition,
            Disposition::Conflict(_) | Disposition::Failed(_)
        )
    }
}

/// Counters for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Supported files examined.
    pub processed: u64,
    /// Files left in place because an identical copy already exists.
    pub skipped: u64,
    pub warnings: u64,
    pub errors: u64,
}

impl RunSummary {
    pub fn record(&mut self, report: &FileReport) {
        self.processed += 1;
        self.warnings += report.warnings();
        if matches!(report.disposition, Disposition::SkippedIdentical(_)) {
            self.skipped += 1;
        }
        if report.is_error() {
            self.errors += 1;
        }
    }

    /// A directory that could not be listed.
    pub fn record_scan_failure(&mut self) {
        self.errors += 1;
    }

    /// A run fails if and only if at least one error occurred.
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

impl<'a> FromIterator<&'a FileReport> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a FileReport>>(iter: I) -> Self {
        let mut summary = RunSummary::default();
        for report in iter {
            summary.record(report);
        }
        summary
    }
}
