pub mod classify;
pub mod conflict;
pub mod date;
pub mod decode;
pub mod error;
pub mod media;
pub mod metadata;
pub mod organizer;
pub mod report;
pub mod scan;
pub mod transfer;

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub use classify::{classify, UNDATED_DIR};
pub use conflict::{ConflictOutcome, ConflictResolver, ContentDigest, Sha256Digest};
pub use date::{parse_date, Candidate, DateSource, MetadataDateResolver};
pub use decode::{FileMetadataReader, MetadataReader};
pub use error::{DateParseError, DecodeError, TransferError};
pub use metadata::MetadataRecordSet;
pub use organizer::Organizer;
pub use report::{Disposition, FileReport, RunSummary};
pub use transfer::{FileTransferPlan, FsTransfer, Transfer, TransferAction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub action: TransferAction,
    #[serde(default)]
    pub dry_run: bool,
}

/// Type alias for progress callback
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

/// Throttled progress reporter: emits at most every 200ms, plus the final step.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Mutex<Option<Instant>>,
}

impl<'a> ThrottledProgress<'a> {
    const INTERVAL: Duration = Duration::from_millis(200);

    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Mutex::new(None),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let Ok(mut last) = self.last_emit.lock() else {
                return;
            };
            if last.is_some_and(|t| t.elapsed() < Self::INTERVAL) {
                return;
            }
            *last = Some(Instant::now());
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Sort `options.input` into `options.output` with the default collaborators.
pub fn process(options: &ProcessOptions, progress_callback: &ProgressCallback<'_>) -> anyhow::Result<RunSummary> {
    Organizer::new(options.clone()).run(progress_callback)
}
