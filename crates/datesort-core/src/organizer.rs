use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use tracing::{debug, error, warn};

use crate::classify::{classify, UNDATED_DIR};
use crate::conflict::{ConflictOutcome, ConflictResolver, ContentDigest, Sha256Digest};
use crate::date::MetadataDateResolver;
use crate::decode::{FileMetadataReader, MetadataReader};
use crate::media::Media;
use crate::report::{Disposition, FileReport, RunSummary};
use crate::scan;
use crate::transfer::{FileTransferPlan, FsTransfer, Transfer};
use crate::{ProcessOptions, ProgressCallback, ThrottledProgress};

/// Sorts one input tree into the output layout, one file at a time.
pub struct Organizer<R = FileMetadataReader, T = FsTransfer, D = Sha256Digest> {
    options: ProcessOptions,
    resolver: MetadataDateResolver,
    reader: R,
    transfer: T,
    conflicts: ConflictResolver<D>,
    /// Dry run only: destination -> source of every transfer planned so far.
    planned: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl Organizer {
    pub fn new(options: ProcessOptions) -> Self {
        Self::with_parts(options, FileMetadataReader::default(), FsTransfer, Sha256Digest)
    }
}

impl<R: MetadataReader, T: Transfer, D: ContentDigest> Organizer<R, T, D> {
    pub fn with_parts(options: ProcessOptions, reader: R, transfer: T, digest: D) -> Self {
        Self {
            options,
            resolver: MetadataDateResolver::default(),
            reader,
            transfer,
            conflicts: ConflictResolver::new(digest),
            planned: Mutex::new(HashMap::new()),
        }
    }

    fn planned(&self) -> MutexGuard<'_, HashMap<PathBuf, PathBuf>> {
        self.planned.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve, classify and place a single file. Never fails; problems are
    /// reported in the returned [`FileReport`].
    pub fn process_file(&self, media: &Media) -> FileReport {
        let date = self.resolver.resolve_file(&self.reader, &media.path);
        match &date {
            Some(found) => debug!("{}: {} from {:?}", media.path.display(), found.date, found.source),
            None => warn!(
                "{}: no capture date in metadata, filing under {}",
                media.path.display(),
                UNDATED_DIR
            ),
        }

        let subdir = classify(date.map(|c| c.date), &media.relative_dir);
        let destination = self.options.output.join(subdir).join(&media.filename);

        // a dry run leaves the destination empty, so compare with whatever
        // an earlier planned transfer would have put there
        let earlier = self.planned().get(&destination).cloned();
        let existing = earlier.as_deref().unwrap_or(destination.as_path());

        let disposition = match self.conflicts.resolve(existing, &media.path) {
            Ok(ConflictOutcome::NoConflict) => {
                let plan = FileTransferPlan {
                    source: media.path.clone(),
                    destination,
                    action: self.options.action,
                    dry_run: self.options.dry_run,
                };
                match self.transfer.execute(&plan) {
                    Ok(()) => {
                        if plan.dry_run {
                            self.planned().insert(plan.destination.clone(), plan.source);
                        }
                        Disposition::Transferred(plan.destination)
                    }
                    Err(e) => {
                        error!("{}: {}", media.path.display(), e);
                        Disposition::Failed(e.to_string())
                    }
                }
            }
            Ok(ConflictOutcome::Identical) => {
                warn!(
                    "{}: identical file already at {}, skipping",
                    media.path.display(),
                    destination.display()
                );
                Disposition::SkippedIdentical(destination)
            }
            Ok(ConflictOutcome::Different) => {
                error!(
                    "{}: a different file already exists at {}, leaving source in place",
                    media.path.display(),
                    destination.display()
                );
                Disposition::Conflict(destination)
            }
            Err(e) => {
                error!(
                    "{}: could not compare with {}: {}",
                    media.path.display(),
                    destination.display(),
                    e
                );
                Disposition::Failed(e.to_string())
            }
        };

        FileReport {
            source: media.path.clone(),
            date,
            disposition,
        }
    }

    /// Walk the input tree and process every supported file.
    ///
    /// Only a missing or unreadable input root is fatal. Everything else is
    /// counted in the returned summary. Sorting in place (output == input)
    /// leaves the existing year and `0000` buckets alone.
    pub fn run(&self, progress_callback: &ProgressCallback<'_>) -> anyhow::Result<RunSummary> {
        let tp = ThrottledProgress::new(progress_callback);
        self.planned().clear();

        let input = self
            .options
            .input
            .canonicalize()
            .with_context(|| format!("input directory {} not found", self.options.input.display()))?;
        let output = self.options.output.canonicalize().ok();

        let scan = scan::scan_dir(&input, output.as_deref())
            .with_context(|| format!("failed to read {}", input.display()))?;

        let mut summary = RunSummary::default();
        for failure in &scan.failures {
            error!("cannot read {}: {}", failure.path.display(), failure.error);
            summary.record_scan_failure();
        }

        let total = scan.media.len() as u64;
        for (i, media) in scan.media.iter().enumerate() {
            let report = self.process_file(media);
            summary.record(&report);
            tp.report("sort", i as u64, total, &display_name(&media.path));
        }

        Ok(summary)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
