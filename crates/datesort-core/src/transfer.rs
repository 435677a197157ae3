use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferAction {
    #[default]
    Copy,
    Move,
}

/// One file's transfer, consumed immediately by a [`Transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransferPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: TransferAction,
    pub dry_run: bool,
}

/// Performs a planned copy or move, creating destination directories as needed.
pub trait Transfer {
    fn execute(&self, plan: &FileTransferPlan) -> Result<(), TransferError>;
}

/// Transfer on the local filesystem.
///
/// Copies keep the source modification time. Moves fall back to copy and
/// delete when a rename crosses filesystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTransfer;

impl Transfer for FsTransfer {
    fn execute(&self, plan: &FileTransferPlan) -> Result<(), TransferError> {
        let verb = match plan.action {
            TransferAction::Copy => "copy",
            TransferAction::Move => "move",
        };

        if plan.dry_run {
            info!(
                "[dry-run] would {} {} -> {}",
                verb,
                plan.source.display(),
                plan.destination.display()
            );
            return Ok(());
        }

        if let Some(parent) = plan.destination.parent() {
            // create_dir_all succeeds when the directory already exists
            fs::create_dir_all(parent).map_err(|source| TransferError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        match plan.action {
            TransferAction::Copy => copy_preserving_mtime(&plan.source, &plan.destination)?,
            TransferAction::Move => move_file(&plan.source, &plan.destination)?,
        }

        info!("{} {} -> {}", verb, plan.source.display(), plan.destination.display());
        Ok(())
    }
}

fn copy_preserving_mtime(source: &Path, destination: &Path) -> Result<(), TransferError> {
    let copy_err = |source| TransferError::Copy {
        path: destination.to_path_buf(),
        source,
    };

    fs::copy(source, destination).map_err(copy_err)?;
    let meta = fs::metadata(source).map_err(copy_err)?;
    let mtime = filetime::FileTime::from_last_modification_time(&meta);
    if let Err(e) = filetime::set_file_mtime(destination, mtime) {
        debug!("could not keep mtime on {}: {}", destination.display(), e);
    }
    Ok(())
}

fn move_file(source: &Path, destination: &Path) -> Result<(), TransferError> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            copy_preserving_mtime(source, destination)?;
            fs::remove_file(source).map_err(|e| TransferError::Remove {
                path: source.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(TransferError::Rename {
            path: destination.to_path_buf(),
            source: e,
        }),
    }
}

fn is_cross_device(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::CrossesDevices
}
