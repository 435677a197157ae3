use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// No date pattern, strict or lenient, matched the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized date: {input:?}")]
pub struct DateParseError {
    pub input: String,
}

/// Failure while decoding a file's metadata containers.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read metadata: {0}")]
    Io(#[from] io::Error),
    #[error("invalid EXIF data: {0}")]
    Exif(#[from] exif::Error),
    #[error("invalid XMP packet: {0}")]
    Xmp(#[from] quick_xml::Error),
}

/// Failure of the copy/move collaborator.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to create {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to copy to {}: {source}", path.display())]
    Copy { path: PathBuf, source: io::Error },
    #[error("failed to move to {}: {source}", path.display())]
    Rename { path: PathBuf, source: io::Error },
    #[error("failed to remove {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },
}
