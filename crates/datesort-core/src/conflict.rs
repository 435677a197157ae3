use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};

/// What to do about a destination that may already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// Nothing at the destination; transfer.
    NoConflict,
    /// Same bytes already there; skip.
    Identical,
    /// Something else is there; leave both files alone.
    Different,
}

/// Content fingerprint of a whole file.
pub trait ContentDigest {
    fn digest(&self, path: &Path) -> io::Result<String>;
}

/// Hex SHA-256, streamed so large videos are never held in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl ContentDigest for Sha256Digest {
    fn digest(&self, path: &Path) -> io::Result<String> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut hasher = Sha256::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Size-then-digest comparison of an existing destination and an incoming file.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver<D = Sha256Digest> {
    digest: D,
}

impl<D: ContentDigest> ConflictResolver<D> {
    pub fn new(digest: D) -> Self {
        Self { digest }
    }

    /// Read-only: neither file is modified.
    pub fn resolve(&self, existing: &Path, incoming: &Path) -> io::Result<ConflictOutcome> {
        let existing_meta = match fs::symlink_metadata(existing) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ConflictOutcome::NoConflict),
            Err(e) => return Err(e),
        };
        let incoming_meta = fs::metadata(incoming)?;

        if !existing_meta.is_file() || existing_meta.len() != incoming_meta.len() {
            return Ok(ConflictOutcome::Different);
        }

        if self.digest.digest(existing)? == self.digest.digest(incoming)? {
            Ok(ConflictOutcome::Identical)
        } else {
            Ok(ConflictOutcome::Different)
        }
    }
}
