use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::classify::UNDATED_DIR;
use crate::media::{Media, MediaKind};

/// A directory that could not be listed.
#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Result of walking the input tree
pub struct ScanResult {
    /// Supported media, in traversal order
    pub media: Vec<Media>,
    /// Subdirectories that could not be read
    pub failures: Vec<ScanFailure>,
}

/// Depth-first walk of `root`: each directory's files first, then its
/// subdirectories, both sorted by name.
///
/// Directory symlinks are not followed. When `output` is nested inside
/// `root` it is never entered. When it is `root` itself, the year and
/// `0000` buckets at the top level are left out instead.
///
/// Only the root itself failing to list is an error; unreadable
/// subdirectories are collected in `failures`.
pub fn scan_dir(root: &Path, output: Option<&Path>) -> io::Result<ScanResult> {
    let mut result = ScanResult {
        media: Vec::new(),
        failures: Vec::new(),
    };

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|entry| {
            let skip = is_output_dir(entry, root, output);
            if skip {
                debug!("not descending into output directory {}", entry.path().display());
            }
            !skip
        });

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                result.failures.push(ScanFailure {
                    path,
                    error: err.into(),
                });
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if let Some(media) = media_of(root, &entry) {
            result.media.push(media);
        }
    }

    Ok(result)
}

fn media_of(root: &Path, entry: &DirEntry) -> Option<Media> {
    let path = entry.path();
    MediaKind::from_path(path)?;
    // follows file symlinks; a symlink to a directory is not a file
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }

    let relative_dir = path
        .parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .unwrap_or(Path::new(""))
        .to_path_buf();
    let filename = entry.file_name().to_string_lossy().into_owned();
    Some(Media::new(path.to_path_buf(), relative_dir, filename))
}

fn is_output_dir(entry: &DirEntry, root: &Path, output: Option<&Path>) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    match output {
        Some(out) if out == root => entry.depth() == 1 && is_bucket_name(entry.file_name()),
        Some(out) => entry.path() == out,
        None => false,
    }
}

/// `0000` or a four-digit year, as produced by the classifier.
fn is_bucket_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n == UNDATED_DIR || (n.len() == 4 && n.bytes().all(|b| b.is_ascii_digit())))
}
