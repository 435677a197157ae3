use std::path::{Path, PathBuf};

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif", "avif",
];

const RAW_EXTENSIONS: &[&str] = &[
    "dng", "cr2", "cr3", "crw", "nef", "nrw", "arw", "srf", "sr2", "orf", "rw2", "raf", "pef",
    "srw", "x3f",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "qt", "3gp", "3g2", "avi", "mts", "m2ts", "mkv", "wmv",
];

/// Containers the EXIF reader understands (JPEG, TIFF and TIFF-based RAW, PNG, WebP, HEIF).
const EXIF_CONTAINERS: &[&str] = &[
    "jpg", "jpeg", "jpe", "png", "tif", "tiff", "webp", "heic", "heif", "avif", "dng", "cr2",
    "nef", "nrw", "arw", "srf", "sr2", "pef", "srw",
];

/// ISO base media containers that carry `moov/mvhd`.
const QUICKTIME_CONTAINERS: &[&str] = &["mp4", "m4v", "mov", "qt", "3gp", "3g2"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Raw,
    Video,
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl MediaKind {
    /// Classify by extension, case-insensitively. `None` for unsupported files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = extension(path)?;
        let ext = ext.as_str();
        if PHOTO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Photo)
        } else if RAW_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Raw)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

pub fn has_exif_container(path: &Path) -> bool {
    extension(path).is_some_and(|e| EXIF_CONTAINERS.contains(&e.as_str()))
}

pub fn has_quicktime_container(path: &Path) -> bool {
    extension(path).is_some_and(|e| QUICKTIME_CONTAINERS.contains(&e.as_str()))
}

#[derive(Debug, Clone)]
pub struct Media {
    /// Absolute (or caller-relative) path of the source file
    pub path: PathBuf,
    /// Parent directory relative to the input root; empty at the root
    pub relative_dir: PathBuf,
    /// Just the filename
    pub filename: String,
}

impl Media {
    pub fn new(path: PathBuf, relative_dir: PathBuf, filename: String) -> Self {
        Self {
            path,
            relative_dir,
            filename,
        }
    }
}
