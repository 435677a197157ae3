use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};

/// Destination bucket for files without a capture date.
pub const UNDATED_DIR: &str = "0000";

/// Destination subdirectory, relative to the output root, for one file.
///
/// Dated files land in `YYYY/MM-DD`. Undated files keep their input
/// subdirectory under `0000`, so unrelated folders do not collide.
pub fn classify(date: Option<NaiveDateTime>, relative_dir: &Path) -> PathBuf {
    match date {
        Some(dt) => Path::new(&format!("{:04}", dt.year()))
            .join(format!("{:02}-{:02}", dt.month(), dt.day())),
        None if relative_dir.as_os_str().is_empty() => PathBuf::from(UNDATED_DIR),
        None => Path::new(UNDATED_DIR).join(relative_dir),
    }
}
