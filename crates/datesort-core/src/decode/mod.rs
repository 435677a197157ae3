pub mod exif;
pub mod quicktime;
pub mod xmp;

#[cfg(test)]
pub(crate) mod testdata;

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;

use crate::error::DecodeError;
use crate::media;
use crate::metadata::MetadataRecordSet;

/// How far into a file to look for an XMP packet.
const XMP_SCAN_LIMIT: u64 = 16 * 1024 * 1024; // 16 MiB

/// Produces the metadata record set of one file.
pub trait MetadataReader {
    fn read(&self, path: &Path) -> Result<MetadataRecordSet, DecodeError>;
}

/// Decodes EXIF, XMP and QuickTime headers straight from disk.
#[derive(Debug, Clone)]
pub struct FileMetadataReader {
    xmp_scan_limit: u64,
}

impl Default for FileMetadataReader {
    fn default() -> Self {
        Self {
            xmp_scan_limit: XMP_SCAN_LIMIT,
        }
    }
}

impl FileMetadataReader {
    pub fn with_xmp_scan_limit(mut self, limit: u64) -> Self {
        self.xmp_scan_limit = limit;
        self
    }
}

impl MetadataReader for FileMetadataReader {
    /// Records come out as EXIF, XMP, movie header, track headers.
    ///
    /// I/O errors, corrupt EXIF containers and truncated QuickTime headers fail
    /// the whole file. A malformed XMP packet only drops the XMP record.
    fn read(&self, path: &Path) -> Result<MetadataRecordSet, DecodeError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut records = Vec::new();

        if media::has_exif_container(path) {
            records.extend(exif::read_exif(&mut reader)?);
            reader.rewind()?;
        }

        let mut head = Vec::new();
        (&mut reader).take(self.xmp_scan_limit).read_to_end(&mut head)?;
        if let Some(packet) = xmp::find_packet(&head) {
            match xmp::parse_packet(packet) {
                Ok(record) => records.push(record),
                Err(e) => debug!("ignoring XMP in {}: {}", path.display(), e),
            }
        }
        drop(head);

        if media::has_quicktime_container(path) {
            reader.rewind()?;
            records.extend(quicktime::read_headers(&mut reader, len)?);
        }

        Ok(MetadataRecordSet::new(records))
    }
}
