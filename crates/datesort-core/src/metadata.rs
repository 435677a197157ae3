use std::collections::BTreeMap;

use chrono::NaiveDateTime;

/// Source grouping of a metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directory {
    /// One EXIF IFD (primary image first).
    Exif,
    /// A parsed XMP packet.
    Xmp,
    /// QuickTime/MP4 `moov/mvhd`.
    MovieHeader,
    /// QuickTime/MP4 `moov/trak/tkhd`, one record per track.
    TrackHeader,
}

/// Key of a single metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKey {
    /// Numeric tag id (EXIF).
    Tag(u16),
    /// Namespaced property (XMP), keyed by namespace URI, not prefix.
    Property { namespace: String, name: String },
    /// Fixed container field.
    Field(&'static str),
}

impl TagKey {
    pub fn property(namespace: &str, name: &str) -> Self {
        TagKey::Property {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// EXIF `DateTimeOriginal`.
pub const EXIF_DATE_TIME_ORIGINAL: TagKey = TagKey::Tag(0x9003);
/// Creation time of a movie or track header.
pub const CREATION_TIME: TagKey = TagKey::Field("creation_time");

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Text(String),
    Timestamp(NaiveDateTime),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            MetadataValue::Timestamp(_) => None,
        }
    }

    /// Native timestamp, or a text value in one of the EXIF date-time layouts.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            MetadataValue::Timestamp(dt) => Some(*dt),
            MetadataValue::Text(s) => parse_exif_datetime(s),
        }
    }
}

/// EXIF datetimes have no timezone info; they are local time as-is.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim()
        .trim_end_matches('\0')
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    if let Ok(d) = chrono::NaiveDate::parse_from_str(cleaned.split(' ').next()?, "%Y:%m:%d") {
        return d.and_hms_opt(0, 0, 0);
    }

    None
}

/// Entries of one directory.
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    directory: Directory,
    entries: BTreeMap<TagKey, MetadataValue>,
}

impl MetadataRecord {
    pub fn new(directory: Directory, entries: BTreeMap<TagKey, MetadataValue>) -> Self {
        Self { directory, entries }
    }

    pub fn directory(&self) -> Directory {
        self.directory
    }

    pub fn get(&self, key: &TagKey) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything decoded from one file, in decode order.
///
/// Read-only once built: resolvers only ever see `&MetadataRecordSet`.
#[derive(Debug, Clone, Default)]
pub struct MetadataRecordSet {
    records: Vec<MetadataRecord>,
}

impl MetadataRecordSet {
    pub fn new(records: Vec<MetadataRecord>) -> Self {
        Self { records }
    }

    /// First record of the given directory.
    pub fn first(&self, directory: Directory) -> Option<&MetadataRecord> {
        self.records.iter().find(|r| r.directory == directory)
    }

    pub fn of(&self, directory: Directory) -> impl Iterator<Item = &MetadataRecord> {
        self.records.iter().filter(move |r| r.directory == directory)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl FromIterator<MetadataRecord> for MetadataRecordSet {
    fn from_iter<I: IntoIterator<Item = MetadataRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
