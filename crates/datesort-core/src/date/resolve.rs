use std::path::Path;

use chrono::{Datelike, NaiveDateTime};
use tracing::debug;

use crate::date::parse::parse_date;
use crate::decode::MetadataReader;
use crate::metadata::{
    Directory, MetadataRecordSet, TagKey, CREATION_TIME, EXIF_DATE_TIME_ORIGINAL,
};

/// XMP prefixes understood by the XMP probe.
const XMP_NAMESPACES: &[(&str, &str)] = &[
    ("xmp", "http://ns.adobe.com/xap/1.0/"),
    ("photoshop", "http://ns.adobe.com/photoshop/1.0/"),
    ("exif", "http://ns.adobe.com/exif/1.0/"),
    ("exifEX", "http://cipa.jp/exif/1.0/"),
    ("tiff", "http://ns.adobe.com/tiff/1.0/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("xmpMM", "http://ns.adobe.com/xap/1.0/mm/"),
];

/// XMP date properties, best first.
const XMP_DATE_PROPERTIES: &[&str] = &[
    "xmp:CreateDate",
    "xmp:DateCreated",
    "photoshop:DateCreated",
    "exif:DateTimeOriginal",
    "xmp:MetadataDate",
];

/// Container timestamps at or before this year are unset or use another epoch.
const CONTAINER_MIN_YEAR: i32 = 1970;

/// Which metadata source produced a date. Lower rank wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateSource {
    Exif,
    Xmp,
    MovieHeader,
    TrackHeader,
}

/// A resolved capture date and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub date: NaiveDateTime,
    pub source: DateSource,
}

/// One metadata location that may carry a capture date.
pub trait DateProbe: Send + Sync {
    fn source(&self) -> DateSource;

    fn try_resolve(&self, records: &MetadataRecordSet) -> Option<NaiveDateTime>;
}

/// `DateTimeOriginal` on the first EXIF record.
pub struct ExifOriginalProbe;

impl DateProbe for ExifOriginalProbe {
    fn source(&self) -> DateSource {
        DateSource::Exif
    }

    fn try_resolve(&self, records: &MetadataRecordSet) -> Option<NaiveDateTime> {
        records
            .first(Directory::Exif)?
            .get(&EXIF_DATE_TIME_ORIGINAL)?
            .as_timestamp()
    }
}

/// Ordered scan of XMP date properties.
pub struct XmpProbe {
    properties: &'static [&'static str],
}

impl Default for XmpProbe {
    fn default() -> Self {
        Self {
            properties: XMP_DATE_PROPERTIES,
        }
    }
}

impl XmpProbe {
    /// Map `prefix:Name` to a key on the namespace URI.
    fn key_for(qualified: &str) -> Option<TagKey> {
        let (prefix, name) = qualified.split_once(':')?;
        let (_, uri) = XMP_NAMESPACES.iter().find(|(p, _)| *p == prefix)?;
        Some(TagKey::property(uri, name))
    }
}

impl DateProbe for XmpProbe {
    fn source(&self) -> DateSource {
        DateSource::Xmp
    }

    fn try_resolve(&self, records: &MetadataRecordSet) -> Option<NaiveDateTime> {
        let xmp = records.first(Directory::Xmp)?;

        self.properties.iter().find_map(|qualified| {
            let key = Self::key_for(qualified)?;
            let text = xmp.get(&key)?.as_text()?.trim();
            if text.is_empty() {
                return None;
            }
            match parse_date(text) {
                Ok(date) => Some(date),
                Err(e) => {
                    debug!("skipping {}: {}", qualified, e);
                    None
                }
            }
        })
    }
}

/// Creation time of a QuickTime header, rejecting epoch sentinels.
pub struct ContainerProbe {
    directory: Directory,
}

impl ContainerProbe {
    pub fn movie_header() -> Self {
        Self {
            directory: Directory::MovieHeader,
        }
    }

    pub fn track_header() -> Self {
        Self {
            directory: Directory::TrackHeader,
        }
    }
}

impl DateProbe for ContainerProbe {
    fn source(&self) -> DateSource {
        match self.directory {
            Directory::TrackHeader => DateSource::TrackHeader,
            _ => DateSource::MovieHeader,
        }
    }

    fn try_resolve(&self, records: &MetadataRecordSet) -> Option<NaiveDateTime> {
        let date = records
            .first(self.directory)?
            .get(&CREATION_TIME)?
            .as_timestamp()?;
        (date.year() > CONTAINER_MIN_YEAR).then_some(date)
    }
}

/// Picks the single best capture date out of a record set.
pub struct MetadataDateResolver {
    probes: Vec<Box<dyn DateProbe>>,
}

impl Default for MetadataDateResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ExifOriginalProbe),
            Box::new(XmpProbe::default()),
            Box::new(ContainerProbe::movie_header()),
            Box::new(ContainerProbe::track_header()),
        ])
    }
}

impl MetadataDateResolver {
    /// Probes are consulted in the given order.
    pub fn new(probes: Vec<Box<dyn DateProbe>>) -> Self {
        Self { probes }
    }

    pub fn resolve(&self, records: &MetadataRecordSet) -> Option<Candidate> {
        self.probes.iter().find_map(|probe| {
            probe.try_resolve(records).map(|date| Candidate {
                date,
                source: probe.source(),
            })
        })
    }

    /// Decode `path` and resolve its date.
    ///
    /// Never fails: a file whose metadata cannot be decoded has no date and
    /// takes the undated path. Only the decode step is absorbed here.
    pub fn resolve_file(&self, reader: &dyn MetadataReader, path: &Path) -> Option<Candidate> {
        let records = match reader.read(path) {
            Ok(records) => records,
            Err(e) => {
                debug!("no metadata for {}: {}", path.display(), e);
                return None;
            }
        };
        self.resolve(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::metadata::{MetadataRecord, MetadataValue};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn dt(y: i32, mo: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn exif(date: NaiveDateTime) -> MetadataRecord {
        let mut entries = BTreeMap::new();
        entries.insert(EXIF_DATE_TIME_ORIGINAL, MetadataValue::Timestamp(date));
        MetadataRecord::new(Directory::Exif, entries)
    }

    fn xmp(props: &[(&str, &str)]) -> MetadataRecord {
        let entries = props
            .iter()
            .map(|(qualified, value)| {
                (
                    XmpProbe::key_for(qualified).unwrap(),
                    MetadataValue::Text(value.to_string()),
                )
            })
            .collect();
        MetadataRecord::new(Directory::Xmp, entries)
    }

    fn header(directory: Directory, date: NaiveDateTime) -> MetadataRecord {
        let mut entries = BTreeMap::new();
        entries.insert(CREATION_TIME, MetadataValue::Timestamp(date));
        MetadataRecord::new(directory, entries)
    }

    #[test]
    fn test_exif_beats_xmp() {
        let set = MetadataRecordSet::new(vec![
            xmp(&[("xmp:CreateDate", "2020-01-01T00:00:00")]),
            exif(dt(2019, 6, 1)),
        ]);
        let found = MetadataDateResolver::default().resolve(&set).unwrap();
        assert_eq!(found.date, dt(2019, 6, 1));
        assert_eq!(found.source, DateSource::Exif);
    }

    #[test]
    fn test_exif_text_value_is_parsed() {
        let mut entries = BTreeMap::new();
        entries.insert(
            EXIF_DATE_TIME_ORIGINAL,
            MetadataValue::Text("2021:03:04 05:06:07".into()),
        );
        let set = MetadataRecordSet::new(vec![MetadataRecord::new(Directory::Exif, entries)]);
        let found = MetadataDateResolver::default().resolve(&set).unwrap();
        assert_eq!(
            found.date,
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap().and_hms_opt(5, 6, 7).unwrap()
        );
    }

    #[test]
    fn test_blank_exif_falls_through_to_xmp() {
        let mut entries = BTreeMap::new();
        entries.insert(
            EXIF_DATE_TIME_ORIGINAL,
            MetadataValue::Text("0000:00:00 00:00:00".into()),
        );
        let set = MetadataRecordSet::new(vec![
            MetadataRecord::new(Directory::Exif, entries),
            xmp(&[("xmp:CreateDate", "2020-01-01")]),
        ]);
        let found = MetadataDateResolver::default().resolve(&set).unwrap();
        assert_eq!(found.source, DateSource::Xmp);
    }

    #[test]
    fn test_xmp_skips_malformed_property() {
        let set = MetadataRecordSet::new(vec![xmp(&[
            ("photoshop:DateCreated", "yesterday-ish"),
            ("xmp:CreateDate", "2022-08-09T10:11:12"),
        ])]);
        let found = MetadataDateResolver::default().resolve(&set).unwrap();
        assert_eq!(
            found.date,
            NaiveDate::from_ymd_opt(2022, 8, 9).unwrap().and_hms_opt(10, 11, 12).unwrap()
        );

        let set = MetadataRecordSet::new(vec![xmp(&[
            ("xmp:CreateDate", "   "),
            ("xmp:DateCreated", "garbage"),
            ("photoshop:DateCreated", "2018-02-03"),
            ("xmp:MetadataDate", "2024-01-01"),
        ])]);
        let found = MetadataDateResolver::default().resolve(&set).unwrap();
        assert_eq!(found.date.date(), NaiveDate::from_ymd_opt(2018, 2, 3).unwrap());
    }

    #[test]
    fn test_xmp_unknown_namespace_is_ignored() {
        let mut entries = BTreeMap::new();
        entries.insert(
            TagKey::property("http://example.com/other/", "CreateDate"),
            MetadataValue::Text("2020-01-01".into()),
        );
        let set = MetadataRecordSet::new(vec![MetadataRecord::new(Directory::Xmp, entries)]);
        assert!(MetadataDateResolver::default().resolve(&set).is_none());
    }

    #[test]
    fn test_movie_header_epoch_sentinel_falls_to_track_header() {
        let set = MetadataRecordSet::new(vec![
            header(Directory::MovieHeader, dt(1904, 1, 1)),
            header(Directory::TrackHeader, dt(2017, 7, 7)),
        ]);
        let found = MetadataDateResolver::default().resolve(&set).unwrap();
        assert_eq!(found.source, DateSource::TrackHeader);
        assert_eq!(found.date, dt(2017, 7, 7));

        let only_sentinel =
            MetadataRecordSet::new(vec![header(Directory::MovieHeader, dt(1904, 1, 1))]);
        assert!(MetadataDateResolver::default().resolve(&only_sentinel).is_none());
    }

    #[test]
    fn test_container_year_1970_rejected() {
        let set = MetadataRecordSet::new(vec![header(Directory::MovieHeader, dt(1970, 12, 31))]);
        assert!(MetadataDateResolver::default().resolve(&set).is_none());

        let set = MetadataRecordSet::new(vec![header(Directory::MovieHeader, dt(1971, 1, 1))]);
        assert_eq!(
            MetadataDateResolver::default().resolve(&set).unwrap().source,
            DateSource::MovieHeader
        );
    }

    #[test]
    fn test_empty_set_has_no_date() {
        assert!(MetadataDateResolver::default()
            .resolve(&MetadataRecordSet::default())
            .is_none());
    }

    struct BrokenReader;

    impl MetadataReader for BrokenReader {
        fn read(&self, _path: &Path) -> Result<MetadataRecordSet, DecodeError> {
            Err(DecodeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "truncated",
            )))
        }
    }

    #[test]
    fn test_decode_failure_resolves_to_none() {
        let resolver = MetadataDateResolver::default();
        assert!(resolver
            .resolve_file(&BrokenReader, Path::new("broken.jpg"))
            .is_none());
    }
}
