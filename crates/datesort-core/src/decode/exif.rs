use std::collections::BTreeMap;
use std::io::{BufRead, Seek};

use chrono::{NaiveDate, NaiveDateTime};
use exif::{Context, Exif, Field, Reader, Tag, Value};

use crate::error::DecodeError;
use crate::metadata::{Directory, MetadataRecord, MetadataValue, TagKey};

/// Read the EXIF sub-IFD of each image in the container, primary first.
/// A container without EXIF yields no records.
pub fn read_exif<R: BufRead + Seek>(reader: &mut R) -> Result<Vec<MetadataRecord>, DecodeError> {
    let exif = match Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(records_from(&exif))
}

fn records_from(exif: &Exif) -> Vec<MetadataRecord> {
    let mut by_ifd: BTreeMap<u16, BTreeMap<TagKey, MetadataValue>> = BTreeMap::new();

    for field in exif.fields() {
        if field.tag.context() != Context::Exif {
            continue;
        }
        by_ifd
            .entry(field.ifd_num.index())
            .or_default()
            .insert(TagKey::Tag(field.tag.number()), value_of(field));
    }

    by_ifd
        .into_values()
        .map(|entries| MetadataRecord::new(Directory::Exif, entries))
        .collect()
}

fn value_of(field: &Field) -> MetadataValue {
    if let Value::Ascii(ref parts) = field.value {
        let raw = parts.first().map(|b| b.as_slice()).unwrap_or_default();
        if field.tag == Tag::DateTimeOriginal {
            if let Some(dt) = exif::DateTime::from_ascii(raw).ok().and_then(to_naive) {
                return MetadataValue::Timestamp(dt);
            }
        }
        return MetadataValue::Text(String::from_utf8_lossy(raw).into_owned());
    }
    MetadataValue::Text(field.display_value().to_string())
}

fn to_naive(dt: exif::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?.and_hms_nano_opt(
        dt.hour.into(),
        dt.minute.into(),
        dt.second.into(),
        dt.nanosecond.unwrap_or(0),
    )
}
