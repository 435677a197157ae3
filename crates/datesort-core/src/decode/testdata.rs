//! Minimal container builders for tests.

use chrono::{NaiveDate, NaiveDateTime};

/// A JPEG whose only segment is an EXIF APP1 carrying `DateTimeOriginal`.
pub fn jpeg_with_date_time_original(datetime: &str) -> Vec<u8> {
    let mut value = datetime.as_bytes().to_vec();
    value.push(0);

    // Big-endian TIFF: header, IFD0 at 8 with an ExifIFDPointer, Exif IFD at 26.
    let exif_ifd: u32 = 8 + 2 + 12 + 4;
    let value_offset: u32 = exif_ifd + 2 + 12 + 4;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2a");
    tiff.extend_from_slice(&8u32.to_be_bytes());

    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x8769u16.to_be_bytes());
    tiff.extend_from_slice(&4u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&exif_ifd.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());

    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x9003u16.to_be_bytes());
    tiff.extend_from_slice(&2u16.to_be_bytes());
    tiff.extend_from_slice(&(value.len() as u32).to_be_bytes());
    tiff.extend_from_slice(&value_offset.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());

    tiff.extend_from_slice(&value);

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&payload);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

pub fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

/// Version 0 `mvhd`/`tkhd` body, truncated after the duration.
fn header_body(created: u32) -> Vec<u8> {
    let mut body = vec![0, 0, 0, 0];
    body.extend_from_slice(&created.to_be_bytes());
    body.extend_from_slice(&created.to_be_bytes());
    body.extend_from_slice(&1000u32.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body
}

/// `ftyp` + `moov { mvhd, trak { tkhd }... }`.
pub fn quicktime(movie_created: u32, tracks_created: &[u32]) -> Vec<u8> {
    let mut moov = atom(b"mvhd", &header_body(movie_created));
    for created in tracks_created {
        moov.extend(atom(b"trak", &atom(b"tkhd", &header_body(*created))));
    }

    let mut out = atom(b"ftyp", b"isom\0\0\0\0");
    out.extend(atom(b"moov", &moov));
    out
}

pub fn mac_seconds(date: NaiveDateTime) -> u32 {
    let base = NaiveDate::from_ymd_opt(1904, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (date - base).num_seconds() as u32
}
