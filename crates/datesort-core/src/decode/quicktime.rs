use std::collections::BTreeMap;
use std::io::{self, Read, Seek, SeekFrom};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::metadata::{
    Directory, MetadataRecord, MetadataValue, CREATION_TIME,
};

/// Atom types that may open an ISO base media file.
const LEADING_ATOMS: &[[u8; 4]] = &[*b"ftyp", *b"moov", *b"mdat", *b"free", *b"skip", *b"wide", *b"pnot"];

#[derive(Debug, Clone, Copy)]
struct Atom {
    kind: [u8; 4],
    data_start: u64,
    data_end: u64,
}

/// Read `mvhd` and every `trak/tkhd` header of a QuickTime/MP4 file.
/// Files that do not look like ISO base media yield no records.
pub fn read_headers<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<Vec<MetadataRecord>> {
    let Some(first) = next_atom(reader, 0, len)? else {
        return Ok(Vec::new());
    };
    if !LEADING_ATOMS.contains(&first.kind) {
        return Ok(Vec::new());
    }

    let Some(moov) = find_atom(reader, 0, len, *b"moov")? else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    if let Some(mvhd) = find_atom(reader, moov.data_start, moov.data_end, *b"mvhd")? {
        records.push(read_header(reader, mvhd, Directory::MovieHeader)?);
    }

    let mut offset = moov.data_start;
    while let Some(atom) = next_atom(reader, offset, moov.data_end)? {
        if atom.kind == *b"trak" {
            if let Some(tkhd) = find_atom(reader, atom.data_start, atom.data_end, *b"tkhd")? {
                records.push(read_header(reader, tkhd, Directory::TrackHeader)?);
            }
        }
        offset = atom.data_end;
    }

    Ok(records)
}

fn find_atom<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    kind: [u8; 4],
) -> io::Result<Option<Atom>> {
    let mut offset = start;
    while let Some(atom) = next_atom(reader, offset, end)? {
        if atom.kind == kind {
            return Ok(Some(atom));
        }
        offset = atom.data_end;
    }
    Ok(None)
}

/// Atom header at `offset`, or `None` at the end of the range or on a
/// nonsensical size.
fn next_atom<R: Read + Seek>(reader: &mut R, offset: u64, end: u64) -> io::Result<Option<Atom>> {
    if offset + 8 > end {
        return Ok(None);
    }
    reader.seek(SeekFrom::Start(offset))?;
    let mut header = [0u8; 8];
    reader.read_exact(&mut header)?;

    let mut size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
    let kind = [header[4], header[5], header[6], header[7]];
    let mut header_size = 8u64;

    if size == 1 {
        size = read_u64(reader)?;
        header_size = 16;
    } else if size == 0 {
        size = end - offset;
    }
    if size < header_size {
        return Ok(None);
    }

    let data_end = offset.saturating_add(size).min(end);
    Ok(Some(Atom {
        kind,
        data_start: offset + header_size,
        data_end,
    }))
}

/// `mvhd` and `tkhd` share their leading layout: version/flags, then
/// the creation time (32-bit, or 64-bit for version 1).
fn read_header<R: Read + Seek>(reader: &mut R, atom: Atom, directory: Directory) -> io::Result<MetadataRecord> {
    reader.seek(SeekFrom::Start(atom.data_start))?;
    let mut version_flags = [0u8; 4];
    reader.read_exact(&mut version_flags)?;

    let created = if version_flags[0] == 1 {
        read_u64(reader)?
    } else {
        read_u32(reader)? as u64
    };

    let mut entries = BTreeMap::new();
    if let Some(dt) = from_mac_epoch(created) {
        entries.insert(CREATION_TIME, MetadataValue::Timestamp(dt));
    }
    Ok(MetadataRecord::new(directory, entries))
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// QuickTime counts seconds from 1904-01-01 00:00:00 UTC. An unset field
/// therefore reads as 1904.
pub fn from_mac_epoch(seconds: u64) -> Option<NaiveDateTime> {
    let base = NaiveDate::from_ymd_opt(1904, 1, 1)?.and_hms_opt(0, 0, 0)?;
    base.checked_add_signed(TimeDelta::try_seconds(i64::try_from(seconds).ok()?)?)
}
