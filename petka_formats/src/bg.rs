use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

/// Size in bytes of a single attachment record (`u16` id + five `i32` fields).
const ATTACHMENT_RECORD_SIZE: usize = 2 + 5 * 4;

/// An object that lives in a room, with the fixed placement the room gives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedObject {
    pub id: u16,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub walk_x: i32,
    pub walk_y: i32,
}

/// Attachment entry for one background (room) object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgInfo {
    pub obj_id: u16,
    pub attached: Vec<AttachedObject>,
}

impl BgInfo {
    pub fn attached_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.attached.iter().map(|object| object.id)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.attached.iter().any(|object| object.id == id)
    }
}

/// Parsed `backgrnd.bg` table: every room and the objects attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackgroundTable {
    entries: Vec<BgInfo>,
}

impl BackgroundTable {
    pub fn new(entries: Vec<BgInfo>) -> Self {
        Self { entries }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("reading background table {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("parsing background table {}", path.display()))
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        let count = reader
            .read_u32::<LittleEndian>()
            .context("background table missing entry count")?;

        // Every entry needs at least its id and attachment count.
        ensure!(
            (count as usize).saturating_mul(6) <= bytes.len().saturating_sub(4),
            "background table declares {count} entries but holds only {} bytes",
            bytes.len()
        );

        let mut entries = Vec::with_capacity(count as usize);
        for index in 0..count {
            let obj_id = reader
                .read_u16::<LittleEndian>()
                .with_context(|| format!("entry {index} missing object id"))?;
            let attached_count = reader
                .read_u32::<LittleEndian>()
                .with_context(|| format!("entry {index} missing attachment count"))?;

            let remaining = bytes.len() - reader.position() as usize;
            if (attached_count as usize).saturating_mul(ATTACHMENT_RECORD_SIZE) > remaining {
                bail!(
                    "entry {index} (object {obj_id}) declares {attached_count} attachments but only {remaining} bytes remain"
                );
            }

            let mut attached = Vec::with_capacity(attached_count as usize);
            for _ in 0..attached_count {
                attached.push(read_attachment(&mut reader)?);
            }
            entries.push(BgInfo { obj_id, attached });
        }

        let trailing = bytes.len() - reader.position() as usize;
        if trailing != 0 {
            eprintln!("[petka_formats] warning: {trailing} trailing bytes after background table");
        }

        Ok(Self { entries })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let count = u32::try_from(self.entries.len()).context("too many background entries")?;
        out.write_u32::<LittleEndian>(count)?;
        for entry in &self.entries {
            out.write_u16::<LittleEndian>(entry.obj_id)?;
            let attached =
                u32::try_from(entry.attached.len()).context("too many attached objects")?;
            out.write_u32::<LittleEndian>(attached)?;
            for object in &entry.attached {
                write_attachment(&mut out, object)?;
            }
        }
        Ok(out)
    }

    pub fn entries(&self) -> &[BgInfo] {
        &self.entries
    }

    pub fn find(&self, obj_id: u16) -> Option<&BgInfo> {
        self.entries.iter().find(|entry| entry.obj_id == obj_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn read_attachment<R: Read>(reader: &mut R) -> Result<AttachedObject> {
    Ok(AttachedObject {
        id: reader.read_u16::<LittleEndian>()?,
        x: reader.read_i32::<LittleEndian>()?,
        y: reader.read_i32::<LittleEndian>()?,
        z: reader.read_i32::<LittleEndian>()?,
        walk_x: reader.read_i32::<LittleEndian>()?,
        walk_y: reader.read_i32::<LittleEndian>()?,
    })
}

fn write_attachment<W: Write>(writer: &mut W, object: &AttachedObject) -> Result<()> {
    writer.write_u16::<LittleEndian>(object.id)?;
    writer.write_i32::<LittleEndian>(object.x)?;
    writer.write_i32::<LittleEndian>(object.y)?;
    writer.write_i32::<LittleEndian>(object.z)?;
    writer.write_i32::<LittleEndian>(object.walk_x)?;
    writer.write_i32::<LittleEndian>(object.walk_y)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        // room 100 with one attachment
        bytes.extend_from_slice(&100u16.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&200u16.to_le_bytes());
        for value in [10i32, 20, 30, -1, -1] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        // room 101 with nothing attached
        bytes.extend_from_slice(&101u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_rooms_and_attachments() {
        let table = BackgroundTable::parse(&sample_bytes()).expect("table parses");
        assert_eq!(table.len(), 2);

        let room = table.find(100).expect("room 100 present");
        assert_eq!(
            room.attached,
            vec![AttachedObject {
                id: 200,
                x: 10,
                y: 20,
                z: 30,
                walk_x: -1,
                walk_y: -1,
            }]
        );
        assert!(room.contains(200));
        assert!(table.find(101).expect("room 101 present").attached.is_empty());
        assert!(table.find(102).is_none());
    }

    #[test]
    fn encoder_matches_the_on_disk_layout() {
        let table = BackgroundTable::parse(&sample_bytes()).expect("table parses");
        assert_eq!(table.to_bytes().expect("table encodes"), sample_bytes());
    }

    #[test]
    fn rejects_truncated_attachment_block() {
        let mut bytes = sample_bytes();
        bytes.truncate(20);
        let err = BackgroundTable::parse(&bytes).unwrap_err();
        assert!(
            format!("{err:#}").contains("attachments"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn rejects_inflated_entry_count() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1000u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 6]);
        assert!(BackgroundTable::parse(&bytes).is_err());
    }

    #[test]
    fn open_reads_table_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("backgrnd.bg");
        fs::write(&path, sample_bytes()).expect("write table");
        let table = BackgroundTable::open(&path).expect("table opens");
        assert_eq!(table.entries()[0].obj_id, 100);
    }
}
