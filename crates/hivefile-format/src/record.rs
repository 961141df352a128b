//! Object record encoding and parsing.
//!
//! A hivefile image holds two record kinds, each tagged with 4 magic bytes
//! and terminated by a CRC32C of the record body:
//!
//! ```text
//! group:   "GRUP" | nlinks u32 | entries...                       | crc u32
//! entry:   name_len u16 | name (UTF-8) | kind u8 | address u64
//! dataset: "DSET" | dtype u8 | rank u8 | reserved u16 |
//!          dims u64 * rank | data_len u64 | data bytes            | crc u32
//! ```
//!
//! Entry order within a group record is the group's native order; callers
//! enumerating a group see links in exactly this order.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum;
use crate::datatype::ScalarType;
use crate::error::FormatError;

/// Magic tag opening a group record.
pub const GROUP_TAG: [u8; 4] = *b"GRUP";

/// Magic tag opening a dataset record.
pub const DATASET_TAG: [u8; 4] = *b"DSET";

/// Maximum dataset rank a record can hold (`rank` is a `u8`).
pub const MAX_RANK: usize = u8::MAX as usize;

/// Maximum link name length in bytes (`name_len` is a `u16`).
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Kind of object a group entry links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Child group.
    Group,
    /// Child dataset.
    Dataset,
}

impl LinkKind {
    /// On-disk kind code.
    pub fn code(self) -> u8 {
        match self {
            LinkKind::Group => 1,
            LinkKind::Dataset => 2,
        }
    }

    /// Decode an on-disk kind code.
    pub fn from_code(code: u8) -> Result<LinkKind, FormatError> {
        match code {
            1 => Ok(LinkKind::Group),
            2 => Ok(LinkKind::Dataset),
            other => Err(FormatError::UnknownLinkKind(other)),
        }
    }
}

/// A single named link inside a group record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Link name (no slashes; path components only).
    pub name: String,
    /// What the link points at.
    pub kind: LinkKind,
    /// Byte offset of the child record within the image.
    pub address: u64,
}

/// Parsed group record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    /// Child links in native order.
    pub entries: Vec<LinkEntry>,
}

/// Parsed dataset record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    /// Element type.
    pub dtype: ScalarType,
    /// Extents, outermost to innermost. Empty means scalar (one element).
    pub shape: Vec<u64>,
    /// Raw element payload.
    pub data: Vec<u8>,
}

fn read_bytes(data: &[u8], pos: usize, len: usize) -> Result<&[u8], FormatError> {
    let end = pos.checked_add(len).ok_or(FormatError::UnexpectedEof {
        expected: usize::MAX,
        available: data.len(),
    })?;
    data.get(pos..end).ok_or(FormatError::UnexpectedEof {
        expected: end,
        available: data.len(),
    })
}

/// Number of elements implied by a shape (empty shape = scalar = 1).
///
/// Returns `None` on extent-product overflow.
pub fn element_count(shape: &[u64]) -> Option<u64> {
    shape.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
}

impl GroupRecord {
    /// Encode this record, trailing checksum included.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&GROUP_TAG);
        buf.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for entry in &self.entries {
            let name = entry.name.as_bytes();
            debug_assert!(name.len() <= MAX_NAME_LEN, "link name too long");
            buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
            buf.extend_from_slice(name);
            buf.push(entry.kind.code());
            buf.extend_from_slice(&entry.address.to_le_bytes());
        }
        checksum::append_trailing(&mut buf);
        buf
    }

    /// Parse a group record starting at `offset`.
    ///
    /// Returns the record and the offset one past its trailing checksum.
    pub fn parse(data: &[u8], offset: usize) -> Result<(GroupRecord, usize), FormatError> {
        let tag = read_bytes(data, offset, 4)?;
        if tag != GROUP_TAG {
            return Err(FormatError::InvalidRecordTag([tag[0], tag[1], tag[2], tag[3]]));
        }
        let mut pos = offset + 4;

        let nlinks = LittleEndian::read_u32(read_bytes(data, pos, 4)?);
        pos += 4;

        // Cap the pre-allocation; a corrupt nlinks fails on the first short
        // read rather than on a giant reserve.
        let mut entries = Vec::with_capacity((nlinks as usize).min(1024));
        for _ in 0..nlinks {
            let name_len = LittleEndian::read_u16(read_bytes(data, pos, 2)?) as usize;
            pos += 2;
            let name_bytes = read_bytes(data, pos, name_len)?;
            let name = core::str::from_utf8(name_bytes)
                .map_err(|_| FormatError::InvalidLinkName)?
                .into();
            pos += name_len;
            let kind = LinkKind::from_code(read_bytes(data, pos, 1)?[0])?;
            pos += 1;
            let address = LittleEndian::read_u64(read_bytes(data, pos, 8)?);
            pos += 8;
            entries.push(LinkEntry {
                name,
                kind,
                address,
            });
        }

        read_bytes(data, pos, 4)?; // checksum must be present
        checksum::verify_trailing(&data[offset..pos + 4])?;
        Ok((GroupRecord { entries }, pos + 4))
    }
}

impl DatasetRecord {
    /// Number of elements in this dataset.
    pub fn element_count(&self) -> u64 {
        // Shape was validated against the payload at construction/parse time.
        element_count(&self.shape).unwrap_or(0)
    }

    /// Encode this record, trailing checksum included.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&DATASET_TAG);
        buf.push(self.dtype.code());
        debug_assert!(self.shape.len() <= MAX_RANK, "dataset rank too large");
        buf.push(self.shape.len() as u8);
        buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        for dim in &self.shape {
            buf.extend_from_slice(&dim.to_le_bytes());
        }
        buf.extend_from_slice(&(self.data.len() as u64).to_le_bytes());
        buf.extend_from_slice(&self.data);
        checksum::append_trailing(&mut buf);
        buf
    }

    /// Parse a dataset record starting at `offset`.
    ///
    /// Returns the record and the offset one past its trailing checksum.
    /// For fixed-size types the payload length is validated against the
    /// shape; string payloads are validated lazily at decode time.
    pub fn parse(data: &[u8], offset: usize) -> Result<(DatasetRecord, usize), FormatError> {
        let tag = read_bytes(data, offset, 4)?;
        if tag != DATASET_TAG {
            return Err(FormatError::InvalidRecordTag([tag[0], tag[1], tag[2], tag[3]]));
        }
        let mut pos = offset + 4;

        let head = read_bytes(data, pos, 4)?;
        let dtype = ScalarType::from_code(head[0])?;
        let rank = head[1] as usize;
        // head[2..4] reserved
        pos += 4;

        let mut shape = Vec::with_capacity(rank);
        for _ in 0..rank {
            shape.push(LittleEndian::read_u64(read_bytes(data, pos, 8)?));
            pos += 8;
        }

        let data_len = LittleEndian::read_u64(read_bytes(data, pos, 8)?);
        pos += 8;
        let payload = read_bytes(data, pos, data_len as usize)?.to_vec();
        pos += data_len as usize;

        read_bytes(data, pos, 4)?; // checksum must be present
        checksum::verify_trailing(&data[offset..pos + 4])?;

        if let Some(elem_size) = dtype.element_size() {
            let expected = element_count(&shape)
                .and_then(|n| n.checked_mul(elem_size as u64))
                .ok_or(FormatError::PayloadSizeMismatch {
                    expected: u64::MAX,
                    stored: data_len,
                })?;
            if expected != data_len {
                return Err(FormatError::PayloadSizeMismatch {
                    expected,
                    stored: data_len,
                });
            }
        }

        Ok((
            DatasetRecord {
                dtype,
                shape,
                data: payload,
            },
            pos + 4,
        ))
    }
}
