//! Hivefile file header encoding and parsing.
//!
//! The header is a fixed 32-byte structure at offset 0:
//!
//! ```text
//! magic[8] | version u8 | flags u8 | reserved u16 |
//! root_address u64 | eof_address u64 | checksum u32
//! ```
//!
//! `checksum` is the CRC32C of the preceding 28 bytes.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum;
use crate::error::FormatError;
use crate::signature::{check_signature, HIVEFILE_SIGNATURE};

/// Total header size in bytes, checksum included.
pub const HEADER_SIZE: usize = 32;

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Flag bit: the file was last written through a collective session.
pub const FLAG_COLLECTIVE: u8 = 0x01;

/// Parsed hivefile header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Format version (currently always 1).
    pub version: u8,
    /// Flag bits; see [`FLAG_COLLECTIVE`].
    pub flags: u8,
    /// Byte offset of the root group record.
    pub root_address: u64,
    /// End-of-file address (total image length in bytes).
    pub eof_address: u64,
}

impl FileHeader {
    /// Parse a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<FileHeader, FormatError> {
        check_signature(data)?;
        if data.len() < HEADER_SIZE {
            return Err(FormatError::UnexpectedEof {
                expected: HEADER_SIZE,
                available: data.len(),
            });
        }
        checksum::verify_trailing(&data[..HEADER_SIZE])?;

        let version = data[8];
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let flags = data[9];
        // data[10..12] reserved
        let root_address = LittleEndian::read_u64(&data[12..20]);
        let eof_address = LittleEndian::read_u64(&data[20..28]);

        Ok(FileHeader {
            version,
            flags,
            root_address,
            eof_address,
        })
    }

    /// Encode the header to its fixed 32-byte form.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        buf.extend_from_slice(&HIVEFILE_SIGNATURE);
        buf.push(self.version);
        buf.push(self.flags);
        buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        buf.extend_from_slice(&self.root_address.to_le_bytes());
        buf.extend_from_slice(&self.eof_address.to_le_bytes());
        checksum::append_trailing(&mut buf);
        debug_assert_eq!(buf.len(), HEADER_SIZE);
        buf
    }

    /// Returns `true` if the file was last written collectively.
    pub fn is_collective(&self) -> bool {
        self.flags & FLAG_COLLECTIVE != 0
    }
}
