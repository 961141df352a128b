//! Metadata checksums.
//!
//! Every hivefile metadata structure (header, group record, dataset record)
//! ends with a CRC32C of the bytes that precede it within the structure.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Compute the CRC32C checksum of a byte slice.
pub fn compute(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Verify a structure whose last 4 bytes are the little-endian CRC32C of
/// everything before them.
///
/// `buf` must be the complete structure including the trailing checksum.
pub fn verify_trailing(buf: &[u8]) -> Result<(), FormatError> {
    if buf.len() < 4 {
        return Err(FormatError::UnexpectedEof {
            expected: 4,
            available: buf.len(),
        });
    }
    let body = &buf[..buf.len() - 4];
    let stored = LittleEndian::read_u32(&buf[buf.len() - 4..]);
    let computed = compute(body);
    if stored != computed {
        return Err(FormatError::ChecksumMismatch {
            expected: stored,
            computed,
        });
    }
    Ok(())
}

/// Append the CRC32C of `buf` to `buf` itself, little-endian.
pub fn append_trailing(buf: &mut Vec<u8>) {
    let sum = compute(buf);
    buf.extend_from_slice(&sum.to_le_bytes());
}
