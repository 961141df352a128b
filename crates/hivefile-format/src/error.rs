//! Error types for hivefile format parsing.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use core::fmt;

/// Errors that can occur when parsing hivefile binary structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The hivefile magic signature was not found at the start of the file.
    SignatureNotFound,
    /// The header version is not supported.
    UnsupportedVersion(u8),
    /// Unexpected end of data.
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },
    /// CRC32C checksum mismatch.
    ChecksumMismatch {
        /// The checksum stored in the file.
        expected: u32,
        /// The checksum we computed.
        computed: u32,
    },
    /// A record tag was neither `GRUP` nor `DSET`.
    InvalidRecordTag([u8; 4]),
    /// Unknown scalar type code in a dataset record.
    UnknownScalarType(u8),
    /// Unknown link kind code in a group entry.
    UnknownLinkKind(u8),
    /// A link name was not valid UTF-8.
    InvalidLinkName,
    /// A string dataset payload was not valid UTF-8.
    InvalidStringPayload,
    /// A record address points outside the file image.
    AddressOutOfBounds(u64),
    /// Dataset payload length does not match dtype and extents.
    PayloadSizeMismatch {
        /// Byte length implied by dtype and shape.
        expected: u64,
        /// Byte length stored in the record.
        stored: u64,
    },
    /// Two links in one group share a name.
    DuplicateLinkName(String),
    /// Group nesting exceeds the parser's depth limit (cycle guard).
    NestingTooDeep(usize),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::SignatureNotFound => {
                write!(f, "hivefile signature not found at start of file")
            }
            FormatError::UnsupportedVersion(v) => {
                write!(f, "unsupported header version: {v}")
            }
            FormatError::UnexpectedEof {
                expected,
                available,
            } => {
                write!(f, "unexpected EOF: need {expected} bytes, have {available}")
            }
            FormatError::ChecksumMismatch { expected, computed } => {
                write!(
                    f,
                    "checksum mismatch: expected {expected:#010x}, computed {computed:#010x}"
                )
            }
            FormatError::InvalidRecordTag(tag) => {
                write!(f, "invalid record tag: {tag:02x?}")
            }
            FormatError::UnknownScalarType(code) => {
                write!(f, "unknown scalar type code: {code}")
            }
            FormatError::UnknownLinkKind(code) => {
                write!(f, "unknown link kind code: {code}")
            }
            FormatError::InvalidLinkName => {
                write!(f, "link name is not valid UTF-8")
            }
            FormatError::InvalidStringPayload => {
                write!(f, "string dataset payload is not valid UTF-8")
            }
            FormatError::AddressOutOfBounds(addr) => {
                write!(f, "record address {addr:#x} is outside the file image")
            }
            FormatError::PayloadSizeMismatch { expected, stored } => {
                write!(
                    f,
                    "dataset payload size mismatch: shape and dtype imply {expected} bytes, record stores {stored}"
                )
            }
            FormatError::DuplicateLinkName(name) => {
                write!(f, "duplicate link name in group: {name:?}")
            }
            FormatError::NestingTooDeep(limit) => {
                write!(f, "group nesting exceeds depth limit of {limit}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}
