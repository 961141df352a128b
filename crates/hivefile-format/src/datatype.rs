//! Scalar element types and their on-disk codecs.
//!
//! Fixed-size elements are packed little-endian. Strings are variable-size:
//! each element is a `u32` byte length followed by UTF-8 bytes.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use core::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Element type of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// 64-bit IEEE float.
    F64,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit signed integer.
    I64,
    /// 32-bit signed integer.
    I32,
    /// Unsigned byte.
    U8,
    /// UTF-8 string (variable length per element).
    Str,
}

impl ScalarType {
    /// On-disk type code.
    pub fn code(self) -> u8 {
        match self {
            ScalarType::F64 => 1,
            ScalarType::F32 => 2,
            ScalarType::I64 => 3,
            ScalarType::I32 => 4,
            ScalarType::U8 => 5,
            ScalarType::Str => 6,
        }
    }

    /// Decode an on-disk type code.
    pub fn from_code(code: u8) -> Result<ScalarType, FormatError> {
        Ok(match code {
            1 => ScalarType::F64,
            2 => ScalarType::F32,
            3 => ScalarType::I64,
            4 => ScalarType::I32,
            5 => ScalarType::U8,
            6 => ScalarType::Str,
            other => return Err(FormatError::UnknownScalarType(other)),
        })
    }

    /// Bytes per element for fixed-size types, `None` for strings.
    pub fn element_size(self) -> Option<usize> {
        match self {
            ScalarType::F64 | ScalarType::I64 => Some(8),
            ScalarType::F32 | ScalarType::I32 => Some(4),
            ScalarType::U8 => Some(1),
            ScalarType::Str => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::F64 => "f64",
            ScalarType::F32 => "f32",
            ScalarType::I64 => "i64",
            ScalarType::I32 => "i32",
            ScalarType::U8 => "u8",
            ScalarType::Str => "str",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Fixed-size codecs
// ---------------------------------------------------------------------------

fn check_payload(data: &[u8], count: u64, elem_size: usize) -> Result<(), FormatError> {
    let expected = count
        .checked_mul(elem_size as u64)
        .ok_or(FormatError::PayloadSizeMismatch {
            expected: u64::MAX,
            stored: data.len() as u64,
        })?;
    if data.len() as u64 != expected {
        return Err(FormatError::PayloadSizeMismatch {
            expected,
            stored: data.len() as u64,
        });
    }
    Ok(())
}

/// Encode `f64` values little-endian.
pub fn encode_f64(values: &[f64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 8);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Decode exactly `count` `f64` values.
pub fn decode_f64(data: &[u8], count: u64) -> Result<Vec<f64>, FormatError> {
    check_payload(data, count, 8)?;
    Ok(data.chunks_exact(8).map(LittleEndian::read_f64).collect())
}

/// Encode `f32` values little-endian.
pub fn encode_f32(values: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Decode exactly `count` `f32` values.
pub fn decode_f32(data: &[u8], count: u64) -> Result<Vec<f32>, FormatError> {
    check_payload(data, count, 4)?;
    Ok(data.chunks_exact(4).map(LittleEndian::read_f32).collect())
}

/// Encode `i64` values little-endian.
pub fn encode_i64(values: &[i64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 8);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Decode exactly `count` `i64` values.
pub fn decode_i64(data: &[u8], count: u64) -> Result<Vec<i64>, FormatError> {
    check_payload(data, count, 8)?;
    Ok(data.chunks_exact(8).map(LittleEndian::read_i64).collect())
}

/// Encode `i32` values little-endian.
pub fn encode_i32(values: &[i32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Decode exactly `count` `i32` values.
pub fn decode_i32(data: &[u8], count: u64) -> Result<Vec<i32>, FormatError> {
    check_payload(data, count, 4)?;
    Ok(data.chunks_exact(4).map(LittleEndian::read_i32).collect())
}

/// Encode `u8` values (identity copy).
pub fn encode_u8(values: &[u8]) -> Vec<u8> {
    values.to_vec()
}

/// Decode exactly `count` `u8` values.
pub fn decode_u8(data: &[u8], count: u64) -> Result<Vec<u8>, FormatError> {
    check_payload(data, count, 1)?;
    Ok(data.to_vec())
}

// ---------------------------------------------------------------------------
// String codec
// ---------------------------------------------------------------------------

/// Encode strings as `len u32 | bytes` per element.
pub fn encode_str<S: AsRef<str>>(values: &[S]) -> Vec<u8> {
    let mut buf = Vec::new();
    for v in values {
        let s = v.as_ref().as_bytes();
        buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        buf.extend_from_slice(s);
    }
    buf
}

/// Decode exactly `count` length-prefixed strings, consuming all of `data`.
pub fn decode_str(data: &[u8], count: u64) -> Result<Vec<String>, FormatError> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    for _ in 0..count {
        if pos + 4 > data.len() {
            return Err(FormatError::UnexpectedEof {
                expected: pos + 4,
                available: data.len(),
            });
        }
        let len = LittleEndian::read_u32(&data[pos..pos + 4]) as usize;
        pos += 4;
        if pos + len > data.len() {
            return Err(FormatError::UnexpectedEof {
                expected: pos + len,
                available: data.len(),
            });
        }
        let s = core::str::from_utf8(&data[pos..pos + len])
            .map_err(|_| FormatError::InvalidStringPayload)?;
        out.push(String::from(s));
        pos += len;
    }
    if pos != data.len() {
        return Err(FormatError::PayloadSizeMismatch {
            expected: pos as u64,
            stored: data.len() as u64,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for t in [
            ScalarType::F64,
            ScalarType::F32,
            ScalarType::I64,
            ScalarType::I32,
            ScalarType::U8,
            ScalarType::Str,
        ] {
            assert_eq!(ScalarType::from_code(t.code()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_code() {
        assert_eq!(
            ScalarType::from_code(0),
            Err(FormatError::UnknownScalarType(0))
        );
        assert_eq!(
            ScalarType::from_code(99),
            Err(FormatError::UnknownScalarType(99))
        );
    }

    #[test]
    fn f64_roundtrip() {
        let values = [1.5, -2.25, 0.0, f64::MAX];
        let bytes = encode_f64(&values);
        assert_eq!(decode_f64(&bytes, 4).unwrap(), values);
    }

    #[test]
    fn i64_roundtrip() {
        let values = [i64::MIN, -1, 0, 1, i64::MAX];
        let bytes = encode_i64(&values);
        assert_eq!(decode_i64(&bytes, 5).unwrap(), values);
    }

    #[test]
    fn i32_roundtrip() {
        let values = [i32::MIN, 0, i32::MAX];
        let bytes = encode_i32(&values);
        assert_eq!(decode_i32(&bytes, 3).unwrap(), values);
    }

    #[test]
    fn count_overflow() {
        // count * elem_size must not wrap; a hostile count is a size
        // mismatch, not a release-mode wraparound.
        assert!(matches!(
            decode_f64(&[], u64::MAX),
            Err(FormatError::PayloadSizeMismatch { .. })
        ));
    }

    #[test]
    fn count_mismatch() {
        let bytes = encode_f64(&[1.0, 2.0]);
        assert!(matches!(
            decode_f64(&bytes, 3),
            Err(FormatError::PayloadSizeMismatch { .. })
        ));
    }

    #[test]
    fn str_roundtrip() {
        let values = ["alpha", "", "日本語"];
        let bytes = encode_str(&values);
        assert_eq!(decode_str(&bytes, 3).unwrap(), values);
    }

    #[test]
    fn str_truncated_payload() {
        let mut bytes = encode_str(&["hello"]);
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            decode_str(&bytes, 1),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn str_trailing_garbage() {
        let mut bytes = encode_str(&["hello"]);
        bytes.push(0);
        assert!(matches!(
            decode_str(&bytes, 1),
            Err(FormatError::PayloadSizeMismatch { .. })
        ));
    }
}
