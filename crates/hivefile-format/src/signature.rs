//! Hivefile signature (magic bytes) detection.

use crate::error::FormatError;

/// The 8-byte hivefile magic signature.
///
/// Same construction as the classic binary-format magics: a high-bit byte to
/// catch 7-bit transports, the format name, CRLF and LF to catch line-ending
/// translation, and a Ctrl-Z to stop DOS-style `type`.
pub const HIVEFILE_SIGNATURE: [u8; 8] = [0x89, b'H', b'V', b'F', b'\r', b'\n', 0x1A, b'\n'];

/// Verify that `data` starts with the hivefile signature.
///
/// Unlike formats that allow user blocks, a hivefile image always begins at
/// byte 0; there is no offset scan.
pub fn check_signature(data: &[u8]) -> Result<(), FormatError> {
    if data.len() < 8 {
        return Err(FormatError::SignatureNotFound);
    }
    if data[..8] != HIVEFILE_SIGNATURE {
        return Err(FormatError::SignatureNotFound);
    }
    Ok(())
}
