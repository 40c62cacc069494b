//! Text armoring for envelopes
//!
//! Envelopes travel as plain standard base64 (RFC 4648 alphabet, with `=`
//! padding) and carry no version prefix, so that text produced by older
//! tools using the same format can be decrypted unchanged.

use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};
use base64::{Engine, engine::general_purpose::STANDARD};

/// UTF-8 byte order mark as it appears at the start of a decoded string.
const BOM: char = '\u{feff}';

/// Wrap envelope bytes in armor, returning the base64 string
pub fn wrap(envelope: &[u8]) -> String {
    STANDARD.encode(envelope)
}

/// Unwrap an armored string, returning the envelope bytes
///
/// A leading byte order mark and any ASCII whitespace (including line
/// breaks inside the text) are ignored.
pub fn unwrap(armored: &str) -> Result<Vec<u8>> {
    let armored = armored.strip_prefix(BOM).unwrap_or(armored);
    let compact: String = armored
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    STANDARD.decode(compact.as_bytes()).map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringDecode,
            "base64 decoding failed",
            e,
        )
    })
}
