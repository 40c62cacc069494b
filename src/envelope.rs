//! Envelope codec
//!
//! An envelope is `salt || iv || ciphertext`: 32 bytes of salt, 32 bytes of
//! IV, then the PKCS#7-padded ciphertext. Nothing else is stored; the
//! passphrase is the only external input needed to open it.

use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};
use crate::params::{HEADER_LEN, IV_LEN, SALT_LEN};

/// Borrowed view of the three parts of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub salt: &'a [u8; SALT_LEN],
    pub iv: &'a [u8; IV_LEN],
    pub ciphertext: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Splits raw envelope bytes into salt, IV and ciphertext.
    ///
    /// Fails with [`ErrorKind::InvalidEnvelope`] if the input cannot even
    /// hold the salt and IV. The ciphertext is not validated here.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(RijnboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidEnvelope,
                format!(
                    "envelope too short: {} bytes, need at least {} for salt and IV",
                    bytes.len(),
                    HEADER_LEN
                ),
            ));
        }

        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (iv, ciphertext) = rest.split_at(IV_LEN);
        Ok(Self {
            salt: to_array(salt)?,
            iv: to_array(iv)?,
            ciphertext,
        })
    }

    /// Serializes the envelope back into its byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(self.salt);
        out.extend_from_slice(self.iv);
        out.extend_from_slice(self.ciphertext);
        out
    }
}

fn to_array<const N: usize>(slice: &[u8]) -> Result<&[u8; N]> {
    slice.try_into().map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::InvalidEnvelope,
            "envelope header split at the wrong offset",
            e,
        )
    })
}
