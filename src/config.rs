//! Cipher configuration and passphrase resolution
//!
//! A passphrase may be given per call or fall back to a default held by the
//! configuration. Resolution happens before any cryptographic work and
//! refuses to continue with an empty passphrase unless that was explicitly
//! allowed.

use log::warn;
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};

/// Caller-supplied settings for an [`EnvelopeCipher`](crate::crypter::EnvelopeCipher).
#[derive(Clone, Default)]
pub struct CipherConfig {
    /// Used whenever a call does not supply a non-empty passphrase.
    pub default_passphrase: Option<Zeroizing<Vec<u8>>>,
    /// Derive keys from the empty passphrase instead of failing when neither
    /// the call nor the default provides one. Such keys offer no protection.
    pub allow_empty_passphrase: bool,
}

impl CipherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_passphrase(mut self, passphrase: impl Into<Vec<u8>>) -> Self {
        self.default_passphrase = Some(Zeroizing::new(passphrase.into()));
        self
    }

    pub fn allow_empty_passphrase(mut self, allow: bool) -> Self {
        self.allow_empty_passphrase = allow;
        self
    }

    /// Pick the passphrase for one call. See [`resolve_passphrase`].
    pub fn resolve<'a>(&'a self, per_call: Option<&'a [u8]>) -> Result<&'a [u8]> {
        resolve_passphrase(
            per_call,
            self.default_passphrase.as_deref().map(Vec::as_slice),
            self.allow_empty_passphrase,
        )
    }
}

impl std::fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherConfig")
            .field(
                "default_passphrase",
                &self.default_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("allow_empty_passphrase", &self.allow_empty_passphrase)
            .finish()
    }
}

/// Returns the per-call passphrase when non-empty, otherwise the default
/// when non-empty.
///
/// When both are missing or empty this fails with
/// [`ErrorKind::InvalidArgument`], unless `allow_empty` is set, in which case
/// the empty passphrase is returned and a warning is logged.
pub fn resolve_passphrase<'a>(
    per_call: Option<&'a [u8]>,
    default: Option<&'a [u8]>,
    allow_empty: bool,
) -> Result<&'a [u8]> {
    if let Some(p) = per_call.filter(|p| !p.is_empty()) {
        return Ok(p);
    }
    if let Some(p) = default.filter(|p| !p.is_empty()) {
        return Ok(p);
    }
    if allow_empty {
        warn!("no passphrase given; deriving key from the empty passphrase");
        return Ok(&[]);
    }
    Err(RijnboxError::with_kind(
        ErrorCategory::User,
        ErrorKind::InvalidArgument,
        "passphrase must not be empty",
    ))
}
