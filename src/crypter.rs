//! String and file API over the envelope format
//!
//! [`EnvelopeCipher`] is what applications embed: it owns a
//! [`CipherConfig`] and resolves the passphrase of every call against it.
//! The free functions work on an already resolved passphrase.

use std::path::Path;

use crate::armor;
use crate::cbccrypt;
use crate::config::CipherConfig;
use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};
use crate::file_ops;
use crate::passphrase::{ConstantPassphraseReader, ResolvingPassphraseReader};

/// Encrypt text and return the base64 envelope.
pub fn encrypt_text(passphrase: &[u8], plaintext: &str) -> Result<String> {
    let envelope = cbccrypt::encrypt(passphrase, plaintext.as_bytes())?;
    Ok(armor::wrap(&envelope))
}

/// Decrypt a base64 envelope back into text.
///
/// Output that is not valid UTF-8 is treated like a padding failure: with
/// no integrity tag, that is how a wrong passphrase usually shows up when
/// the padding happens to look valid.
pub fn decrypt_text(passphrase: &[u8], armored: &str) -> Result<String> {
    let envelope = armor::unwrap(armored)?;
    let plaintext = cbccrypt::decrypt(passphrase, &envelope)?;
    String::from_utf8(plaintext).map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::DecryptionFailure,
            "corrupt input or bad passphrase (decrypted data is not UTF-8)",
            e.utf8_error(),
        )
    })
}

/// Passphrase-based encryption of strings and files.
///
/// Every method takes a per-call passphrase; pass `""` to use the default
/// passphrase of the configuration. Calls share no mutable state, so one
/// instance can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeCipher {
    config: CipherConfig,
}

impl EnvelopeCipher {
    pub fn new(config: CipherConfig) -> Self {
        Self { config }
    }

    /// Shorthand for a cipher whose only setting is a default passphrase.
    pub fn with_default_passphrase(passphrase: &str) -> Self {
        Self::new(CipherConfig::new().with_default_passphrase(passphrase))
    }

    /// Encrypt `plaintext`, returning the base64 envelope.
    pub fn encrypt_string(&self, plaintext: &str, passphrase: &str) -> Result<String> {
        let passphrase = self.config.resolve(Some(passphrase.as_bytes()))?;
        encrypt_text(passphrase, plaintext)
    }

    /// Decrypt a base64 envelope produced by [`encrypt_string`](Self::encrypt_string).
    pub fn decrypt_string(&self, armored: &str, passphrase: &str) -> Result<String> {
        let passphrase = self.config.resolve(Some(passphrase.as_bytes()))?;
        decrypt_text(passphrase, armored)
    }

    /// Encrypt the text file at `input_path` into a base64 envelope at
    /// `output_path`. See [`file_ops::encrypt_file`].
    pub fn encrypt_file(
        &self,
        input_path: &Path,
        output_path: &Path,
        passphrase: &str,
        overwrite: bool,
    ) -> Result<()> {
        let mut reader = self.reader_for(passphrase);
        file_ops::encrypt_file(input_path, output_path, &mut reader, overwrite)
    }

    /// Decrypt the envelope file at `input_path` into text at `output_path`.
    /// See [`file_ops::decrypt_file`].
    pub fn decrypt_file(
        &self,
        input_path: &Path,
        output_path: &Path,
        passphrase: &str,
        overwrite: bool,
    ) -> Result<()> {
        let mut reader = self.reader_for(passphrase);
        file_ops::decrypt_file(input_path, output_path, &mut reader, overwrite)
    }

    fn reader_for(&self, passphrase: &str) -> ResolvingPassphraseReader<'_> {
        ResolvingPassphraseReader::new(
            Box::new(ConstantPassphraseReader::new(passphrase.as_bytes().to_vec())),
            &self.config,
        )
    }
}
