//! Passphrase reading functionality

use crate::config::CipherConfig;
use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed passphrase
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads passphrase from any io::Read source
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            RijnboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                "error reading passphrase",
                e,
            )
        })?;
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
#[derive(Default)]
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Terminal input is limited to UTF-8 by rpassword. For non-UTF-8
    /// passphrases, use --passphrase-stdin instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(RijnboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(b"Passphrase (rijnbox): ")
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                RijnboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to write prompt",
                    e,
                )
            })?;

        // rpassword returns a plain String; move it into a zeroizing buffer
        // right away.
        let passphrase = rpassword::read_password().map_err(|e| {
            RijnboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                "failure reading passphrase",
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

/// Wraps another PassphraseReader and applies a [`CipherConfig`] to its result
///
/// An empty passphrase from upstream falls back to the configured default;
/// if that is missing too, reading fails unless the configuration allows
/// empty passphrases.
pub struct ResolvingPassphraseReader<'a> {
    upstream: Box<dyn PassphraseReader + 'a>,
    config: &'a CipherConfig,
}

impl<'a> ResolvingPassphraseReader<'a> {
    pub fn new(upstream: Box<dyn PassphraseReader + 'a>, config: &'a CipherConfig) -> Self {
        Self { upstream, config }
    }
}

impl PassphraseReader for ResolvingPassphraseReader<'_> {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let given = self.upstream.read_passphrase()?;
        let resolved = self.config.resolve(Some(given.as_slice()))?;
        Ok(Zeroizing::new(resolved.to_vec()))
    }
}
