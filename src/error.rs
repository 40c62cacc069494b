use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee that the error is not, for
    /// example, caused by the user - merely that the code cannot tell.
    Internal,

    /// The user provided invalid input or asked for something that is
    /// unsupported or impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required argument was missing or unusable (e.g. an empty
    /// passphrase that could not be resolved, or non-UTF-8 input text).
    InvalidArgument,
    /// The input file of a file operation does not exist.
    FileNotFound,
    /// The output file of a file operation exists and overwriting was not requested.
    FileExists,
    /// The envelope is too short to hold a salt and an IV.
    InvalidEnvelope,
    /// The textual envelope is not valid base64.
    ArmoringDecode,
    /// Padding or UTF-8 validation failed after decryption. This is what a
    /// wrong passphrase looks like, but corruption produces it too.
    DecryptionFailure,
    /// The random source, the key derivation or the block cipher failed.
    CryptoBackend,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct RijnboxError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Code consuming errors MUST handle
    /// the absence of a kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl RijnboxError {
    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Returns true if the error is tagged with `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// Wraps the current error with a higher-level message while preserving
    /// the original as source. Category and kind carry over.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RijnboxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_context_keeps_kind_and_chain() {
        let inner = RijnboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::FileNotFound,
            "failed to read from in.txt",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let outer = inner.with_context("encryption failed");

        assert_eq!(outer.to_string(), "encryption failed");
        assert_eq!(outer.category, ErrorCategory::User);
        assert!(outer.is(ErrorKind::FileNotFound));

        let source = outer.source().expect("context error should have a source");
        assert_eq!(source.to_string(), "failed to read from in.txt");
        assert_eq!(source.source().unwrap().to_string(), "gone");
    }

    #[test]
    fn test_with_kind_has_no_source() {
        let err = RijnboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CryptoBackend,
            "boom",
        );
        assert!(err.is(ErrorKind::CryptoBackend));
        assert!(!err.is(ErrorKind::Io));
        assert_eq!(err.to_string(), "boom");
        assert!(err.source().is_none());
    }
}
