//! rijnbox - passphrase-based text encryption in a salt/IV/ciphertext envelope
//!
//! Keys are derived with PBKDF2-HMAC-SHA1 and data is encrypted with
//! Rijndael-256 (256-bit key and block) in CBC mode with PKCS#7 padding.
//! Envelopes are `salt(32) || iv(32) || ciphertext`, base64 encoded as text.
//!
//! ```no_run
//! use rijnbox::EnvelopeCipher;
//!
//! # fn main() -> rijnbox::Result<()> {
//! let cipher = EnvelopeCipher::default();
//! let armored = cipher.encrypt_string("hello world", "correct horse")?;
//! assert_eq!(cipher.decrypt_string(&armored, "correct horse")?, "hello world");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod armor;
pub mod cbccrypt;
pub mod config;
pub mod crypter;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod logging;
pub mod params;
pub mod passphrase;
pub mod rijndael;

pub use config::CipherConfig;
pub use crypter::EnvelopeCipher;
pub use error::{ErrorCategory, ErrorKind, Result, RijnboxError};
