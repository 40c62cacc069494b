//! Envelope format constants.
//!
//! These values are part of the on-disk format. Changing any of them makes
//! previously produced envelopes undecryptable.

/// Length of the random salt fed to key derivation.
pub const SALT_LEN: usize = 32;

/// Cipher block size in bytes (Rijndael with a 256-bit block).
pub const BLOCK_LEN: usize = 32;

/// Length of the CBC initialization vector; equal to the block size.
pub const IV_LEN: usize = BLOCK_LEN;

/// Length of the derived key (256 bits).
pub const KEY_LEN: usize = 32;

/// Bytes preceding the ciphertext in an envelope.
pub const HEADER_LEN: usize = SALT_LEN + IV_LEN;

/// PBKDF2-HMAC-SHA1 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 1000;
