//! Encryption/decryption using PBKDF2 + Rijndael-256-CBC
//!
//! This module implements passphrase-based encryption using:
//! - PBKDF2-HMAC-SHA1 (1000 iterations) for key derivation from passphrase
//! - Rijndael with 256-bit key and block in CBC mode with PKCS#7 padding
//!
//! The binary format is:
//! - salt: 32 bytes
//! - iv: 32 bytes
//! - ciphertext: variable length, a non-zero multiple of 32 bytes
//!
//! There is no authentication tag. A wrong passphrase is detected only
//! through invalid padding or invalid UTF-8 in the text layer.

use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::Hmac;
use log::debug;
use rand::RngCore;
use rand::rngs::OsRng;
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::envelope::Envelope;
use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};
use crate::params::{BLOCK_LEN, IV_LEN, KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};
use crate::rijndael::Rijndael256;

type Rijndael256CbcEnc = cbc::Encryptor<Rijndael256>;
type Rijndael256CbcDec = cbc::Decryptor<Rijndael256>;

/// Derive a 32-byte key from a passphrase and salt using PBKDF2-HMAC-SHA1
pub fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha1>>(passphrase, salt, PBKDF2_ITERATIONS, &mut key[..]).map_err(
        |e| {
            RijnboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CryptoBackend,
                format!("PBKDF2 key derivation failed: {}", e),
            )
        },
    )?;
    Ok(key)
}

/// Encrypt plaintext with a passphrase using random salt and IV
///
/// Returns the envelope: salt(32) + iv(32) + ciphertext(variable)
pub fn encrypt(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let salt = random_bytes::<SALT_LEN>("salt")?;
    let iv = random_bytes::<IV_LEN>("IV")?;

    encrypt_deterministic(passphrase, plaintext, &salt, &iv)
}

/// Encrypt plaintext with a passphrase using provided salt and IV
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates random salt/IV.
pub fn encrypt_deterministic(
    passphrase: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>> {
    let key = derive_key(passphrase, salt)?;

    let cipher = Rijndael256CbcEnc::new_from_slices(&key[..], iv).map_err(|e| {
        RijnboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CryptoBackend,
            format!("cipher rejected key or IV size: {}", e),
        )
    })?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let envelope = Envelope {
        salt,
        iv,
        ciphertext: &ciphertext,
    }
    .to_bytes();
    debug!(
        "encrypted {} plaintext bytes into {} byte envelope",
        plaintext.len(),
        envelope.len()
    );

    Ok(envelope)
}

/// Decrypt an envelope with a passphrase
///
/// The returned bytes are the unpadded plaintext; callers decoding text
/// must still check it is valid UTF-8.
pub fn decrypt(passphrase: &[u8], envelope_bytes: &[u8]) -> Result<Vec<u8>> {
    let envelope = Envelope::parse(envelope_bytes)?;

    if envelope.ciphertext.is_empty() || envelope.ciphertext.len() % BLOCK_LEN != 0 {
        return Err(RijnboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::DecryptionFailure,
            format!(
                "corrupt input: ciphertext length {} is not a positive multiple of {}",
                envelope.ciphertext.len(),
                BLOCK_LEN
            ),
        ));
    }

    let key = derive_key(passphrase, envelope.salt)?;
    let cipher = Rijndael256CbcDec::new_from_slices(&key[..], envelope.iv).map_err(|e| {
        RijnboxError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CryptoBackend,
            format!("cipher rejected key or IV size: {}", e),
        )
    })?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(envelope.ciphertext)
        .map_err(|_| {
            RijnboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::DecryptionFailure,
                "corrupt input or bad passphrase",
            )
        })?;

    debug!(
        "decrypted {} byte envelope into {} plaintext bytes",
        envelope_bytes.len(),
        plaintext.len()
    );
    Ok(plaintext)
}

fn random_bytes<const N: usize>(what: &str) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::CryptoBackend,
            format!("failed to generate random {}", what),
            e,
        )
    })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::HEADER_LEN;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_derive_key_known_answer() {
        let key = derive_key(b"correct horse", &[0x42u8; SALT_LEN]).unwrap();
        assert_eq!(
            hex(&key[..]),
            "4c0130bf1830717fcea0acdd5cea876708b50c8429b5ea36e0838c1326403001"
        );
    }

    #[test]
    fn test_empty_plaintext() {
        let passphrase = b"test";
        let plaintext = b"";

        let envelope = encrypt(passphrase, plaintext).unwrap();
        // PKCS#7 always adds a full block for block-aligned input
        assert_eq!(envelope.len(), HEADER_LEN + BLOCK_LEN);

        let decrypted = decrypt(passphrase, &envelope).unwrap();
        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_small_plaintext() {
        let passphrase = b"test";
        let plaintext = b"hello";

        let envelope = encrypt(passphrase, plaintext).unwrap();
        let decrypted = decrypt(passphrase, &envelope).unwrap();

        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_block_aligned_plaintext_gets_extra_block() {
        let plaintext = [0x61u8; BLOCK_LEN * 2];
        let envelope = encrypt(b"test", &plaintext).unwrap();
        assert_eq!(envelope.len(), HEADER_LEN + BLOCK_LEN * 3);
    }

    #[test]
    fn test_fresh_salt_and_iv_per_call() {
        let e1 = encrypt(b"test", b"hello world").unwrap();
        let e2 = encrypt(b"test", b"hello world").unwrap();

        assert_ne!(e1, e2);
        assert_ne!(e1[..SALT_LEN], e2[..SALT_LEN]);
        assert_ne!(e1[SALT_LEN..HEADER_LEN], e2[SALT_LEN..HEADER_LEN]);
    }

    #[test]
    fn test_deterministic_encryption() {
        let salt = [1u8; SALT_LEN];
        let iv = [2u8; IV_LEN];

        let e1 = encrypt_deterministic(b"test", b"hello world", &salt, &iv).unwrap();
        let e2 = encrypt_deterministic(b"test", b"hello world", &salt, &iv).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(&e1[..SALT_LEN], &salt);
        assert_eq!(&e1[SALT_LEN..HEADER_LEN], &iv);
    }

    #[test]
    fn test_different_iv_different_ciphertext() {
        let salt = [1u8; SALT_LEN];

        let e1 = encrypt_deterministic(b"test", b"hello world", &salt, &[2u8; IV_LEN]).unwrap();
        let e2 = encrypt_deterministic(b"test", b"hello world", &salt, &[3u8; IV_LEN]).unwrap();
        assert_ne!(e1[HEADER_LEN..], e2[HEADER_LEN..]);

        assert_eq!(decrypt(b"test", &e1).unwrap(), b"hello world");
        assert_eq!(decrypt(b"test", &e2).unwrap(), b"hello world");
    }

    #[test]
    fn test_wrong_passphrase() {
        let envelope = encrypt_deterministic(
            b"correct horse",
            b"hello world",
            &[0x42u8; SALT_LEN],
            &[0x24u8; IV_LEN],
        )
        .unwrap();

        let err = decrypt(b"wrong", &envelope).expect_err("expected decryption failure");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailure));
        assert!(err.to_string().contains("corrupt input or bad passphrase"));
    }

    #[test]
    fn test_truncated_header() {
        let err = decrypt(b"test", &[0u8; HEADER_LEN - 1]).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::InvalidEnvelope));
    }

    #[test]
    fn test_header_without_ciphertext() {
        let err = decrypt(b"test", &[0u8; HEADER_LEN]).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailure));
    }

    #[test]
    fn test_partial_block() {
        let mut envelope = encrypt(b"test", b"hello").unwrap();
        envelope.pop();

        let err = decrypt(b"test", &envelope).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailure));
        assert!(err.to_string().contains("not a positive multiple of 32"));
    }

    #[test]
    fn test_tampered_iv_changes_first_block_only() {
        let plaintext = b"0123456789abcdef0123456789abcdef and a second block";
        let mut envelope = encrypt(b"test", plaintext).unwrap();
        // Flipping an IV bit flips the same bit of the first plaintext block.
        envelope[SALT_LEN] ^= 0x01;

        let decrypted = decrypt(b"test", &envelope).unwrap();
        assert_eq!(decrypted[0], plaintext[0] ^ 0x01);
        assert_eq!(&decrypted[1..], &plaintext[1..]);
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();

        let envelope = encrypt(b"test", &plaintext).unwrap();
        let decrypted = decrypt(b"test", &envelope).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_large_plaintext() {
        let plaintext = vec![0x42u8; 128 * 1024];

        let envelope = encrypt(b"test", &plaintext).unwrap();
        let decrypted = decrypt(b"test", &envelope).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_cross_implementation_compatibility() {
        // Pinned envelope for fixed salt/IV. Any change to these bytes means
        // previously written envelopes no longer decrypt.
        let envelope = encrypt_deterministic(
            b"correct horse",
            b"hello world",
            &[0x42u8; SALT_LEN],
            &[0x24u8; IV_LEN],
        )
        .unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = [
            vec![0x42u8; SALT_LEN],
            vec![0x24u8; IV_LEN],
            vec![
                0x8d, 0x81, 0xd8, 0xef, 0x39, 0x0a, 0x45, 0xd1,
                0x81, 0xa6, 0xab, 0x72, 0xe8, 0x84, 0x1e, 0xab,
                0x74, 0x07, 0x84, 0x76, 0x8f, 0x1a, 0x29, 0x6f,
                0x15, 0x86, 0x05, 0xf7, 0xa7, 0xb9, 0xd8, 0x3d,
            ],
        ]
        .concat();

        assert_eq!(envelope, expected);
        assert_eq!(decrypt(b"correct horse", &envelope).unwrap(), b"hello world");
    }
}
