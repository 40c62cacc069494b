//! File encryption/decryption operations
//!
//! This module provides high-level file operations for encrypting and
//! decrypting text files using the envelope format. Files are processed
//! entirely in memory and outputs are replaced atomically.

use crate::crypter;
use crate::error::{ErrorCategory, ErrorKind, Result, RijnboxError};
use crate::passphrase::PassphraseReader;
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// UTF-8 encoding of U+FEFF, written at file start by some editors.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Encrypt a text file with a passphrase
///
/// Reads UTF-8 text from `input_path`, encrypts it using a passphrase from
/// `passphrase_reader`, and writes the base64 envelope to `output_path`.
///
/// Fails with [`ErrorKind::FileNotFound`] if the input does not exist and
/// with [`ErrorKind::FileExists`] if the output exists and `overwrite` is
/// false. Nothing is written unless encryption succeeded.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    overwrite: bool,
) -> Result<()> {
    check_paths(input_path, output_path, overwrite)?;

    let plaintext = read_text(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let armored = crypter::encrypt_text(&passphrase, &plaintext)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_atomic(output_path, armored.as_bytes(), overwrite)?;

    debug!(
        "encrypted {} into {}",
        input_path.display(),
        output_path.display()
    );
    Ok(())
}

/// Decrypt a text file with a passphrase
///
/// Reads a base64 envelope from `input_path`, decrypts it using a passphrase
/// from `passphrase_reader`, and writes the text to `output_path`.
///
/// Preconditions and failure behavior mirror [`encrypt_file`].
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    overwrite: bool,
) -> Result<()> {
    check_paths(input_path, output_path, overwrite)?;

    let armored = read_text(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let plaintext = crypter::decrypt_text(&passphrase, &armored)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_atomic(output_path, plaintext.as_bytes(), overwrite)?;

    debug!(
        "decrypted {} into {}",
        input_path.display(),
        output_path.display()
    );
    Ok(())
}

fn check_paths(input_path: &Path, output_path: &Path, overwrite: bool) -> Result<()> {
    match fs::metadata(input_path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(RijnboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::FileNotFound,
                format!("{} is not a file", input_path.display()),
            ));
        }
        Err(e) => return Err(read_error(input_path, e)),
    }

    let exists = output_path.try_exists().map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to check whether {} exists", output_path.display()),
            e,
        )
    })?;
    if exists && !overwrite {
        return Err(file_exists_error(output_path));
    }
    Ok(())
}

/// Read a whole file as UTF-8 text, dropping a leading byte order mark.
fn read_text(path: &Path) -> Result<String> {
    let mut bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    String::from_utf8(bytes).map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidArgument,
            format!("{} is not valid UTF-8 text", path.display()),
            e,
        )
    })
}

/// Write `contents` to `path` via a temporary file in the same directory.
///
/// The temporary file is flushed and synced before it is renamed over
/// `path`, so readers only ever observe the old file or the complete new
/// one. Without `overwrite` the rename refuses to replace an existing file.
/// On Unix the result has mode 0o600.
fn write_file_atomic(path: &Path, contents: &[u8], overwrite: bool) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file
        .write_all(contents)
        .and_then(|()| temp_file.flush())
        .map_err(|e| {
            RijnboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to write to tempfile",
                e,
            )
        })?;
    // fsync() such that the rename, if it succeeds, always points to a
    // complete file.
    temp_file.as_file().sync_all().map_err(|e| {
        RijnboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                RijnboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    let persisted = if overwrite {
        temp_file.persist(path)
    } else {
        temp_file.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            return file_exists_error(path);
        }
        RijnboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn file_exists_error(path: &Path) -> RijnboxError {
    RijnboxError::with_kind(
        ErrorCategory::User,
        ErrorKind::FileExists,
        format!("{} already exists; refusing to overwrite", path.display()),
    )
}

fn read_error(path: &Path, err: io::Error) -> RijnboxError {
    let (category, kind) = if err.kind() == io::ErrorKind::NotFound {
        (ErrorCategory::User, ErrorKind::FileNotFound)
    } else {
        (ErrorCategory::Internal, ErrorKind::Io)
    };
    RijnboxError::with_kind_and_source(
        category,
        kind,
        format!("failed to read from {}", path.display()),
        err,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::passphrase::ConstantPassphraseReader;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn reader(passphrase: &str) -> ConstantPassphraseReader {
        ConstantPassphraseReader::new(passphrase.as_bytes().to_vec())
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.rjb");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        let plaintext = "Hello, rijnbox!\n";
        fs::write(&plain_path, plaintext).unwrap();

        encrypt_file(&plain_path, &crypt_path, &mut reader("test password"), false).unwrap();
        let armored = fs::read_to_string(&crypt_path).unwrap();
        assert!(!armored.contains("Hello"));

        decrypt_file(&crypt_path, &decrypted_path, &mut reader("test password"), false).unwrap();
        assert_eq!(fs::read_to_string(&decrypted_path).unwrap(), plaintext);
    }

    #[test]
    fn test_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");
        let out = temp_dir.path().join("out.rjb");

        let err = encrypt_file(&missing, &out, &mut reader("pw"), false).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::FileNotFound));
        assert!(!out.exists());

        let err = decrypt_file(&missing, &out, &mut reader("pw"), true).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::FileNotFound));
    }

    #[test]
    fn test_existing_output_requires_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.rjb");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        fs::write(&plain_path, "first").unwrap();
        encrypt_file(&plain_path, &crypt_path, &mut reader("pw"), false).unwrap();
        let first = fs::read(&crypt_path).unwrap();

        fs::write(&plain_path, "second").unwrap();
        let err = encrypt_file(&plain_path, &crypt_path, &mut reader("pw"), false).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::FileExists));
        assert_eq!(fs::read(&crypt_path).unwrap(), first);

        encrypt_file(&plain_path, &crypt_path, &mut reader("pw"), true).unwrap();
        decrypt_file(&crypt_path, &decrypted_path, &mut reader("pw"), false).unwrap();
        assert_eq!(fs::read_to_string(&decrypted_path).unwrap(), "second");
    }

    #[test]
    fn test_failed_decrypt_leaves_output_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.rjb");
        let out_path = temp_dir.path().join("out.txt");

        fs::write(&plain_path, "secret").unwrap();
        encrypt_file(&plain_path, &crypt_path, &mut reader("correct"), false).unwrap();
        fs::write(&out_path, "previous").unwrap();

        let err = decrypt_file(&crypt_path, &out_path, &mut reader("wrong"), true).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailure));
        assert_eq!(fs::read_to_string(&out_path).unwrap(), "previous");

        // No stray temp files left behind either.
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_bom_is_stripped() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.rjb");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        fs::write(&plain_path, b"\xef\xbb\xbfwith bom").unwrap();
        encrypt_file(&plain_path, &crypt_path, &mut reader("pw"), false).unwrap();

        // Envelope text with a BOM, as some Windows tools write it.
        let mut armored = UTF8_BOM.to_vec();
        armored.extend(fs::read(&crypt_path).unwrap());
        fs::write(&crypt_path, armored).unwrap();

        decrypt_file(&crypt_path, &decrypted_path, &mut reader("pw"), false).unwrap();
        assert_eq!(fs::read_to_string(&decrypted_path).unwrap(), "with bom");
    }

    #[test]
    fn test_non_utf8_input_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("binary.bin");
        let crypt_path = temp_dir.path().join("binary.rjb");

        fs::write(&plain_path, [0xffu8, 0x00, 0xfe]).unwrap();
        let err = encrypt_file(&plain_path, &crypt_path, &mut reader("pw"), false).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::InvalidArgument));
        assert!(!crypt_path.exists());
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("empty.txt");
        let crypt_path = temp_dir.path().join("empty.txt.rjb");
        let decrypted_path = temp_dir.path().join("decrypted.txt");

        fs::write(&plain_path, b"").unwrap();
        encrypt_file(&plain_path, &crypt_path, &mut reader("test"), false).unwrap();
        decrypt_file(&crypt_path, &decrypted_path, &mut reader("test"), false).unwrap();

        assert_eq!(fs::read(&decrypted_path).unwrap(), b"");
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let plain_path = temp_dir.path().join("plain.txt");
        let crypt_path = temp_dir.path().join("plain.txt.rjb");

        fs::write(&plain_path, b"test").unwrap();
        encrypt_file(&plain_path, &crypt_path, &mut reader("test"), false).unwrap();

        let permissions = fs::metadata(&crypt_path).unwrap().permissions();
        assert_eq!(permissions.mode() & 0o777, 0o600);
    }
}
