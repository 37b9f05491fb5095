//! Integrity Verification
//!
//! Compares a downloaded package against the hash published in the manifest.

use async_trait::async_trait;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::error::{Result, UpdateError};

/// Digest used for a published hash, chosen by its hex length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Pick the digest from the hex length: 40 is SHA-1, 64 SHA-256, 128 SHA-512.
    pub fn for_expected(expected: &str) -> Result<Self> {
        let expected = expected.trim();
        if !expected.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(UpdateError::UnsupportedHash(expected.to_string()));
        }
        match expected.len() {
            40 => Ok(Self::Sha1),
            64 => Ok(Self::Sha256),
            128 => Ok(Self::Sha512),
            _ => Err(UpdateError::UnsupportedHash(expected.to_string())),
        }
    }
}

#[async_trait]
pub trait IntegrityVerifier: Send + Sync {
    /// Fail with `HashMismatch` unless the file at `path` hashes to `expected`.
    async fn verify(&self, path: &Path, expected: &str) -> Result<()>;
}

/// Streaming SHA-1 / SHA-2 verifier
#[derive(Debug, Default, Clone, Copy)]
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Calculate the hex digest of a file
    pub fn calculate(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
        match algorithm {
            HashAlgorithm::Sha1 => digest_file::<Sha1>(path),
            HashAlgorithm::Sha256 => digest_file::<Sha256>(path),
            HashAlgorithm::Sha512 => digest_file::<Sha512>(path),
        }
    }

    /// Verify a file's checksum (blocking)
    pub fn verify_blocking(path: &Path, expected: &str) -> Result<()> {
        let expected = expected.trim();
        let algorithm = HashAlgorithm::for_expected(expected)?;
        let actual = Self::calculate(path, algorithm)?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(UpdateError::HashMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }
}

fn digest_file<D: Digest>(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = D::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[async_trait]
impl IntegrityVerifier for ChecksumVerifier {
    async fn verify(&self, path: &Path, expected: &str) -> Result<()> {
        let path: PathBuf = path.to_path_buf();
        let expected = expected.to_string();
        tokio::task::spawn_blocking(move || Self::verify_blocking(&path, &expected))
            .await
            .map_err(|e| UpdateError::Io(io::Error::other(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";
    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn hello_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_sha256_calculation() {
        let file = hello_file();
        let checksum = ChecksumVerifier::calculate(file.path(), HashAlgorithm::Sha256).unwrap();
        assert_eq!(checksum, HELLO_SHA256);
    }

    #[test]
    fn test_algorithm_selection() {
        assert_eq!(HashAlgorithm::for_expected(HELLO_SHA1).unwrap(), HashAlgorithm::Sha1);
        assert_eq!(HashAlgorithm::for_expected(HELLO_SHA256).unwrap(), HashAlgorithm::Sha256);
        assert_eq!(
            HashAlgorithm::for_expected(&"a".repeat(128)).unwrap(),
            HashAlgorithm::Sha512
        );
    }

    #[test]
    fn test_unsupported_hash_lengths_rejected() {
        let md5_length = "a".repeat(32);
        let truncated = "a".repeat(63);
        let not_hex = "g".repeat(40);
        for hash in ["", "abc", md5_length.as_str(), truncated.as_str(), not_hex.as_str()] {
            assert!(
                matches!(
                    HashAlgorithm::for_expected(hash),
                    Err(UpdateError::UnsupportedHash(_))
                ),
                "{hash:?} must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_sha1_hash_verifies() {
        let file = hello_file();
        let verifier = ChecksumVerifier::new();
        assert!(verifier.verify(file.path(), HELLO_SHA1).await.is_ok());
        assert!(verifier
            .verify(file.path(), &HELLO_SHA1.to_uppercase())
            .await
            .is_ok());

        let wrong = "0".repeat(40);
        let result = verifier.verify(file.path(), &wrong).await;
        match result {
            Err(UpdateError::HashMismatch { actual, .. }) => assert_eq!(actual, HELLO_SHA1),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_sha512_roundtrip() {
        let file = hello_file();
        let digest = ChecksumVerifier::calculate(file.path(), HashAlgorithm::Sha512).unwrap();
        assert_eq!(digest.len(), 128);
        assert!(ChecksumVerifier::verify_blocking(file.path(), &digest).is_ok());
    }

    #[tokio::test]
    async fn test_checksum_verification_success() {
        let file = hello_file();
        let verifier = ChecksumVerifier::new();
        assert!(verifier.verify(file.path(), HELLO_SHA256).await.is_ok());
        // Case-insensitive
        assert!(verifier
            .verify(file.path(), &HELLO_SHA256.to_uppercase())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_checksum_verification_failure() {
        let file = hello_file();
        let result = ChecksumVerifier::new()
            .verify(file.path(), &"0".repeat(64))
            .await;
        assert!(matches!(result, Err(UpdateError::HashMismatch { .. })));

        let result = ChecksumVerifier::new().verify(file.path(), "wrongchecksum").await;
        assert!(matches!(result, Err(UpdateError::UnsupportedHash(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ChecksumVerifier::new()
            .verify(&dir.path().join("nope"), HELLO_SHA256)
            .await;
        assert!(matches!(result, Err(UpdateError::Io(_))));
    }
}
