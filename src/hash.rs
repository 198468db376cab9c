// src/hash.rs

//! SHA-256 helpers for artifact integrity
//!
//! Downloads are verified against the checksum published by the build
//! service. Hex digests compare case-insensitively; ours are emitted
//! lowercase.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Read};
use std::path::Path;

/// Details of a failed checksum verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyError {
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sha256 mismatch: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for VerifyError {}

/// SHA-256 of a byte slice as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of a reader, streamed in 8 KB chunks.
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify a file on disk against an expected hex digest.
///
/// The file content is streamed, so artifact-sized inputs are fine. Read
/// failures surface as a mismatch with a sentinel in place of the digest.
pub fn verify_file_sha256(path: &Path, expected: &str) -> Result<(), VerifyError> {
    let mut file = std::fs::File::open(path).map_err(|_| VerifyError {
        expected: expected.to_string(),
        actual: "<unreadable file>".to_string(),
    })?;
    let actual = sha256_reader(&mut file).map_err(|_| VerifyError {
        expected: expected.to_string(),
        actual: "<unreadable file>".to_string(),
    })?;
    if actual == expected.to_lowercase() {
        Ok(())
    } else {
        Err(VerifyError {
            expected: expected.to_string(),
            actual,
        })
    }
}
