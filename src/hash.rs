// src/hash.rs

//! SHA-256 checksums for source archives and vendored resources
//!
//! Recipes carry checksums either as bare lowercase hex or prefixed with the
//! algorithm name (`sha256:abc123...`). Both forms parse to the same
//! [`Checksum`].

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Length of a hex-encoded SHA-256 digest
const SHA256_HEX_LEN: usize = 64;

/// A validated SHA-256 checksum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// The hex digest, lowercase
    #[inline]
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Format as a prefixed string (e.g., "sha256:abc123...")
    pub fn to_prefixed_string(&self) -> String {
        format!("sha256:{}", self.0)
    }

    /// Name usable as a cache file key
    pub fn cache_key(&self) -> String {
        format!("sha256_{}", self.0)
    }

    /// Check whether `actual` matches this checksum
    pub fn matches(&self, actual: &str) -> bool {
        self.0.eq_ignore_ascii_case(actual)
    }
}

impl FromStr for Checksum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex_part = match s.split_once(':') {
            Some(("sha256", rest)) => rest,
            Some((algo, _)) => {
                return Err(Error::ParseError(format!(
                    "Unsupported checksum algorithm: {} (supported: sha256)",
                    algo
                )));
            }
            None => s,
        };

        if hex_part.len() != SHA256_HEX_LEN {
            return Err(Error::ParseError(format!(
                "Invalid sha256 length: expected {}, got {}",
                SHA256_HEX_LEN,
                hex_part.len()
            )));
        }
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::ParseError(format!("Invalid hex in checksum: {}", hex_part)));
        }

        Ok(Self(hex_part.to_ascii_lowercase()))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the SHA-256 of everything a reader yields
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 of a file without loading it into memory
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
    Ok(sha256_reader(&mut file)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_reader() {
        assert_eq!(sha256_reader(&mut &b"hello world"[..]).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn test_checksum_accepts_bare_and_prefixed() {
        let bare: Checksum = HELLO_SHA256.parse().unwrap();
        let prefixed: Checksum = format!("sha256:{}", HELLO_SHA256).parse().unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare.to_prefixed_string(), format!("sha256:{}", HELLO_SHA256));
    }

    #[test]
    fn test_checksum_normalizes_case() {
        let upper: Checksum = HELLO_SHA256.to_uppercase().parse().unwrap();
        assert_eq!(upper.as_hex(), HELLO_SHA256);
        assert!(upper.matches(HELLO_SHA256));
    }

    #[test]
    fn test_checksum_rejects_bad_input() {
        assert!("md5:abc".parse::<Checksum>().is_err());
        assert!("sha256:abc".parse::<Checksum>().is_err());
        assert!("z".repeat(64).parse::<Checksum>().is_err());
    }

    #[test]
    fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"hello world").unwrap();
        assert_eq!(sha256_file(&path).unwrap(), HELLO_SHA256);
    }
}
