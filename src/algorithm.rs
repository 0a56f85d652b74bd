//! Supported digest algorithms

use crate::error::ConfigurationError;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// Digest used for per-source hashes and the composite fingerprint hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
    Md5,
    Blake3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Start a new streaming digest for this algorithm
    pub fn digester(&self) -> Digester {
        match self {
            HashAlgorithm::Sha1 => Digester::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Digester::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Digester::Sha512(Sha512::new()),
            HashAlgorithm::Md5 => Digester::Md5(Md5::new()),
            HashAlgorithm::Blake3 => Digester::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// Hex digest of a complete in-memory buffer
    pub fn hash_bytes(&self, bytes: &[u8]) -> String {
        let mut digester = self.digester();
        digester.update(bytes);
        digester.finalize()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "md5" => Ok(HashAlgorithm::Md5),
            "blake3" => Ok(HashAlgorithm::Blake3),
            _ => Err(ConfigurationError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Incremental digest state, one variant per algorithm
pub enum Digester {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            Digester::Sha1(h) => h.update(bytes),
            Digester::Sha256(h) => h.update(bytes),
            Digester::Sha512(h) => h.update(bytes),
            Digester::Md5(h) => h.update(bytes),
            Digester::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    /// Consume the state and return the lowercase hex digest
    pub fn finalize(self) -> String {
        match self {
            Digester::Sha1(h) => hex::encode(h.finalize()),
            Digester::Sha256(h) => hex::encode(h.finalize()),
            Digester::Sha512(h) => hex::encode(h.finalize()),
            Digester::Md5(h) => hex::encode(h.finalize()),
            Digester::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests_of_empty_input() {
        assert_eq!(
            HashAlgorithm::Sha1.hash_bytes(b""),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            HashAlgorithm::Md5.hash_bytes(b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            HashAlgorithm::Sha256.hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        for algorithm in [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha512,
            HashAlgorithm::Md5,
            HashAlgorithm::Blake3,
        ] {
            let mut digester = algorithm.digester();
            digester.update(b"hello ");
            digester.update(b"world");
            assert_eq!(digester.finalize(), algorithm.hash_bytes(b"hello world"));
        }
    }

    #[test]
    fn test_parse_algorithm_names() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert!(matches!(
            "crc32".parse::<HashAlgorithm>(),
            Err(ConfigurationError::UnknownAlgorithm(_))
        ));
    }
}
