//! Vendor-published digests.

use serde::{Deserialize, Serialize};

/// Digest algorithms the validator can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// SHA-256, 64 hex characters.
    Sha256,
    /// SHA-512, 128 hex characters.
    Sha512,
}

impl ChecksumAlgorithm {
    /// Length of the hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Lowercase tag (`sha256`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChecksumAlgorithm {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ChecksumError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Errors raised while reading a published checksum.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChecksumError {
    /// The vendor named an algorithm the validator cannot compute.
    #[error("Unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The digest is the wrong length for its algorithm.
    #[error("Invalid {algorithm} digest: expected {expected} hex characters, got {actual}")]
    InvalidLength {
        /// Algorithm the digest claims to be.
        algorithm: ChecksumAlgorithm,
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// The digest contains characters outside `[0-9a-fA-F]`.
    #[error("Invalid {0} digest: contains non-hex characters")]
    NotHex(ChecksumAlgorithm),
}

/// A vendor-published digest: algorithm tag plus lowercase hex.
///
/// Validated at construction so a malformed annotation is caught while the
/// catalog is parsed, not after a download.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    /// Algorithm the digest was produced with.
    pub algorithm: ChecksumAlgorithm,
    digest: String,
}

impl Checksum {
    /// Create a validated checksum.
    ///
    /// Accepts digests with or without an `<algorithm>:` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::InvalidLength`] or [`ChecksumError::NotHex`]
    /// if the hex portion is malformed for `algorithm`.
    pub fn new(algorithm: ChecksumAlgorithm, digest: &str) -> Result<Self, ChecksumError> {
        let trimmed = digest.trim();
        let prefix = format!("{}:", algorithm.as_str());
        let hex = trimmed.strip_prefix(prefix.as_str()).unwrap_or(trimmed);

        if hex.len() != algorithm.hex_len() {
            return Err(ChecksumError::InvalidLength {
                algorithm,
                expected: algorithm.hex_len(),
                actual: hex.len(),
            });
        }
        if ::hex::decode(hex).is_err() {
            return Err(ChecksumError::NotHex(algorithm));
        }

        Ok(Self {
            algorithm,
            digest: hex.to_ascii_lowercase(),
        })
    }

    /// Lowercase hex digest.
    pub fn hex(&self) -> &str {
        &self.digest
    }

    /// Compare against a freshly computed hex digest, ignoring case.
    pub fn matches_hex(&self, computed: &str) -> bool {
        self.digest.eq_ignore_ascii_case(computed)
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}
