//! Typed failures for each pipeline stage.
//!
//! Every error carries the context needed to diagnose it from the message
//! alone: the URL that was tried, the host fields that failed to match, the
//! expected and computed digests.

use std::path::PathBuf;

use agentdl_schema::{ChecksumAlgorithm, HostDescriptor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch catalog from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Catalog request to {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to read catalog file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Catalog page has no embedded data element (<script id=\"__NEXT_DATA__\">)")]
    MissingDataElement,

    #[error("Catalog data is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Catalog data has no product table at {0}")]
    MissingProducts(&'static str),

    #[error("No product matching '{prefix}' in catalog; available: [{}]", .available.join(", "))]
    ProductNotFound {
        prefix: String,
        available: Vec<String>,
    },

    #[error("Product '{0}' has no downloads list")]
    MissingDownloads(String),
}

#[derive(Error, Debug)]
pub enum UnsupportedHostError {
    #[error("Unsupported distribution '{id}' (ID_LIKE: [{}]); no known package family", .id_like.join(", "))]
    UnknownDistribution { id: String, id_like: Vec<String> },

    #[error("Unsupported architecture '{0}'")]
    UnknownArchitecture(String),

    #[error("Unreadable version '{version}' for distribution '{distribution}'")]
    InvalidVersion {
        distribution: String,
        version: String,
    },

    #[error("Host fact '{0}' is not available; pass it explicitly")]
    MissingFact(&'static str),

    #[error("Failed to read {}: {source}", .path.display())]
    OsRelease {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// No catalog entry fits the host.
///
/// `unmatched` names the host descriptor field whose filter left no
/// candidates; `options` lists every `os/arch` pair the catalog offers.
#[derive(Error, Debug)]
#[error(
    "No package for {} {} {} (unmatched: {unmatched}); options are [{}]",
    .host.os_family,
    .host.os_version,
    .host.architecture,
    .options.join(", ")
)]
pub struct NoMatchError {
    pub host: HostDescriptor,
    pub unmatched: &'static str,
    pub options: Vec<String>,
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error downloading {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("IO error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Truncated download of {url}: expected {expected} bytes, received {received}")]
    Truncated {
        url: String,
        expected: u64,
        received: u64,
    },

    #[error("Refusing to write outside the download directory: '{0}'")]
    InvalidFilename(String),
}

#[derive(Error, Debug)]
#[error(
    "Checksum mismatch for {}: expected {algorithm}:{expected}, got {algorithm}:{actual} (file removed)",
    .path.display()
)]
pub struct ChecksumMismatchError {
    pub path: PathBuf,
    pub algorithm: ChecksumAlgorithm,
    pub expected: String,
    pub actual: String,
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error(transparent)]
    Mismatch(#[from] ChecksumMismatchError),

    #[error("Failed to read {} for hashing: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("download_directory is required unless lookup_only is set")]
    MissingDownloadDirectory,
}

/// Any failure of a resolution. Each variant aborts the invocation.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    UnsupportedHost(#[from] UnsupportedHostError),

    #[error(transparent)]
    NoMatch(#[from] NoMatchError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    ChecksumMismatch(#[from] ChecksumMismatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<VerifyError> for ResolveError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Mismatch(mismatch) => Self::ChecksumMismatch(mismatch),
            VerifyError::Io { path, source } => {
                Self::Download(DownloadError::Io { path, source })
            }
        }
    }
}
