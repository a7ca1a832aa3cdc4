//! IO modules - side effects (network, filesystem)

pub mod checksum;
pub mod download;

pub use checksum::{compute_digest, verify};
pub use download::{DownloadOutcome, download};
