//! Checksum validation of downloaded artifacts.

use std::io::Write;
use std::path::Path;

use agentdl_schema::{Checksum, ChecksumAlgorithm, ChecksumStatus};
use sha2::{Digest, Sha256, Sha512};

use crate::error::{ChecksumMismatchError, VerifyError};

/// Hex digest of the file at `path`.
///
/// Hashing runs on the blocking pool so large artifacts do not stall the
/// runtime.
///
/// # Errors
///
/// Returns the IO error if the file cannot be read.
pub async fn compute_digest(path: &Path, algorithm: ChecksumAlgorithm) -> std::io::Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&path)?;
        match algorithm {
            ChecksumAlgorithm::Sha256 => hash_reader::<Sha256>(file),
            ChecksumAlgorithm::Sha512 => hash_reader::<Sha512>(file),
        }
    })
    .await
    .map_err(std::io::Error::other)?
}

fn hash_reader<D: Digest + Write>(mut reader: impl std::io::Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Check the artifact at `path` against its published digest.
///
/// Skipped (`Unavailable`) when `perform` is false or nothing was published.
/// On mismatch the file is deleted before the error is returned, so a later
/// run cannot mistake it for a good download.
///
/// # Errors
///
/// Returns [`VerifyError::Mismatch`] on a digest mismatch and
/// [`VerifyError::Io`] if the file cannot be read.
pub async fn verify(
    path: &Path,
    expected: Option<&Checksum>,
    perform: bool,
) -> Result<ChecksumStatus, VerifyError> {
    if !perform {
        tracing::debug!("Checksum verification disabled");
        return Ok(ChecksumStatus::Unavailable);
    }
    let Some(expected) = expected else {
        tracing::info!("No published checksum for {}; skipping", path.display());
        return Ok(ChecksumStatus::Unavailable);
    };

    let actual = compute_digest(path, expected.algorithm)
        .await
        .map_err(|source| VerifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    if expected.matches_hex(&actual) {
        tracing::info!("Verified {} ({})", path.display(), expected.algorithm);
        return Ok(ChecksumStatus::Verified);
    }

    remove_untrusted(path).await;
    Err(ChecksumMismatchError {
        path: path.to_path_buf(),
        algorithm: expected.algorithm,
        expected: expected.hex().to_string(),
        actual,
    }
    .into())
}

async fn remove_untrusted(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::warn!("Removed {} after checksum mismatch", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::error!("Failed to remove {}: {e}", path.display()),
    }
}
