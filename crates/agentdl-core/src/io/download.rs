//! Artifact download.
//!
//! Streams the selected package into the download directory. A file that is
//! already there with the advertised size is left alone, which makes repeated
//! runs against the same directory report `changed = false`.

use std::path::{Path, PathBuf};

use agentdl_schema::PackageRecord;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, USER_AGENT};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::paths::is_plain_filename;

/// What the download stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Where the artifact now lives.
    pub path: PathBuf,
    /// True iff bytes were written during this call.
    pub changed: bool,
    /// Size of the artifact on disk.
    pub bytes: u64,
}

/// Download `record` into `dest_dir/record.filename`.
///
/// # Errors
///
/// Returns [`DownloadError`] on transport failure, a non-success status,
/// a local write failure, or a body shorter than advertised. A partially
/// written file is left in place.
pub async fn download(
    client: &Client,
    record: &PackageRecord,
    dest_dir: &Path,
) -> Result<DownloadOutcome, DownloadError> {
    if !is_plain_filename(&record.filename) {
        return Err(DownloadError::InvalidFilename(record.filename.clone()));
    }
    let dest = dest_dir.join(&record.filename);
    let url = record.url.as_str();

    let advertised = match record.size {
        Some(size) => Some(size),
        None => head_length(client, url).await?,
    };

    if let Some(expected) = advertised {
        let existing = tokio::fs::metadata(&dest).await.ok();
        if existing.is_some_and(|meta| meta.is_file() && meta.len() == expected) {
            tracing::info!("{} already present ({expected} bytes)", dest.display());
            return Ok(DownloadOutcome {
                path: dest,
                changed: false,
                bytes: expected,
            });
        }
    }

    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|source| DownloadError::Io {
            path: dest_dir.to_path_buf(),
            source,
        })?;

    tracing::info!("Downloading {url} to {}", dest.display());
    let http_err = |source: reqwest::Error| DownloadError::Http {
        url: url.to_string(),
        source,
    };
    let io_err = |source: std::io::Error| DownloadError::Io {
        path: dest.clone(),
        source,
    };

    let response = client
        .get(url)
        .header(USER_AGENT, crate::USER_AGENT)
        .send()
        .await
        .map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status,
        });
    }
    // The body must reach both the server's length and the published size
    let expected = response.content_length().max(advertised);

    let mut file = File::create(&dest).await.map_err(io_err)?;
    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(http_err)?;
        file.write_all(&chunk).await.map_err(io_err)?;
        received += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;

    if let Some(expected) = expected.filter(|&expected| received < expected) {
        return Err(DownloadError::Truncated {
            url: url.to_string(),
            expected,
            received,
        });
    }

    tracing::debug!("Wrote {received} bytes to {}", dest.display());
    Ok(DownloadOutcome {
        path: dest,
        changed: true,
        bytes: received,
    })
}

/// Size the server reports for `url`, if it reports one.
///
/// A refused HEAD only means the size is unknown; transport failures are
/// errors.
async fn head_length(client: &Client, url: &str) -> Result<Option<u64>, DownloadError> {
    let resp = client
        .head(url)
        .header(USER_AGENT, crate::USER_AGENT)
        .send()
        .await
        .map_err(|source| DownloadError::Http {
            url: url.to_string(),
            source,
        })?;

    if !resp.status().is_success() {
        tracing::debug!("HEAD {url} returned {}; size unknown", resp.status());
        return Ok(None);
    }
    Ok(resp
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok()))
}
