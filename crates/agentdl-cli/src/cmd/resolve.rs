use std::path::{Path, PathBuf};

use agentdl_core::Resolver;
use anyhow::{Context, Result};

use super::{load_options, print_json};
use crate::{CatalogArgs, HostArgs};

/// Flags of `agentdl resolve`.
#[derive(Debug, Clone, Default)]
pub struct ResolveFlags {
    pub download_dir: Option<PathBuf>,
    pub no_checksum: bool,
    pub lookup_only: bool,
    pub timeout: Option<u64>,
}

/// Run the full pipeline and print the resolution result
pub async fn resolve(
    config: Option<&Path>,
    flags: ResolveFlags,
    catalog: &CatalogArgs,
    host: &HostArgs,
) -> Result<()> {
    let mut options = load_options(config)?;
    if flags.download_dir.is_some() {
        options.download_directory = flags.download_dir;
    }
    if flags.no_checksum {
        options.perform_checksum = false;
    }
    if flags.lookup_only {
        options.lookup_only = true;
    }
    if let Some(secs) = flags.timeout {
        options.timeout_secs = secs;
    }
    catalog.apply(&mut options.catalog);
    host.apply(&mut options.host);

    let resolver = Resolver::new(options)?;
    let result = resolver
        .resolve()
        .await
        .context("Package resolution failed")?;

    tracing::info!(
        changed = result.changed,
        checksum = %result.checksum_status,
        "Resolved {}",
        result.package_uri
    );
    print_json(&result)
}
