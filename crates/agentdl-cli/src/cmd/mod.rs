//! Subcommand implementations

pub mod host;
pub mod list;
pub mod resolve;

use std::path::Path;

use agentdl_core::{CatalogConfig, HostOverrides, ResolveOptions};
use anyhow::{Context, Result};

use crate::{CatalogArgs, HostArgs};

/// Options from `--config`, else the default config file, else defaults.
pub fn load_options(config: Option<&Path>) -> Result<ResolveOptions> {
    match config {
        Some(path) => ResolveOptions::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => ResolveOptions::load_default().context("Failed to load default config"),
    }
}

impl CatalogArgs {
    /// Overlay the flags that were given onto `catalog`.
    pub fn apply(&self, catalog: &mut CatalogConfig) {
        if let Some(url) = &self.catalog_url {
            catalog.url.clone_from(url);
            catalog.file = None;
        }
        if let Some(file) = &self.catalog_file {
            catalog.file = Some(file.clone());
        }
        if let Some(product) = &self.product {
            catalog.product.clone_from(product);
        }
    }
}

impl HostArgs {
    /// Overlay the flags that were given onto `overrides`.
    pub fn apply(&self, overrides: &mut HostOverrides) {
        if self.os.is_some() {
            overrides.os.clone_from(&self.os);
        }
        if self.os_version.is_some() {
            overrides.os_version.clone_from(&self.os_version);
        }
        if self.arch.is_some() {
            overrides.arch.clone_from(&self.arch);
        }
    }
}

/// Write `value` to stdout as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
