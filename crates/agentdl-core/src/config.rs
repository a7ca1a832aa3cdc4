//! Invocation options.
//!
//! Options come from an optional TOML file and are then overridden field by
//! field by the caller (the CLI applies its flags on top). Every field has a
//! default except `download_directory`, which is required unless the run is
//! lookup-only.
//!
//! ```toml
//! download_directory = "/var/tmp/agent"
//! perform_checksum = true
//! timeout_secs = 60
//!
//! [catalog]
//! product = "nessus-agents"
//!
//! [host]
//! arch = "x86_64"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Vendor page the catalog is scraped from.
pub const DEFAULT_CATALOG_URL: &str =
    "https://www.tenable.com/downloads/nessus-agents?loginAttempted=true";

/// Download endpoint; `{page}` and `{id}` are substituted per entry.
pub const DEFAULT_DOWNLOAD_URL_TEMPLATE: &str = "https://www.tenable.com/downloads/api/v1/public/pages/{page}/downloads/{id}/download?i_agree_to_tenable_license_agreement=true";

/// Product key prefix selected from the catalog.
pub const DEFAULT_PRODUCT: &str = "nessus-agents";

/// Page slug used in download URLs.
pub const DEFAULT_PAGE: &str = "nessus-agents";

/// Applied to both the catalog fetch and the artifact download.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Where the artifact is written. Required unless `lookup_only`.
    pub download_directory: Option<PathBuf>,
    /// When false the checksum stage is skipped entirely.
    pub perform_checksum: bool,
    /// Stop after matching; report the remote URL.
    pub lookup_only: bool,
    pub timeout_secs: u64,
    pub catalog: CatalogConfig,
    pub host: HostOverrides,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            download_directory: None,
            perform_checksum: true,
            lookup_only: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            catalog: CatalogConfig::default(),
            host: HostOverrides::default(),
        }
    }
}

impl ResolveOptions {
    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the user config file if one exists, otherwise the defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match crate::paths::config_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check cross-field requirements before any network traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.lookup_only && self.download_directory.is_none() {
            return Err(ConfigError::MissingDownloadDirectory);
        }
        Ok(())
    }
}

/// Where the catalog comes from and how its entries turn into URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub url: String,
    /// Read a saved copy of the page instead of fetching `url`.
    pub file: Option<PathBuf>,
    pub download_url_template: String,
    pub product: String,
    pub page: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            file: None,
            download_url_template: DEFAULT_DOWNLOAD_URL_TEMPLATE.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            page: DEFAULT_PAGE.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Download URL for a vendor entry id.
    pub fn download_url(&self, id: u64) -> String {
        self.download_url_template
            .replace("{page}", &self.page)
            .replace("{id}", &id.to_string())
    }
}

/// Host facts supplied explicitly instead of detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOverrides {
    /// Distribution identifier (`rocky`, `ubuntu`, ...).
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub arch: Option<String>,
}
