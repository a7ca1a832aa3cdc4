//! Resolution pipeline: fetch, parse, match, download, verify, assemble.
//!
//! Stages run strictly in sequence and each consumes only the output of the
//! one before it. Nothing is shared between invocations.

use agentdl_schema::{ChecksumStatus, HostDescriptor, PackageRecord, ResolutionResult};
use reqwest::Client;

use crate::catalog::{Catalog, CatalogSource, FileCatalogSource, HttpCatalogSource, parse_catalog};
use crate::config::ResolveOptions;
use crate::error::{ConfigError, FetchError, ResolveError};
use crate::host::describe_host;
use crate::io::{download, verify};
use crate::matcher::select;

/// Runs resolutions for one set of options.
pub struct Resolver {
    client: Client,
    source: Box<dyn CatalogSource>,
    options: ResolveOptions,
}

impl Resolver {
    /// Build the HTTP client and pick the catalog source.
    ///
    /// A configured catalog file takes precedence over the catalog URL.
    pub fn new(options: ResolveOptions) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(options.timeout())
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        let source: Box<dyn CatalogSource> = match &options.catalog.file {
            Some(path) => Box::new(FileCatalogSource::new(path)),
            None => Box::new(HttpCatalogSource::new(client.clone(), &options.catalog.url)),
        };

        Ok(Self {
            client,
            source,
            options,
        })
    }

    /// Replace the catalog source.
    pub fn with_source(mut self, source: impl CatalogSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Fetch and parse the catalog.
    pub async fn catalog(&self) -> Result<Catalog, ResolveError> {
        tracing::debug!("Reading catalog from {}", self.source.location());
        let markup = self.source.fetch().await?;
        Ok(parse_catalog(&markup, &self.options.catalog)?)
    }

    /// Describe the host from detected facts and configured overrides.
    pub fn host(&self) -> Result<HostDescriptor, ResolveError> {
        Ok(describe_host(&self.options.host)?)
    }

    /// Run the whole pipeline for the local (or overridden) host.
    pub async fn resolve(&self) -> Result<ResolutionResult, ResolveError> {
        let host = self.host()?;
        self.resolve_for(&host).await
    }

    /// Run the whole pipeline for an already built host descriptor.
    pub async fn resolve_for(&self, host: &HostDescriptor) -> Result<ResolutionResult, ResolveError> {
        self.options.validate()?;

        let catalog = self.catalog().await?;
        let record = select(&catalog, host)?;

        if self.options.lookup_only {
            tracing::info!("Lookup only; not downloading {}", record.url);
            return Ok(assemble(
                record,
                host,
                record.url.clone(),
                false,
                ChecksumStatus::Unavailable,
                true,
            ));
        }

        let dest_dir = self
            .options
            .download_directory
            .as_deref()
            .ok_or(ConfigError::MissingDownloadDirectory)?;
        let outcome = download(&self.client, record, dest_dir).await?;
        let status = verify(
            &outcome.path,
            record.expected_checksum.as_ref(),
            self.options.perform_checksum,
        )
        .await?;

        Ok(assemble(
            record,
            host,
            outcome.path.display().to_string(),
            outcome.changed,
            status,
            false,
        ))
    }
}

/// Merge stage outputs into the result object.
pub fn assemble(
    record: &PackageRecord,
    host: &HostDescriptor,
    package_uri: String,
    changed: bool,
    checksum_status: ChecksumStatus,
    lookup_only: bool,
) -> ResolutionResult {
    ResolutionResult {
        package_uri,
        changed,
        system_info: host.clone(),
        checksum_status,
        package: record.clone(),
        lookup_only,
    }
}
