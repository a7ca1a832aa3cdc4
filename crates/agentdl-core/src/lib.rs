pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod io;
pub mod matcher;
pub mod paths;
pub mod pipeline;

pub use catalog::{Catalog, CatalogSource, FileCatalogSource, HttpCatalogSource, parse_catalog};
pub use config::{CatalogConfig, HostOverrides, ResolveOptions};
pub use error::*;
pub use pipeline::{Resolver, assemble};

/// User Agent string for catalog and download requests
pub const USER_AGENT: &str = concat!("agentdl/", env!("CARGO_PKG_VERSION"));
