//! agentdl - security agent package resolver
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Picks the vendor package that fits a host, downloads it and checks its
//! published digest. Meant to be called once per host by an orchestrator,
//! which reads the JSON result from stdout and runs the install itself.
//!
//! Logs go to stderr (`RUST_LOG` or `-v`), so stdout is always the result.

pub mod cmd;

pub use agentdl_core::USER_AGENT;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "agentdl")]
#[command(author, version, about = "agentdl - resolve, download and verify security agent packages")]
pub struct Cli {
    /// Config file (TOML); defaults to <config dir>/agentdl/config.toml
    #[arg(long, global = true, env = "AGENTDL_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve, download and verify the package for this host
    Resolve {
        /// Directory the package is written to
        #[arg(long, short = 'd', env = "AGENTDL_DOWNLOAD_DIR")]
        download_dir: Option<PathBuf>,
        /// Skip checksum verification
        #[arg(long)]
        no_checksum: bool,
        /// Only report which package would be used
        #[arg(long)]
        lookup_only: bool,
        /// Network timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        #[command(flatten)]
        catalog: CatalogArgs,
        #[command(flatten)]
        host: HostArgs,
    },
    /// List every package in the vendor catalog
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        catalog: CatalogArgs,
    },
    /// Show the host descriptor used for matching
    Host {
        #[command(flatten)]
        host: HostArgs,
    },
}

/// Where the catalog comes from.
#[derive(Debug, Clone, Default, Args)]
pub struct CatalogArgs {
    /// Vendor download page
    #[arg(long, conflicts_with = "catalog_file")]
    pub catalog_url: Option<String>,
    /// Saved copy of the vendor download page
    #[arg(long)]
    pub catalog_file: Option<PathBuf>,
    /// Product key prefix to select from the page
    #[arg(long)]
    pub product: Option<String>,
}

/// Host facts to use instead of the detected ones.
#[derive(Debug, Clone, Default, Args)]
pub struct HostArgs {
    /// Distribution id (rocky, ubuntu, debian, ...)
    #[arg(long)]
    pub os: Option<String>,
    /// Distribution version (8.9, 22.04, ...)
    #[arg(long)]
    pub os_version: Option<String>,
    /// CPU architecture (x86_64, aarch64, ...)
    #[arg(long)]
    pub arch: Option<String>,
}
