//! agentdl - security agent package resolver CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agentdl_cli::cmd;
use agentdl_cli::cmd::resolve::ResolveFlags;
use agentdl_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v; stdout is reserved for results
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Resolve {
            download_dir,
            no_checksum,
            lookup_only,
            timeout,
            catalog,
            host,
        } => {
            let flags = ResolveFlags {
                download_dir,
                no_checksum,
                lookup_only,
                timeout,
            };
            cmd::resolve::resolve(config, flags, &catalog, &host).await
        }
        Commands::List { json, catalog } => cmd::list::list(config, &catalog, json).await,
        Commands::Host { host } => cmd::host::host(config, &host),
    }
}
