use std::path::Path;

use agentdl_core::Resolver;
use agentdl_schema::PackageRecord;
use anyhow::Result;
use crossterm::style::Stylize;

use super::{load_options, print_json};
use crate::CatalogArgs;

const OS_WIDTH: usize = 14;
const RANGE_WIDTH: usize = 10;
const ARCH_WIDTH: usize = 9;

/// List every catalog record in page order
pub async fn list(config: Option<&Path>, catalog: &CatalogArgs, json: bool) -> Result<()> {
    let mut options = load_options(config)?;
    catalog.apply(&mut options.catalog);

    let resolver = Resolver::new(options)?;
    let catalog = resolver.catalog().await?;

    if json {
        return print_json(&catalog.records());
    }

    if catalog.is_empty() {
        println!("  No packages listed for '{}'.", catalog.product);
        return Ok(());
    }

    let header = format!(
        "  {:<OS_WIDTH$} {:<RANGE_WIDTH$} {:<ARCH_WIDTH$} {:<8} {}",
        "os", "versions", "arch", "digest", "file"
    );
    println!("{}", header.dark_grey());
    for record in &catalog {
        println!("{}", row(record));
    }
    println!(
        "{}",
        format!("  {} packages in {}", catalog.len(), catalog.product).dark_grey()
    );
    Ok(())
}

fn row(record: &PackageRecord) -> String {
    let digest = record
        .expected_checksum
        .as_ref()
        .map_or("-", |c| c.algorithm.as_str());
    format!(
        "  {:<OS_WIDTH$} {:<RANGE_WIDTH$} {:<ARCH_WIDTH$} {:<8} {}",
        record.os_tag,
        record.os_version_range.to_string(),
        record.architecture.to_string(),
        digest,
        record.filename
    )
}
