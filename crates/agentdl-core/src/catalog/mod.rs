//! Vendor catalog: fetching the download page and turning it into records.

pub mod fetch;
pub mod parse;

pub use fetch::{CatalogSource, FileCatalogSource, HttpCatalogSource};
pub use parse::parse_catalog;

use agentdl_schema::PackageRecord;

/// Every package the vendor advertises, in page order.
///
/// Built fresh for each resolution and never persisted. Order is preserved
/// because the matcher uses it as the final tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Product key the records were read from.
    pub product: String,
    records: Vec<PackageRecord>,
}

impl Catalog {
    pub fn new(product: impl Into<String>, records: Vec<PackageRecord>) -> Self {
        Self {
            product: product.into(),
            records,
        }
    }

    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PackageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `os/arch` pairs on offer, for "no match" diagnostics.
    pub fn options(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| format!("{}/{}", r.os_tag, r.architecture))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a PackageRecord;
    type IntoIter = std::slice::Iter<'a, PackageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
