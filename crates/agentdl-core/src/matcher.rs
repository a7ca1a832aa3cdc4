//! Matcher: selects exactly one catalog record for a host.
//!
//! Candidates pass through [`FILTERS`] in order; the survivors are ordered by
//! [`RANKING`], one comparator at a time, and the best one wins. Records that
//! are still tied after every rule are decided by catalog order. That last
//! step is an arbitrary but stable choice; it does not assume the vendor
//! orders its page by preference.

use std::cmp::Ordering;

use agentdl_schema::{HostDescriptor, PackageRecord, VersionRange};

use crate::catalog::Catalog;
use crate::error::NoMatchError;

type Filter = fn(&PackageRecord, &HostDescriptor) -> bool;

/// A ranking rule. `Less` means the first record is preferred.
pub type RankRule = fn(&PackageRecord, &PackageRecord, &HostDescriptor) -> Ordering;

/// Compatibility filters, keyed by the host field they test.
const FILTERS: &[(&str, Filter)] = &[
    ("os_family", family_admits),
    ("architecture", architecture_admits),
    ("os_version", version_admits),
];

/// Preference rules, most significant first.
pub const RANKING: &[(&str, RankRule)] = &[
    ("exact_architecture", exact_architecture),
    ("version_specificity", version_specificity),
    ("exact_family", exact_family),
];

fn family_admits(record: &PackageRecord, host: &HostDescriptor) -> bool {
    record.os_family.admits(&host.os_family)
}

fn architecture_admits(record: &PackageRecord, host: &HostDescriptor) -> bool {
    record.architecture.admits(&host.architecture)
}

fn version_admits(record: &PackageRecord, host: &HostDescriptor) -> bool {
    record.os_version_range.contains(&host.os_version)
}

fn exact_architecture(a: &PackageRecord, b: &PackageRecord, host: &HostDescriptor) -> Ordering {
    let a = a.architecture.is_exactly(&host.architecture);
    let b = b.architecture.is_exactly(&host.architecture);
    b.cmp(&a)
}

/// Exact major beats an open-ended range, which beats no range at all.
/// Between two open-ended ranges the higher floor is the closer build.
fn version_specificity(a: &PackageRecord, b: &PackageRecord, _host: &HostDescriptor) -> Ordering {
    use VersionRange::{Any, Major, Since};
    match (a.os_version_range, b.os_version_range) {
        (Major(_), Major(_)) | (Any, Any) => Ordering::Equal,
        (Major(_), _) | (Since(_), Any) => Ordering::Less,
        (_, Major(_)) | (Any, Since(_)) => Ordering::Greater,
        (Since(x), Since(y)) => y.cmp(&x),
    }
}

fn exact_family(a: &PackageRecord, b: &PackageRecord, host: &HostDescriptor) -> Ordering {
    let a = a.os_family.is_exactly(&host.os_family);
    let b = b.os_family.is_exactly(&host.os_family);
    b.cmp(&a)
}

/// Apply [`RANKING`] in order; the first rule that separates the records
/// decides.
pub fn compare(a: &PackageRecord, b: &PackageRecord, host: &HostDescriptor) -> Ordering {
    RANKING
        .iter()
        .map(|(_, rule)| rule(a, b, host))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Every record compatible with `host`, in catalog order.
///
/// # Errors
///
/// Returns [`NoMatchError`] naming the first filter that left nothing.
pub fn candidates<'c>(
    catalog: &'c Catalog,
    host: &HostDescriptor,
) -> Result<Vec<&'c PackageRecord>, NoMatchError> {
    let mut remaining: Vec<&PackageRecord> = catalog.iter().collect();
    for (field, admits) in FILTERS {
        remaining.retain(|record| admits(record, host));
        tracing::debug!(filter = *field, remaining = remaining.len(), "Applied filter");
        if remaining.is_empty() {
            return Err(NoMatchError {
                host: host.clone(),
                unmatched: *field,
                options: catalog.options(),
            });
        }
    }
    Ok(remaining)
}

/// Pick the single best record for `host`.
///
/// # Errors
///
/// Returns [`NoMatchError`] when no record passes every filter.
pub fn select<'c>(
    catalog: &'c Catalog,
    host: &HostDescriptor,
) -> Result<&'c PackageRecord, NoMatchError> {
    let remaining = candidates(catalog, host)?;
    let total = remaining.len();
    // min_by keeps the earliest of equal elements
    let chosen = remaining
        .into_iter()
        .min_by(|a, b| compare(a, b, host))
        .ok_or_else(|| NoMatchError {
            host: host.clone(),
            unmatched: "os_version",
            options: catalog.options(),
        })?;

    tracing::info!(
        filename = %chosen.filename,
        os = %chosen.os_tag,
        arch = %chosen.architecture,
        candidates = total,
        "Selected package"
    );
    Ok(chosen)
}
