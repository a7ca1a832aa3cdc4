//! Package records, host descriptors and resolution results.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::arch::Arch;
use crate::checksum::Checksum;
use crate::family::{OsFamily, PackageManager};
use crate::version::{OsVersion, VersionRange};

/// What a catalog entry says it targets along one axis (OS family or
/// architecture).
///
/// Serialized as a bare string: `"any"`, the canonical vocabulary tag, or the
/// vendor's raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Target<T> {
    /// Published as suitable for every value.
    #[default]
    Any,
    /// A value from the closed vocabulary.
    Exact(T),
    /// A vendor tag outside the vocabulary. Kept so the entry is visible in
    /// listings, but it never matches a host.
    Unrecognized(String),
}

impl<T: PartialEq> Target<T> {
    /// Whether a host with value `host` can use this entry.
    pub fn admits(&self, host: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(value) => value == host,
            Self::Unrecognized(_) => false,
        }
    }

    /// Whether this is an exact match for `host` (as opposed to `Any`).
    pub fn is_exactly(&self, host: &T) -> bool {
        matches!(self, Self::Exact(value) if value == host)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Target<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Exact(value) => write!(f, "{value}"),
            Self::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}

impl<T: std::fmt::Display> Serialize for Target<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: std::str::FromStr> Deserialize<'de> for Target<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }
        Ok(s.parse().map_or(Self::Unrecognized(s), Self::Exact))
    }
}

/// One downloadable artifact advertised by the vendor catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Vendor identifier of the download, when published.
    pub id: Option<u64>,
    /// Catalog product key the entry was listed under.
    pub product: String,
    /// Product release the artifact belongs to (e.g. `10.6.1`).
    pub version: Option<String>,
    /// Vendor OS tag as published (e.g. `el8`, `ubuntu1404`).
    pub os_tag: String,
    /// Operating-system family the artifact is built for.
    pub os_family: Target<OsFamily>,
    /// Releases of that family the artifact supports.
    pub os_version_range: VersionRange,
    /// CPU architecture the artifact is built for.
    pub architecture: Target<Arch>,
    /// Absolute download location. Never empty.
    pub url: String,
    /// Digest published by the vendor.
    pub expected_checksum: Option<Checksum>,
    /// Local file name the artifact is stored under.
    pub filename: String,
    /// Advertised size in bytes.
    pub size: Option<u64>,
    /// Human-readable description from the catalog.
    pub description: Option<String>,
}

/// The normalized platform of the host a package is resolved for.
///
/// Built once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    /// Raw distribution identifier the family was derived from.
    pub distribution: String,
    /// Family the host's packages come from.
    pub os_family: OsFamily,
    /// Host release.
    pub os_version: OsVersion,
    /// Host CPU architecture.
    pub architecture: Arch,
    /// Native package manager, for the orchestrator's install step.
    pub package_manager: PackageManager,
}

/// Outcome of the integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumStatus {
    /// Computed digest equals the published one.
    #[serde(rename = "verified")]
    Verified,
    /// Computed digest differs from the published one.
    #[serde(rename = "mismatch")]
    Mismatch,
    /// Check skipped: disabled by the caller or no digest published.
    #[serde(rename = "checksum-unavailable")]
    Unavailable,
}

impl std::fmt::Display for ChecksumStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Verified => "verified",
            Self::Mismatch => "mismatch",
            Self::Unavailable => "checksum-unavailable",
        };
        write!(f, "{s}")
    }
}

/// Everything the orchestrator needs after one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Local path of the downloaded artifact, or its remote URL when nothing
    /// was downloaded.
    pub package_uri: String,
    /// True iff new bytes were written to disk.
    pub changed: bool,
    /// Echo of the host descriptor the package was matched against.
    pub system_info: HostDescriptor,
    /// Integrity check outcome.
    pub checksum_status: ChecksumStatus,
    /// The selected catalog entry.
    pub package: PackageRecord,
    /// Whether the download stage was skipped on request.
    pub lookup_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_admits_any_and_exact_only() {
        let any: Target<Arch> = Target::Any;
        let exact = Target::Exact(Arch::X86_64);
        let opaque: Target<Arch> = Target::Unrecognized("sparc".to_string());

        assert!(any.admits(&Arch::Aarch64));
        assert!(exact.admits(&Arch::X86_64));
        assert!(!exact.admits(&Arch::Aarch64));
        assert!(!opaque.admits(&Arch::X86_64));
        assert!(exact.is_exactly(&Arch::X86_64));
        assert!(!any.is_exactly(&Arch::X86_64));
    }

    #[test]
    fn target_serializes_as_plain_string() {
        let json = serde_json::to_string(&Target::Exact(Arch::Aarch64)).unwrap();
        assert_eq!(json, "\"aarch64\"");

        let back: Target<Arch> = serde_json::from_str("\"amd64\"").unwrap();
        assert_eq!(back, Target::Exact(Arch::X86_64));

        let any: Target<Arch> = serde_json::from_str("\"ANY\"").unwrap();
        assert_eq!(any, Target::Any);

        let opaque: Target<OsFamily> = serde_json::from_str("\"solaris11\"").unwrap();
        assert_eq!(opaque, Target::Unrecognized("solaris11".to_string()));
    }

    #[test]
    fn checksum_status_uses_wire_names() {
        let json = serde_json::to_string(&ChecksumStatus::Unavailable).unwrap();
        assert_eq!(json, "\"checksum-unavailable\"");
        assert_eq!(ChecksumStatus::Verified.to_string(), "verified");
    }
}
