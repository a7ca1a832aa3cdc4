//! Operating-system versions and the ranges catalog entries target.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced while reading version strings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string has no leading numeric component.
    #[error("Invalid OS version '{0}': expected a leading number")]
    NotNumeric(String),
}

/// A distribution release number, `major[.minor]`.
///
/// Anything after the minor component (`7.9.2009`, `15-SP4`) is ignored; the
/// matcher never looks deeper than the minor number. A missing minor compares
/// equal to `.0`.
#[derive(Debug, Clone, Copy)]
pub struct OsVersion {
    /// Major release number.
    pub major: u64,
    /// Minor release number, when the source spelled one.
    pub minor: Option<u64>,
    /// Digits the minor was written with, so `22.04` prints back as `22.04`.
    minor_width: usize,
}

impl OsVersion {
    /// Build a version from its parts.
    pub fn new(major: u64, minor: Option<u64>) -> Self {
        Self {
            major,
            minor,
            minor_width: 1,
        }
    }

    /// Build a version whose minor is printed zero-padded to `width` digits.
    pub fn with_minor_width(major: u64, minor: u64, width: usize) -> Self {
        Self {
            major,
            minor: Some(minor),
            minor_width: width,
        }
    }

    /// Parse a release string such as `22.04`, `8`, or `15-SP4`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::NotNumeric`] when the string does not start
    /// with a digit.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = s.trim().trim_matches('"');
        let major_digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
        let major = major_digits
            .parse()
            .map_err(|_| VersionError::NotNumeric(s.to_string()))?;

        let rest = &trimmed[major_digits.len()..];
        let minor_digits: String = rest
            .strip_prefix('.')
            .map(|r| r.chars().take_while(char::is_ascii_digit).collect())
            .unwrap_or_default();

        match minor_digits.parse() {
            Ok(minor) => Ok(Self::with_minor_width(major, minor, minor_digits.len())),
            Err(_) => Ok(Self::new(major, None)),
        }
    }

    fn key(self) -> (u64, u64) {
        (self.major, self.minor.unwrap_or(0))
    }
}

impl PartialEq for OsVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OsVersion {}

impl PartialOrd for OsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::fmt::Display for OsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{minor:0width$}", self.major, width = self.minor_width),
            None => write!(f, "{}", self.major),
        }
    }
}

impl std::str::FromStr for OsVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for OsVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OsVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// The set of OS releases a catalog entry is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "version", rename_all = "lowercase")]
pub enum VersionRange {
    /// No version constraint published.
    #[default]
    Any,
    /// Exactly this major release (`el8` serves 8.x only).
    Major(u64),
    /// This release and every later one (`ubuntu1404` serves 14.04+).
    Since(OsVersion),
}

impl VersionRange {
    /// Check whether `version` falls inside the range.
    pub fn contains(&self, version: &OsVersion) -> bool {
        match self {
            Self::Any => true,
            Self::Major(major) => version.major == *major,
            Self::Since(floor) => version >= floor,
        }
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Major(major) => write!(f, "{major}.x"),
            Self::Since(floor) => write!(f, ">={floor}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_release_strings() {
        assert_eq!(OsVersion::parse("22.04").unwrap(), OsVersion::new(22, Some(4)));
        assert_eq!(OsVersion::parse("8").unwrap(), OsVersion::new(8, None));
        assert_eq!(OsVersion::parse("\"9.3\"").unwrap(), OsVersion::new(9, Some(3)));
        assert_eq!(OsVersion::parse("7.9.2009").unwrap(), OsVersion::new(7, Some(9)));
        assert_eq!(OsVersion::parse("15-SP4").unwrap(), OsVersion::new(15, None));
        assert!(OsVersion::parse("rolling").is_err());
        assert!(OsVersion::parse("").is_err());
    }

    #[test]
    fn missing_minor_equals_zero() {
        assert_eq!(OsVersion::new(8, None), OsVersion::new(8, Some(0)));
        assert!(OsVersion::new(14, None) < OsVersion::new(14, Some(4)));
    }

    #[test]
    fn ranges_contain_expected_versions() {
        let v = OsVersion::parse("22.04").unwrap();
        assert!(VersionRange::Any.contains(&v));
        assert!(VersionRange::Major(22).contains(&v));
        assert!(!VersionRange::Major(20).contains(&v));
        assert!(VersionRange::Since(OsVersion::new(14, Some(4))).contains(&v));
        assert!(!VersionRange::Since(OsVersion::new(24, Some(4))).contains(&v));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(OsVersion::parse("22.04").unwrap().to_string(), "22.04");
        assert_eq!(OsVersion::parse("8.6").unwrap().to_string(), "8.6");
        assert_eq!(VersionRange::Major(8).to_string(), "8.x");
        assert_eq!(
            VersionRange::Since(OsVersion::with_minor_width(14, 4, 2)).to_string(),
            ">=14.04"
        );
    }
}
