//! Operating-system family vocabulary and the distribution lookup tables.
//!
//! Vendors build one package per binary-compatible family, so every
//! distribution a host may report is reduced to one of the [`OsFamily`]
//! variants through [`DISTRIBUTION_FAMILIES`]. New distributions are added by
//! extending the table; matching logic never names a distribution.

use crate::version::OsVersion;

/// A family of binary-compatible operating systems.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Red Hat Enterprise Linux and its rebuilds (RPM-based).
    El,
    /// Amazon Linux (RPM-based).
    Amzn,
    /// Fedora (RPM-based).
    Fedora,
    /// SUSE Linux Enterprise and openSUSE (RPM-based).
    Suse,
    /// Debian and derivatives that track it directly.
    Debian,
    /// Ubuntu and derivatives that track it.
    Ubuntu,
    /// Apple macOS.
    Darwin,
    /// Microsoft Windows.
    Windows,
}

impl OsFamily {
    /// Every family in the vocabulary.
    pub const ALL: [Self; 8] = [
        Self::El,
        Self::Amzn,
        Self::Fedora,
        Self::Suse,
        Self::Debian,
        Self::Ubuntu,
        Self::Darwin,
        Self::Windows,
    ];

    /// Short tag, as used in vendor package names (`el8`, `ubuntu1404`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::El => "el",
            Self::Amzn => "amzn",
            Self::Fedora => "fedora",
            Self::Suse => "suse",
            Self::Debian => "debian",
            Self::Ubuntu => "ubuntu",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    /// Look a distribution identifier up in [`DISTRIBUTION_FAMILIES`].
    ///
    /// Matching is case-insensitive and ignores surrounding quotes, so raw
    /// `/etc/os-release` values can be passed straight through.
    pub fn for_distribution(name: &str) -> Option<Self> {
        let needle = name.trim().trim_matches('"').to_ascii_lowercase();
        DISTRIBUTION_FAMILIES
            .iter()
            .find(|(_, aliases)| aliases.contains(&needle.as_str()))
            .map(|(family, _)| *family)
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OsFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == lower)
            .or_else(|| Self::for_distribution(&lower))
            .ok_or_else(|| format!("Unknown OS family: {s}"))
    }
}

/// Distribution identifiers (`/etc/os-release` `ID` values and common
/// marketing names) grouped by the family whose packages they run.
pub const DISTRIBUTION_FAMILIES: &[(OsFamily, &[&str])] = &[
    (
        OsFamily::El,
        &[
            "el",
            "rhel",
            "redhat",
            "centos",
            "scientific",
            "slc",
            "ascendos",
            "cloudlinux",
            "psbm",
            "ol",
            "oraclelinux",
            "ovs",
            "oel",
            "virtuozzo",
            "xenserver",
            "alibaba",
            "alinux",
            "euleros",
            "openeuler",
            "almalinux",
            "rocky",
            "tencentos",
            "eurolinux",
            "kylin linux advanced server",
            "miracle",
            "miraclelinux",
        ],
    ),
    (OsFamily::Amzn, &["amzn", "amazon"]),
    (OsFamily::Fedora, &["fedora", "fc"]),
    (
        OsFamily::Suse,
        &[
            "suse",
            "sles",
            "sled",
            "sles_sap",
            "suse_linux",
            "opensuse",
            "opensuse-leap",
            "opensuse leap",
            "opensuse-tumbleweed",
            "opensuse tumbleweed",
            "alp-dolomite",
        ],
    ),
    (OsFamily::Debian, &["debian", "devuan", "kali", "raspberrypios"]),
    (
        OsFamily::Ubuntu,
        &[
            "ubuntu",
            "raspbian",
            "neon",
            "kde neon",
            "linuxmint",
            "linux mint",
            "steamos",
            "cumulus linux",
            "pop",
            "pop!_os",
            "parrot",
            "pardus gnu/linux",
            "uos",
            "deepin",
            "osmc",
        ],
    ),
    (OsFamily::Darwin, &["darwin", "macos", "macosx", "osx"]),
    (OsFamily::Windows, &["windows", "win"]),
];

/// The native package manager a host installs vendor packages with.
///
/// Informational only: the matcher ignores it, the orchestrator uses it to
/// pick its install step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// `dnf` (RHEL 8+, Fedora, Amazon Linux 2023).
    Dnf,
    /// `yum` (RHEL 7 and older, Amazon Linux 2).
    Yum,
    /// `apt` (Debian, Ubuntu).
    Apt,
    /// `zypper` (SUSE).
    Zypper,
    /// macOS `installer`.
    Installer,
    /// Windows `msiexec`.
    Msiexec,
}

impl PackageManager {
    /// Pick the package manager for a family and release.
    pub fn for_host(family: OsFamily, version: &OsVersion) -> Self {
        match family {
            OsFamily::El if version.major >= 8 => Self::Dnf,
            OsFamily::El => Self::Yum,
            OsFamily::Amzn if version.major >= 2022 => Self::Dnf,
            OsFamily::Amzn => Self::Yum,
            OsFamily::Fedora => Self::Dnf,
            OsFamily::Suse => Self::Zypper,
            OsFamily::Debian | OsFamily::Ubuntu => Self::Apt,
            OsFamily::Darwin => Self::Installer,
            OsFamily::Windows => Self::Msiexec,
        }
    }

    /// Command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Apt => "apt",
            Self::Zypper => "zypper",
            Self::Installer => "installer",
            Self::Msiexec => "msiexec",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuilds_map_to_their_upstream_family() {
        assert_eq!(OsFamily::for_distribution("rocky"), Some(OsFamily::El));
        assert_eq!(OsFamily::for_distribution("\"AlmaLinux\""), Some(OsFamily::El));
        assert_eq!(OsFamily::for_distribution("linuxmint"), Some(OsFamily::Ubuntu));
        assert_eq!(OsFamily::for_distribution("kali"), Some(OsFamily::Debian));
        assert_eq!(OsFamily::for_distribution("opensuse-leap"), Some(OsFamily::Suse));
        assert_eq!(OsFamily::for_distribution("amzn"), Some(OsFamily::Amzn));
        assert_eq!(OsFamily::for_distribution("gentoo"), None);
    }

    #[test]
    fn every_alias_belongs_to_exactly_one_family() {
        let mut seen = std::collections::HashSet::new();
        for (_, aliases) in DISTRIBUTION_FAMILIES {
            for alias in *aliases {
                assert!(seen.insert(*alias), "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn package_manager_follows_release() {
        let v7 = OsVersion::new(7, Some(9));
        let v9 = OsVersion::new(9, Some(3));
        assert_eq!(PackageManager::for_host(OsFamily::El, &v7), PackageManager::Yum);
        assert_eq!(PackageManager::for_host(OsFamily::El, &v9), PackageManager::Dnf);
        assert_eq!(
            PackageManager::for_host(OsFamily::Amzn, &OsVersion::new(2, None)),
            PackageManager::Yum
        );
        assert_eq!(
            PackageManager::for_host(OsFamily::Amzn, &OsVersion::new(2023, None)),
            PackageManager::Dnf
        );
        assert_eq!(
            PackageManager::for_host(OsFamily::Ubuntu, &OsVersion::new(22, Some(4))),
            PackageManager::Apt
        );
    }

    #[test]
    fn family_parses_from_tag_or_distribution() {
        assert_eq!("el".parse::<OsFamily>(), Ok(OsFamily::El));
        assert_eq!("centos".parse::<OsFamily>(), Ok(OsFamily::El));
        assert!("plan9".parse::<OsFamily>().is_err());
    }
}
