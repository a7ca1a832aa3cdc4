//! Host descriptor builder.
//!
//! Collects raw platform facts (os-release fields, machine architecture) and
//! reduces them to the vocabulary the matcher speaks. The distribution to
//! family mapping lives in [`agentdl_schema::DISTRIBUTION_FAMILIES`].

use std::path::Path;

use agentdl_schema::{Arch, HostDescriptor, OsFamily, OsVersion, PackageManager};

use crate::config::HostOverrides;
use crate::error::UnsupportedHostError;

const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Raw, unnormalized platform facts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFacts {
    /// `ID` from os-release (or `darwin` / `windows`).
    pub id: Option<String>,
    /// `ID_LIKE` tokens, most specific first.
    pub id_like: Vec<String>,
    /// `NAME` from os-release.
    pub name: Option<String>,
    /// `VERSION_ID` from os-release (or the macOS product version).
    pub version_id: Option<String>,
    /// Machine architecture as reported by the platform.
    pub machine: Option<String>,
}

impl HostFacts {
    /// Detect facts for the running host.
    ///
    /// Missing pieces are left as `None`; [`build_descriptor`] reports them.
    pub fn detect() -> Result<Self, UnsupportedHostError> {
        let mut facts = match std::env::consts::OS {
            "linux" => Self::read_os_release()?,
            "macos" => Self {
                id: Some("darwin".to_string()),
                version_id: macos_product_version(),
                ..Self::default()
            },
            "windows" => Self {
                id: Some("windows".to_string()),
                version_id: windows_product_version(),
                ..Self::default()
            },
            other => Self {
                id: Some(other.to_string()),
                ..Self::default()
            },
        };
        facts.machine = Some(Arch::current().map_or_else(
            || std::env::consts::ARCH.to_string(),
            |arch| arch.as_str().to_string(),
        ));
        tracing::debug!(?facts, "Detected host facts");
        Ok(facts)
    }

    fn read_os_release() -> Result<Self, UnsupportedHostError> {
        let path = OS_RELEASE_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .ok_or(UnsupportedHostError::MissingFact("os-release"))?;
        let contents =
            std::fs::read_to_string(path).map_err(|source| UnsupportedHostError::OsRelease {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_os_release(&contents))
    }

    /// Parse the `KEY=value` lines of an os-release file.
    ///
    /// Unknown keys, comments and malformed lines are ignored.
    pub fn from_os_release(contents: &str) -> Self {
        let mut facts = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value);
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                "ID" => facts.id = Some(value.to_ascii_lowercase()),
                "ID_LIKE" => {
                    facts.id_like = value
                        .split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect();
                }
                "NAME" => facts.name = Some(value),
                "VERSION_ID" => facts.version_id = Some(value),
                _ => {}
            }
        }
        facts
    }

    /// Replace detected facts with explicitly supplied ones.
    pub fn with_overrides(mut self, overrides: &HostOverrides) -> Self {
        if let Some(os) = &overrides.os {
            self.id = Some(os.to_ascii_lowercase());
            // Explicit distribution means the detected lineage no longer applies
            self.id_like.clear();
            self.name = None;
        }
        if let Some(version) = &overrides.os_version {
            self.version_id = Some(version.clone());
        }
        if let Some(arch) = &overrides.arch {
            self.machine = Some(arch.clone());
        }
        self
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    stripped.replace("\\\"", "\"")
}

fn macos_product_version() -> Option<String> {
    let output = std::process::Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn windows_product_version() -> Option<String> {
    let output = std::process::Command::new("cmd")
        .args(["/C", "ver"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    parse_ver_output(&String::from_utf8_lossy(&output.stdout))
}

/// Version from `ver` output (`Microsoft Windows [Version 10.0.19045.3803]`).
///
/// The label inside the brackets is localized, so only the last token is read.
fn parse_ver_output(output: &str) -> Option<String> {
    let (_, bracketed) = output.split_once('[')?;
    let (inner, _) = bracketed.split_once(']')?;
    inner
        .split_whitespace()
        .last()
        .filter(|v| v.starts_with(|c: char| c.is_ascii_digit()))
        .map(ToString::to_string)
}

/// Map a distribution onto its package family.
///
/// Tries `ID`, then `NAME`, then each `ID_LIKE` token, so a rebuild the table
/// does not list still resolves through the distribution it declares
/// compatibility with.
fn resolve_family(facts: &HostFacts) -> Option<OsFamily> {
    let direct = facts
        .id
        .iter()
        .chain(facts.name.iter())
        .find_map(|candidate| OsFamily::for_distribution(candidate));
    if direct.is_some() {
        return direct;
    }

    let like = facts
        .id_like
        .iter()
        .find_map(|candidate| OsFamily::for_distribution(candidate));
    if let Some(family) = like {
        tracing::debug!(
            id = ?facts.id,
            %family,
            "Distribution not listed; using ID_LIKE family"
        );
    }
    like
}

/// Build the canonical host descriptor from raw facts.
///
/// Unknown distributions fall back through `ID_LIKE`; unknown architectures
/// always fail.
pub fn build_descriptor(facts: &HostFacts) -> Result<HostDescriptor, UnsupportedHostError> {
    let machine = facts
        .machine
        .as_deref()
        .ok_or(UnsupportedHostError::MissingFact("architecture"))?;
    let architecture: Arch = machine
        .parse()
        .map_err(|_| UnsupportedHostError::UnknownArchitecture(machine.to_string()))?;

    let id = facts
        .id
        .clone()
        .ok_or(UnsupportedHostError::MissingFact("distribution"))?;
    let os_family =
        resolve_family(facts).ok_or_else(|| UnsupportedHostError::UnknownDistribution {
            id: id.clone(),
            id_like: facts.id_like.clone(),
        })?;

    let raw_version = facts
        .version_id
        .as_deref()
        .ok_or(UnsupportedHostError::MissingFact("os_version"))?;
    let os_version =
        OsVersion::parse(raw_version).map_err(|_| UnsupportedHostError::InvalidVersion {
            distribution: id.clone(),
            version: raw_version.to_string(),
        })?;

    let descriptor = HostDescriptor {
        distribution: id,
        os_family,
        os_version,
        architecture,
        package_manager: PackageManager::for_host(os_family, &os_version),
    };
    tracing::debug!(?descriptor, "Built host descriptor");
    Ok(descriptor)
}

/// Detect the running host, apply overrides, and build its descriptor.
pub fn describe_host(overrides: &HostOverrides) -> Result<HostDescriptor, UnsupportedHostError> {
    let detected = if overrides.os.is_some()
        && overrides.os_version.is_some()
        && overrides.arch.is_some()
    {
        HostFacts::default()
    } else {
        HostFacts::detect()?
    };
    build_descriptor(&detected.with_overrides(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROCKY: &str = r#"NAME="Rocky Linux"
VERSION="9.3 (Blue Onyx)"
ID="rocky"
ID_LIKE="rhel centos fedora"
VERSION_ID="9.3"
PLATFORM_ID="platform:el9"
# comment line
"#;

    const UBUNTU: &str = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nVERSION_ID=\"22.04\"\n";

    fn facts(contents: &str, machine: &str) -> HostFacts {
        HostFacts {
            machine: Some(machine.to_string()),
            ..HostFacts::from_os_release(contents)
        }
    }

    #[test]
    fn parses_os_release_fields() {
        let f = HostFacts::from_os_release(ROCKY);
        assert_eq!(f.id.as_deref(), Some("rocky"));
        assert_eq!(f.id_like, vec!["rhel", "centos", "fedora"]);
        assert_eq!(f.name.as_deref(), Some("Rocky Linux"));
        assert_eq!(f.version_id.as_deref(), Some("9.3"));
    }

    #[test]
    fn builds_descriptor_for_rebuild_distribution() {
        let host = build_descriptor(&facts(ROCKY, "x86_64")).unwrap();
        assert_eq!(host.os_family, OsFamily::El);
        assert_eq!(host.os_version, OsVersion::new(9, Some(3)));
        assert_eq!(host.architecture, Arch::X86_64);
        assert_eq!(host.package_manager, PackageManager::Dnf);
        assert_eq!(host.distribution, "rocky");
    }

    #[test]
    fn unknown_id_falls_back_to_id_like() {
        let os_release = "ID=mycorp\nID_LIKE=\"ubuntu debian\"\nVERSION_ID=22.04\n";
        let host = build_descriptor(&facts(os_release, "arm64")).unwrap();
        assert_eq!(host.os_family, OsFamily::Ubuntu);
        assert_eq!(host.architecture, Arch::Aarch64);
        assert_eq!(host.package_manager, PackageManager::Apt);
    }

    #[test]
    fn unknown_distribution_is_unsupported() {
        let os_release = "ID=gentoo\nVERSION_ID=2.15\n";
        let err = build_descriptor(&facts(os_release, "x86_64")).unwrap_err();
        assert!(matches!(
            err,
            UnsupportedHostError::UnknownDistribution { ref id, .. } if id == "gentoo"
        ));
    }

    #[test]
    fn unknown_architecture_is_unsupported_even_for_known_distro() {
        let err = build_descriptor(&facts(UBUNTU, "mips64")).unwrap_err();
        assert!(matches!(err, UnsupportedHostError::UnknownArchitecture(ref a) if a == "mips64"));
    }

    #[test]
    fn missing_version_is_reported() {
        let err = build_descriptor(&facts("ID=debian\n", "x86_64")).unwrap_err();
        assert!(matches!(err, UnsupportedHostError::MissingFact("os_version")));
    }

    #[test]
    fn reads_windows_version_from_ver() {
        let version = parse_ver_output("\r\nMicrosoft Windows [Version 10.0.19045.3803]\r\n");
        assert_eq!(version.as_deref(), Some("10.0.19045.3803"));
        assert_eq!(
            parse_ver_output("Microsoft Windows [Versión 10.0.22631.2861]").as_deref(),
            Some("10.0.22631.2861")
        );
        assert_eq!(parse_ver_output("Microsoft Windows"), None);

        let windows = HostFacts {
            id: Some("windows".to_string()),
            version_id: version,
            machine: Some("x86_64".to_string()),
            ..HostFacts::default()
        };
        let host = build_descriptor(&windows).unwrap();
        assert_eq!(host.os_family, OsFamily::Windows);
        assert_eq!(host.os_version, OsVersion::new(10, Some(0)));
        assert_eq!(host.package_manager, PackageManager::Msiexec);
    }

    #[test]
    fn overrides_replace_detected_facts() {
        let overrides = HostOverrides {
            os: Some("AlmaLinux".to_string()),
            os_version: Some("8.9".to_string()),
            arch: Some("aarch64".to_string()),
        };
        let host = build_descriptor(&facts(UBUNTU, "x86_64").with_overrides(&overrides)).unwrap();
        assert_eq!(host.os_family, OsFamily::El);
        assert_eq!(host.os_version, OsVersion::new(8, Some(9)));
        assert_eq!(host.architecture, Arch::Aarch64);
    }

    #[test]
    fn fully_overridden_host_skips_detection() {
        let overrides = HostOverrides {
            os: Some("ubuntu".to_string()),
            os_version: Some("20.04".to_string()),
            arch: Some("riscv64".to_string()),
        };
        let host = describe_host(&overrides).unwrap();
        assert_eq!(host.os_family, OsFamily::Ubuntu);
        assert_eq!(host.architecture, Arch::Riscv64);
    }
}
