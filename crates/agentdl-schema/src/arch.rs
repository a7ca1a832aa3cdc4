//! CPU architecture vocabulary.
//!
//! Vendors and operating systems spell the same architecture several ways
//! (`amd64`, `x86-64`, `x86_64`). [`Arch`] is the canonical form both sides of
//! a match are reduced to.

/// A CPU architecture recognized by the matcher.
///
/// The vocabulary is closed: anything that does not map onto one of these
/// variants is rejected for hosts and kept as an opaque tag for catalog
/// entries.
///
/// # Example
///
/// ```
/// use agentdl_schema::Arch;
///
/// let arch: Arch = "amd64".parse().unwrap();
/// assert_eq!(arch, Arch::X86_64);
/// assert_eq!(arch.as_str(), "x86_64");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// Intel/AMD 64-bit.
    #[serde(rename = "x86_64")]
    X86_64,
    /// ARM 64-bit.
    Aarch64,
    /// ARM 32-bit hard-float.
    Armv7l,
    /// Intel 32-bit.
    I686,
    /// POWER little-endian 64-bit.
    Ppc64le,
    /// IBM Z.
    S390x,
    /// RISC-V 64-bit.
    Riscv64,
}

/// Spellings that mean "runs on every architecture" in a vendor catalog.
///
/// Hosts never resolve to these; only catalog entries may.
pub const ANY_ARCH_WORDS: &[&str] = &["any", "all", "noarch", "universal"];

impl Arch {
    /// Every architecture in the vocabulary, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::X86_64,
        Self::Aarch64,
        Self::Armv7l,
        Self::I686,
        Self::Ppc64le,
        Self::S390x,
        Self::Riscv64,
    ];

    /// Architecture of the running binary.
    ///
    /// Returns `None` when the compile target is outside the vocabulary.
    pub fn current() -> Option<Self> {
        std::env::consts::ARCH.parse().ok()
    }

    /// Canonical (Linux `uname -m`) spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Armv7l => "armv7l",
            Self::I686 => "i686",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
        }
    }

    /// Check whether `s` is one of the catalog "any architecture" words.
    pub fn is_any_word(s: &str) -> bool {
        let lower = s.trim().to_ascii_lowercase();
        ANY_ARCH_WORDS.contains(&lower.as_str())
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x86-64" | "x64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            "armv7l" | "armv7" | "armhf" | "arm" => Ok(Self::Armv7l),
            "i686" | "i586" | "i386" | "x86" => Ok(Self::I686),
            "ppc64le" | "powerpc64le" => Ok(Self::Ppc64le),
            "s390x" => Ok(Self::S390x),
            "riscv64" | "riscv64gc" => Ok(Self::Riscv64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}
