//! Shared types for agentdl.
//!
//! Everything here is plain data: the closed vocabularies the matcher works
//! in ([`Arch`], [`OsFamily`]), release numbers and ranges, published
//! checksums, and the records that flow through the resolution pipeline.

pub mod arch;
pub mod checksum;
pub mod family;
pub mod types;
pub mod version;

// Re-exports
pub use arch::*;
pub use checksum::*;
pub use family::*;
pub use types::*;
pub use version::*;
