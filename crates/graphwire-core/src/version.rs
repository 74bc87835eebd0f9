//! Crate and wire protocol versions.

use serde::Serialize;
use std::fmt;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the wire dialect spoken by the codec. Peers speaking another
/// protocol version may disagree on keys or result encoding.
pub const PROTOCOL_VERSION: u32 = 1;

/// What a running build reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub protocol: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<&'static str>,
}

impl VersionInfo {
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: VERSION,
            protocol: PROTOCOL_VERSION,
            build: option_env!("GRAPHWIRE_BUILD_GIT_HASH"),
        }
    }
}

/// One-line banner, e.g. `graphwire 0.2.0 (protocol 1)`.
impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graphwire {} (protocol {}", self.version, self.protocol)?;
        if let Some(build) = self.build {
            write!(f, ", {build}")?;
        }
        f.write_str(")")
    }
}
