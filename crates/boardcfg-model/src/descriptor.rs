//! Complete platform descriptor.
//!
//! Assembles package, platform module and default parameters into the
//! unit a registrar binds and a linker-script generator consumes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::memory::MemoryMap;
use crate::package::PackageDescriptor;
use crate::platform::{PlatformModule, PlatformParams};
use crate::schema::PlatformSchema;

/// A board package with its platform module and instance defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformDescriptor {
    pub package: PackageDescriptor,
    pub platform: PlatformModule,
    /// Defaults applied to every instance created from the platform.
    pub params: PlatformParams,
}

impl PlatformDescriptor {
    /// Package name; the key the descriptor is registered under.
    pub fn name(&self) -> &str {
        &self.package.name
    }

    /// The CPU's memory map.
    pub fn memory_map(&self) -> &MemoryMap {
        self.platform.cpu.memory_map()
    }

    /// Structural schema of the platform module.
    pub fn schema(&self) -> PlatformSchema {
        self.platform.schema(&self.params)
    }

    /// SHA-256 of the descriptor's canonical JSON encoding.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Fingerprint::compute(&bytes))
    }
}

/// A SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Fingerprint(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
