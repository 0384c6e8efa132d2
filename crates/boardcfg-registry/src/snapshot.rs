//! Serializable view of a registry, for downstream tools and the CLI.

use serde::{Deserialize, Serialize};

use boardcfg_model::{PlatformDescriptor, PlatformInstance, PlatformSchema};

use crate::capsule::HookKind;
use crate::error::Result;
use crate::registry::{Mode, Registry};

/// Everything bound in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistrySnapshot {
    pub mode: Mode,
    pub provided: Vec<String>,
    /// Qualified module names in bind order.
    pub modules: Vec<String>,
    pub packages: Vec<PackageSnapshot>,
}

/// One bound package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSnapshot {
    pub name: String,
    pub version: Option<String>,
    pub fingerprint: String,
    /// Module names relative to the package, e.g. `Platform`.
    pub unit_names: Vec<String>,
    pub descriptor: PlatformDescriptor,
    pub schema: PlatformSchema,
    pub hooks: Vec<HookKind>,
    pub instances: Vec<PlatformInstance>,
}

impl Registry {
    /// Capture the registry's current contents.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            mode: self.mode(),
            provided: self.provided().map(str::to_string).collect(),
            modules: self.modules().to_vec(),
            packages: self
                .packages()
                .map(|pkg| PackageSnapshot {
                    name: pkg.name().to_string(),
                    version: pkg.version().map(|v| v.to_string()),
                    fingerprint: pkg.fingerprint().to_string(),
                    unit_names: pkg.unit_names().into_iter().map(str::to_string).collect(),
                    descriptor: pkg.descriptor().clone(),
                    schema: pkg.schema().clone(),
                    hooks: pkg.hooks().collect(),
                    instances: pkg.instances().to_vec(),
                })
                .collect(),
        }
    }
}

impl RegistrySnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn package(&self, name: &str) -> Option<&PackageSnapshot> {
        self.packages.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::Registrar;
    use boardcfg_model::board::am335x_ddr3_512mb;

    #[test]
    fn snapshot_reflects_bindings() {
        let mut registry = Registry::with_xdc_core(Mode::Config);
        Registrar::new(am335x_ddr3_512mb())
            .register(&mut registry)
            .unwrap();
        let snap = registry.snapshot();
        assert_eq!(snap.mode, Mode::Config);
        assert_eq!(snap.modules, vec!["am335x_DDR3_512MB.Platform".to_string()]);
        let pkg = snap.package("am335x_DDR3_512MB").unwrap();
        assert!(pkg.version.is_none());
        assert!(pkg.hooks.is_empty());
        assert_eq!(pkg.fingerprint.len(), 64);
        assert_eq!(pkg.unit_names, vec!["Platform".to_string()]);

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"unit-names\""));
        assert!(json.contains("\"base\": \"0x80000000\""));
        let back: RegistrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
