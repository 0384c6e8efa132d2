//! Platform module, creation parameters and instances.
//!
//! A platform module is the singleton facility a board package exports.
//! It owns the board's CPU and the default creation parameters; each
//! `create` call materializes a [`PlatformInstance`] from those defaults
//! plus caller overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cpu::CpuInstance;
use crate::error::{ModelError, Result};
use crate::memory::MemoryMap;
use crate::schema::PlatformSchema;

/// Capability flags of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleFlags {
    /// Exists only on the host; nothing is emitted for the target.
    pub host_only: bool,
    /// Instances may be created.
    pub instantiable: bool,
    /// Instances have a static object representation.
    pub instance_object: bool,
    /// Instance objects have a known size.
    pub sizeable: bool,
    /// Module delegates to another implementation.
    pub delegate: bool,
    /// Module has initialization code.
    pub initialized: bool,
    /// Module has no runtime support requirement.
    pub no_runtime: bool,
}

impl ModuleFlags {
    /// Flags of a host-only platform module.
    pub fn platform() -> Self {
        Self {
            host_only: true,
            instantiable: true,
            instance_object: true,
            sizeable: true,
            delegate: false,
            initialized: true,
            no_runtime: false,
        }
    }
}

/// Default creation parameters of a platform instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformParams {
    /// Region holding code sections.
    pub code_memory: String,
    /// Region holding data sections.
    pub data_memory: String,
    /// Region holding the stack.
    pub stack_memory: String,
    /// Additional memory visible to the CPU but not part of the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_memory_map: Option<MemoryMap>,
    /// Replacement for the CPU's memory map for this instance only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_memory_map: Option<MemoryMap>,
    /// Region renames applied by the linker template.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rename_map: BTreeMap<String, String>,
    /// Section name to region name placement.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sect_map: BTreeMap<String, String>,
    /// Peripheral name to module name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peripherals: BTreeMap<String, String>,
}

impl PlatformParams {
    /// Parameters placing code, data and stack in one region.
    pub fn uniform(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            code_memory: region.clone(),
            data_memory: region.clone(),
            stack_memory: region,
            external_memory_map: None,
            custom_memory_map: None,
            rename_map: BTreeMap::new(),
            sect_map: BTreeMap::new(),
            peripherals: BTreeMap::new(),
        }
    }

    /// Apply caller overrides, returning the resolved parameters.
    pub fn with_overrides(&self, overrides: &ParamOverrides) -> Self {
        let mut p = self.clone();
        if let Some(code) = &overrides.code_memory {
            p.code_memory = code.clone();
        }
        if let Some(data) = &overrides.data_memory {
            p.data_memory = data.clone();
        }
        if let Some(stack) = &overrides.stack_memory {
            p.stack_memory = stack.clone();
        }
        if let Some(map) = &overrides.custom_memory_map {
            p.custom_memory_map = Some(map.clone());
        }
        p.sect_map
            .extend(overrides.sect_map.iter().map(|(k, v)| (k.clone(), v.clone())));
        p
    }

    /// The (field, region) assignments made by these parameters.
    pub fn assignments(&self) -> [(&'static str, &str); 3] {
        [
            ("codeMemory", self.code_memory.as_str()),
            ("dataMemory", self.data_memory.as_str()),
            ("stackMemory", self.stack_memory.as_str()),
        ]
    }
}

/// Values a caller passes to `create` to replace defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParamOverrides {
    #[serde(default)]
    pub code_memory: Option<String>,
    #[serde(default)]
    pub data_memory: Option<String>,
    #[serde(default)]
    pub stack_memory: Option<String>,
    #[serde(default)]
    pub custom_memory_map: Option<MemoryMap>,
    #[serde(default)]
    pub sect_map: BTreeMap<String, String>,
}

impl ParamOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The singleton platform module of a board package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformModule {
    /// Qualified module name (e.g., "am335x_DDR3_512MB.Platform").
    pub name: String,
    pub flags: ModuleFlags,
    /// Packages whose interfaces this module inherits.
    pub inherits: Vec<String>,
    /// Type definitions re-exported from inherited interfaces.
    pub typedefs: Vec<String>,
    /// The board's CPU.
    pub cpu: CpuInstance,
}

impl PlatformModule {
    /// Unqualified unit name (the part after the package prefix).
    pub fn unit_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Name of the package the module belongs to.
    pub fn package_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(package, _)| package)
            .unwrap_or(&self.name)
    }

    /// Declare the module's structural schema with `params` as defaults.
    pub fn schema(&self, params: &PlatformParams) -> PlatformSchema {
        PlatformSchema::declare(self.package_name(), &self.cpu.module, params)
    }
}

/// A platform instance produced by `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformInstance {
    pub name: String,
    /// Position among the module's instances, starting at 0.
    pub index: usize,
    /// Qualified name of the module the instance belongs to.
    pub module: String,
    pub params: PlatformParams,
}

impl PlatformInstance {
    /// The memory map this instance places sections into.
    pub fn effective_memory_map<'a>(&'a self, cpu: &'a CpuInstance) -> &'a MemoryMap {
        self.params
            .custom_memory_map
            .as_ref()
            .unwrap_or_else(|| cpu.memory_map())
    }

    /// Check that every memory assignment names a region of the effective
    /// map (or of the external map, when one is configured).
    pub fn check_memory_references(&self, cpu: &CpuInstance) -> Result<()> {
        let map = self.effective_memory_map(cpu);
        let external = self.params.external_memory_map.as_ref();
        let check = |field: &str, region: &str| {
            if map.contains(region) || external.is_some_and(|m| m.contains(region)) {
                Ok(())
            } else {
                Err(ModelError::Validation {
                    detail: format!(
                        "instance '{}': {field} refers to unknown memory region '{region}'",
                        self.name
                    ),
                })
            }
        };
        for (field, region) in self.params.assignments() {
            check(field, region)?;
        }
        for (section, region) in &self.params.sect_map {
            check(section, region)?;
        }
        Ok(())
    }
}
