//! CPU sub-instance model.
//!
//! A platform owns exactly one CPU, created from a generic platform
//! module with a device name, the device catalog it comes from, a clock
//! rate and the memory map the board actually wires up.

use serde::{Deserialize, Serialize};

use crate::memory::MemoryMap;

/// Qualified name of the generic platform module CPUs are created from.
pub const GENERIC_PLATFORM_MODULE: &str = "ti.platforms.generic.Platform";

/// The CPU instance of a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CpuInstance {
    /// Instance name inside the platform (always "CPU" for generated boards).
    pub name: String,
    /// Module the instance is created from.
    #[serde(default = "default_module")]
    pub module: String,
    /// Clock rate, kept exactly as recorded; the unit is the one used by
    /// the catalog the CPU belongs to.
    pub clock_rate: u64,
    /// Device catalog package (e.g., "ti.catalog.arm.cortexa8").
    pub catalog_name: String,
    /// Device name within the catalog (e.g., "AM3359").
    pub device_name: String,
    /// Board-specific memory map, replacing the device's default one.
    pub custom_memory_map: MemoryMap,
}

fn default_module() -> String {
    GENERIC_PLATFORM_MODULE.to_string()
}

impl CpuInstance {
    /// Create a CPU instance of the generic platform module.
    pub fn generic(
        clock_rate: u64,
        catalog_name: impl Into<String>,
        device_name: impl Into<String>,
        custom_memory_map: MemoryMap,
    ) -> Self {
        Self {
            name: "CPU".into(),
            module: default_module(),
            clock_rate,
            catalog_name: catalog_name.into(),
            device_name: device_name.into(),
            custom_memory_map,
        }
    }

    /// Fully qualified device identifier, `catalog.device`.
    pub fn device_path(&self) -> String {
        format!("{}.{}", self.catalog_name, self.device_name)
    }

    /// Memory map in effect for this CPU.
    pub fn memory_map(&self) -> &MemoryMap {
        &self.custom_memory_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Access, AddressSpace, MemoryRegion};

    #[test]
    fn generic_cpu_defaults() {
        let map = MemoryMap::from_regions([MemoryRegion::new(
            "RAM",
            0x1000,
            0x1000,
            AddressSpace::Data,
            Access::RW,
        )])
        .unwrap();
        let cpu = CpuInstance::generic(48, "ti.catalog.arm", "X1", map);
        assert_eq!(cpu.name, "CPU");
        assert_eq!(cpu.module, GENERIC_PLATFORM_MODULE);
        assert_eq!(cpu.device_path(), "ti.catalog.arm.X1");
        assert_eq!(cpu.memory_map().len(), 1);
    }
}
