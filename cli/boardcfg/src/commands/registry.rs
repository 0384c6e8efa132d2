//! `boardcfg register | instance`: run the registrar and create instances.

use std::path::Path;

use anyhow::{Context, Result};

use boardcfg_model::{ParamOverrides, PlatformDescriptor, PlatformInstance};
use boardcfg_registry::{Mode, Registrar, Registry, RegistrySnapshot};

use crate::commands::platform::require_descriptor;

/// Memory placement given on the command line.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlags {
    pub code_memory: Option<String>,
    pub data_memory: Option<String>,
    pub stack_memory: Option<String>,
}

impl MemoryFlags {
    /// Layer these flags over configured overrides; flags win.
    pub fn over(self, configured: ParamOverrides) -> ParamOverrides {
        ParamOverrides {
            code_memory: self.code_memory.or(configured.code_memory),
            data_memory: self.data_memory.or(configured.data_memory),
            stack_memory: self.stack_memory.or(configured.stack_memory),
            ..configured
        }
    }
}

/// Register a descriptor into a fresh registry holding the core interfaces.
pub(crate) fn bind(descriptor: PlatformDescriptor, mode: Mode) -> Result<Registry> {
    let name = descriptor.name().to_string();
    let mut registry = Registry::with_xdc_core(mode);
    let registration = Registrar::new(descriptor)
        .register(&mut registry)
        .with_context(|| format!("registering '{name}'"))?;
    log::info!(
        "'{name}' registered in {} mode ({} phases, {} warnings)",
        mode,
        registration.phases.len(),
        registration.warnings.len()
    );
    Ok(registry)
}

pub(crate) fn snapshot_for(descriptor: PlatformDescriptor, mode: Mode) -> Result<RegistrySnapshot> {
    Ok(bind(descriptor, mode)?.snapshot())
}

/// Register a board and print the registry snapshot as JSON.
pub fn register(name: &str, project_dir: Option<&Path>, mode: Mode) -> Result<()> {
    let (descriptor, _) = require_descriptor(name, project_dir)?;
    let snapshot = snapshot_for(descriptor, mode)?;
    println!("{}", snapshot.to_json()?);
    Ok(())
}

pub(crate) fn create(
    descriptor: PlatformDescriptor,
    mode: Mode,
    overrides: &ParamOverrides,
) -> Result<PlatformInstance> {
    let package = descriptor.name().to_string();
    let mut registry = bind(descriptor, mode)?;
    let instance = registry
        .create_instance(&package, &package, overrides)
        .with_context(|| format!("creating an instance of '{package}'"))?;
    Ok(instance.clone())
}

/// Register a board, create one instance and print it as JSON.
pub fn instance(
    name: &str,
    project_dir: Option<&Path>,
    mode: Mode,
    overrides: &ParamOverrides,
) -> Result<()> {
    let (descriptor, _) = require_descriptor(name, project_dir)?;
    let instance = create(descriptor, mode, overrides)?;
    println!("{}", serde_json::to_string_pretty(&instance)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardcfg_model::board::{am335x_ddr3_512mb, AM335X_DDR3_512MB};

    #[test]
    fn snapshot_contains_board() {
        let snap = snapshot_for(am335x_ddr3_512mb(), Mode::Config).unwrap();
        assert_eq!(snap.modules, vec![format!("{AM335X_DDR3_512MB}.Platform")]);
        assert!(snap.package(AM335X_DDR3_512MB).is_some());
    }

    #[test]
    fn flags_override_configuration() {
        let configured = ParamOverrides {
            code_memory: Some("SRAM".into()),
            stack_memory: Some("SRAM".into()),
            ..ParamOverrides::default()
        };
        let flags = MemoryFlags {
            stack_memory: Some("DDR3".into()),
            ..MemoryFlags::default()
        };
        let merged = flags.over(configured);
        assert_eq!(merged.code_memory.as_deref(), Some("SRAM"));
        assert_eq!(merged.data_memory, None);
        assert_eq!(merged.stack_memory.as_deref(), Some("DDR3"));
    }

    #[test]
    fn default_instance_is_ddr3() {
        let inst = create(am335x_ddr3_512mb(), Mode::Config, &ParamOverrides::default()).unwrap();
        assert_eq!(inst.index, 0);
        assert_eq!(inst.params.code_memory, "DDR3");
        assert_eq!(inst.params.data_memory, "DDR3");
        assert_eq!(inst.params.stack_memory, "DDR3");
    }

    #[test]
    fn instance_with_unknown_region_fails() {
        let overrides = MemoryFlags {
            data_memory: Some("L3".into()),
            ..MemoryFlags::default()
        }
        .over(ParamOverrides::default());
        let err = create(am335x_ddr3_512mb(), Mode::Config, &overrides).unwrap_err();
        assert!(format!("{err:#}").contains("L3"));
    }
}
