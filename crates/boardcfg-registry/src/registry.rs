//! Process-scoped registry of platform packages.
//!
//! The registry records which external interfaces are available, which
//! board packages have been bound and the instances created from them.
//! It is owned by the caller and passed explicitly; bindings are
//! append-only and a package name can be bound once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use boardcfg_model::{
    Fingerprint, ParamOverrides, PlatformDescriptor, PlatformInstance, PlatformSchema,
};

use crate::capsule::{Capsule, HookKind};
use crate::error::{RegistryError, Result};

/// What the registry is being populated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Building a configuration (`cfg`).
    #[default]
    Config,
    /// Inspecting a running target's objects (`rov`).
    Introspection,
    /// Any other consumer, e.g. documentation tools.
    Other,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Config => "cfg",
            Mode::Introspection => "rov",
            Mode::Other => "other",
        }
    }
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    /// `cfg` and `rov` select their modes; anything else is `Other`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "cfg" => Mode::Config,
            "rov" => Mode::Introspection,
            _ => Mode::Other,
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External packages and interfaces a generated board package refers to.
pub const XDC_CORE: [&str; 13] = [
    "xdc",
    "xdc.corevers",
    "xdc.platform",
    "ti.platforms.generic",
    "xdc.IPackage.Module",
    "xdc.platform.IPlatform.Module",
    "xdc.platform.IPlatform.Instance",
    "xdc.platform.IPlatform$$Params",
    "xdc.platform.IPlatform.Board",
    "xdc.platform.IPlatform.Memory",
    "xdc.platform.IPlatform.MemoryMap",
    "ti.platforms.generic.Platform",
    "ti.platforms.generic.Platform.Instance",
];

/// A bound board package.
#[derive(Debug)]
pub struct RegisteredPackage {
    pub(crate) descriptor: PlatformDescriptor,
    pub(crate) schema: PlatformSchema,
    pub(crate) version: Option<semver::Version>,
    pub(crate) fingerprint: Fingerprint,
    pub(crate) hooks: BTreeSet<HookKind>,
    pub(crate) capsule: Capsule,
    pub(crate) instances: Vec<PlatformInstance>,
}

impl RegisteredPackage {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &PlatformDescriptor {
        &self.descriptor
    }

    pub fn schema(&self) -> &PlatformSchema {
        &self.schema
    }

    pub fn version(&self) -> Option<&semver::Version> {
        self.version.as_ref()
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Unit names of the package's modules, without the package prefix.
    pub fn unit_names(&self) -> Vec<&str> {
        vec![self.descriptor.platform.unit_name()]
    }

    /// Whether the module was registered with `kind`.
    pub fn has_hook(&self, kind: HookKind) -> bool {
        self.hooks.contains(&kind)
    }

    pub fn hooks(&self) -> impl Iterator<Item = HookKind> + '_ {
        self.hooks.iter().copied()
    }

    pub fn instances(&self) -> &[PlatformInstance] {
        &self.instances
    }

    /// Answer an instance query hook; `None` when the module lacks it.
    pub fn query(&self, kind: HookKind, instance: &PlatformInstance) -> Option<String> {
        self.capsule.query(kind, instance)
    }
}

/// The registry.
#[derive(Debug, Default)]
pub struct Registry {
    mode: Mode,
    provided: BTreeSet<String>,
    packages: BTreeMap<String, RegisteredPackage>,
    /// Package names in bind order.
    order: Vec<String>,
    /// Qualified module names in bind order.
    modules: Vec<String>,
}

impl Registry {
    /// An empty registry.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// A registry already providing the core packages and interfaces.
    pub fn with_xdc_core(mode: Mode) -> Self {
        let mut registry = Self::new(mode);
        for name in XDC_CORE {
            registry.provide(name);
        }
        registry
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Make an external interface, module or package available.
    /// Returns `false` if it was already available.
    pub fn provide(&mut self, name: impl Into<String>) -> bool {
        self.provided.insert(name.into())
    }

    /// Whether `name` is available, either provided externally or bound.
    pub fn is_available(&self, name: &str) -> bool {
        self.provided.contains(name)
            || self.packages.contains_key(name)
            || self.modules.iter().any(|m| m == name)
    }

    /// Strict lookup: fail if `name` is unavailable.
    pub fn require(&self, name: &str, requester: &str) -> Result<()> {
        if self.is_available(name) {
            Ok(())
        } else {
            Err(RegistryError::NotFound {
                name: name.to_string(),
                requester: requester.to_string(),
            })
        }
    }

    /// Look up a bound package.
    pub fn find(&self, name: &str) -> Option<&RegisteredPackage> {
        self.packages.get(name)
    }

    /// Look up a bound package, failing if it is absent.
    pub fn find_strict(&self, name: &str) -> Result<&RegisteredPackage> {
        self.find(name).ok_or_else(|| RegistryError::PackageNotFound {
            name: name.to_string(),
        })
    }

    /// Bound packages in bind order.
    pub fn packages(&self) -> impl Iterator<Item = &RegisteredPackage> {
        self.order.iter().filter_map(|name| self.packages.get(name))
    }

    /// Qualified module names in bind order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Externally provided names, sorted.
    pub fn provided(&self) -> impl Iterator<Item = &str> {
        self.provided.iter().map(String::as_str)
    }

    /// Whether the module `module` (qualified name) was registered with
    /// `kind`. Unknown modules have no hooks.
    pub fn has_hook(&self, module: &str, kind: HookKind) -> bool {
        self.package_of_module(module)
            .is_some_and(|pkg| pkg.has_hook(kind))
    }

    fn package_of_module(&self, module: &str) -> Option<&RegisteredPackage> {
        self.packages
            .values()
            .find(|pkg| pkg.descriptor.platform.name == module)
    }

    pub(crate) fn insert(&mut self, package: RegisteredPackage) -> Result<()> {
        let name = package.name().to_string();
        if self.packages.contains_key(&name) {
            return Err(RegistryError::AlreadyBound { name });
        }
        log::info!(
            "bound package '{name}' (module {}, fingerprint {})",
            package.descriptor.platform.name,
            package.fingerprint.short()
        );
        self.modules.push(package.descriptor.platform.name.clone());
        self.order.push(name.clone());
        self.packages.insert(name, package);
        Ok(())
    }

    /// Signal that a configuration uses the package's module, running its
    /// `module$use` hook when present.
    pub fn use_module(&self, package: &str) -> Result<()> {
        let pkg = self.find_strict(package)?;
        if let Some(hook) = &pkg.capsule.module_use {
            hook(&pkg.descriptor.platform).map_err(|detail| RegistryError::Hook {
                hook: HookKind::ModuleUse,
                detail,
            })?;
        }
        Ok(())
    }

    /// Create an instance of the package's platform module.
    ///
    /// Parameters start from the module defaults, then `overrides` apply,
    /// then `instance$meta$init` runs if present. Memory assignments must
    /// name regions of the instance's effective memory map.
    pub fn create_instance(
        &mut self,
        package: &str,
        name: &str,
        overrides: &ParamOverrides,
    ) -> Result<&PlatformInstance> {
        let pkg = self
            .packages
            .get_mut(package)
            .ok_or_else(|| RegistryError::PackageNotFound {
                name: package.to_string(),
            })?;
        let module = &pkg.descriptor.platform;
        if !module.flags.instantiable {
            return Err(RegistryError::NotInstantiable {
                module: module.name.clone(),
            });
        }

        let mut instance = PlatformInstance {
            name: name.to_string(),
            index: pkg.instances.len(),
            module: module.name.clone(),
            params: pkg.descriptor.params.with_overrides(overrides),
        };
        if let Some(hook) = &pkg.capsule.instance_meta_init {
            hook(&mut instance).map_err(|detail| RegistryError::Hook {
                hook: HookKind::InstanceMetaInit,
                detail,
            })?;
        }
        instance.check_memory_references(&module.cpu)?;

        log::info!(
            "created instance '{}' #{} of {} (code {}, data {}, stack {})",
            instance.name,
            instance.index,
            instance.module,
            instance.params.code_memory,
            instance.params.data_memory,
            instance.params.stack_memory
        );
        pkg.instances.push(instance);
        Ok(&pkg.instances[pkg.instances.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!("cfg".parse::<Mode>().unwrap(), Mode::Config);
        assert_eq!("rov".parse::<Mode>().unwrap(), Mode::Introspection);
        assert_eq!("doc".parse::<Mode>().unwrap(), Mode::Other);
        assert_eq!(Mode::Introspection.to_string(), "rov");
    }

    #[test]
    fn core_interfaces_available() {
        let registry = Registry::with_xdc_core(Mode::Config);
        assert!(registry.require("xdc.platform.IPlatform.Module", "test").is_ok());
        assert!(registry.require("ti.platforms.generic.Platform", "test").is_ok());
        assert_eq!(registry.provided().count(), XDC_CORE.len());
    }

    #[test]
    fn require_missing_is_not_found() {
        let registry = Registry::new(Mode::Config);
        let err = registry.require("xdc.platform", "board").unwrap_err();
        match err {
            RegistryError::NotFound { name, requester } => {
                assert_eq!(name, "xdc.platform");
                assert_eq!(requester, "board");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn provide_is_idempotent() {
        let mut registry = Registry::new(Mode::Other);
        assert!(registry.provide("xdc"));
        assert!(!registry.provide("xdc"));
    }

    #[test]
    fn unknown_package_lookups() {
        let mut registry = Registry::with_xdc_core(Mode::Config);
        assert!(registry.find("nope").is_none());
        assert!(matches!(
            registry.find_strict("nope"),
            Err(RegistryError::PackageNotFound { .. })
        ));
        assert!(matches!(
            registry.create_instance("nope", "x", &ParamOverrides::default()),
            Err(RegistryError::PackageNotFound { .. })
        ));
        assert!(!registry.has_hook("nope.Platform", HookKind::ModuleMetaInit));
        assert!(registry.use_module("nope").is_err());
    }

    #[test]
    fn core_provides_every_schema_base() {
        let registry = Registry::with_xdc_core(Mode::Config);
        let schema = boardcfg_model::board::am335x_ddr3_512mb().schema();
        for base in schema.bases() {
            assert!(registry.is_available(base), "{base} not provided");
        }
        assert!(registry.is_available("xdc.platform.IPlatform$$Params"));
        assert!(!registry.is_available("xdc.platform.IPlatform.Params"));
    }
}
