//! Descriptor registrar.
//!
//! Binds a board package into a [`Registry`] in one pass over a fixed
//! phase sequence:
//!
//! ```text
//! imports → objects → consts → creates → functions → sizes → types
//!         → [rov] → singletons → initialization
//! ```
//!
//! The `rov` phase only runs when the registry is in introspection mode.
//! All checks run against the registry before anything is bound, so a
//! failed registration leaves the registry untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use boardcfg_model::parse::{validate_descriptor, Severity};
use boardcfg_model::{ModelError, PackageDescriptor, PlatformDescriptor};

use crate::capsule::{Capsule, HookKind};
use crate::error::{RegistryError, Result};
use crate::registry::{Mode, RegisteredPackage, Registry};

/// A registration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Imports,
    Objects,
    Consts,
    Creates,
    Functions,
    Sizes,
    Types,
    Rov,
    Singletons,
    Initialization,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ORDER: [Phase; 10] = [
        Phase::Imports,
        Phase::Objects,
        Phase::Consts,
        Phase::Creates,
        Phase::Functions,
        Phase::Sizes,
        Phase::Types,
        Phase::Rov,
        Phase::Singletons,
        Phase::Initialization,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Imports => "imports",
            Phase::Objects => "objects",
            Phase::Consts => "consts",
            Phase::Creates => "creates",
            Phase::Functions => "functions",
            Phase::Sizes => "sizes",
            Phase::Types => "types",
            Phase::Rov => "rov",
            Phase::Singletons => "singletons",
            Phase::Initialization => "initialization",
        }
    }

    /// Whether the phase runs in `mode`.
    pub fn runs_in(&self, mode: Mode) -> bool {
        *self != Phase::Rov || mode == Mode::Introspection
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of a completed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Registration {
    pub package: String,
    pub module: String,
    /// Phases that ran, in order.
    pub phases: Vec<Phase>,
    /// Hooks recorded on the module.
    pub hooks: Vec<HookKind>,
    /// Validation warnings that did not stop registration.
    pub warnings: Vec<String>,
}

/// Registers one descriptor, optionally with a capsule of hooks.
#[derive(Debug)]
pub struct Registrar {
    descriptor: PlatformDescriptor,
    capsule: Capsule,
}

/// State carried between phases.
struct Pass<'r> {
    registry: &'r Registry,
    requester: String,
    phases: Vec<Phase>,
}

impl Pass<'_> {
    fn require(&self, name: &str) -> Result<()> {
        self.registry.require(name, &self.requester)
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("{}: phase {phase}", self.requester);
        self.phases.push(phase);
    }
}

impl Registrar {
    pub fn new(descriptor: PlatformDescriptor) -> Self {
        Self {
            descriptor,
            capsule: Capsule::new(),
        }
    }

    /// Attach the capsule whose hooks the module is registered with.
    pub fn with_capsule(mut self, capsule: Capsule) -> Self {
        self.capsule = capsule;
        self
    }

    /// Run every phase and bind the package into `registry`.
    ///
    /// Fails with `AlreadyBound` if the package name is taken, `NotFound`
    /// if a referenced interface or module is unavailable, `Hook` if a
    /// capsule hook fails and `Model` if the descriptor is invalid.
    pub fn register(self, registry: &mut Registry) -> Result<Registration> {
        let Registrar {
            descriptor,
            capsule,
        } = self;
        let name = descriptor.name().to_string();
        if registry.find(&name).is_some() {
            return Err(RegistryError::AlreadyBound { name });
        }

        let mut pass = Pass {
            registry: &*registry,
            requester: name.clone(),
            phases: Vec::new(),
        };
        let mode = pass.registry.mode();

        pass.enter(Phase::Imports);
        for import in &descriptor.package.imports {
            pass.require(import)?;
        }

        pass.enter(Phase::Objects);
        let module_name = descriptor.platform.name.clone();
        if !descriptor.package.owns_module(&module_name) {
            return Err(ModelError::Validation {
                detail: format!("module '{module_name}' is not a unit of package '{name}'"),
            }
            .into());
        }

        // Platform modules declare no constants, functions or sized types.
        pass.enter(Phase::Consts);
        pass.enter(Phase::Creates);
        if !descriptor.platform.flags.instantiable {
            log::debug!("{module_name}: not instantiable, no create/construct");
        }
        pass.enter(Phase::Functions);
        pass.enter(Phase::Sizes);

        pass.enter(Phase::Types);
        for base in descriptor.schema().bases() {
            pass.require(base)?;
        }
        pass.require(&format!("{}.Instance", descriptor.platform.cpu.module))?;
        let hooks = capsule.present();
        for hook in &hooks {
            log::debug!("{module_name}: capsule supplies {hook}");
        }

        if Phase::Rov.runs_in(mode) {
            pass.enter(Phase::Rov);
        }

        pass.enter(Phase::Singletons);
        pass.require("xdc.IPackage.Module")?;
        pass.require("xdc.platform.IPlatform.MemoryMap")?;
        for typedef in &descriptor.platform.typedefs {
            pass.require(typedef)?;
        }
        for inherited in &descriptor.platform.inherits {
            pass.require(inherited)?;
        }
        let version = package_version(&descriptor.package)?;
        let cpu = descriptor.platform.cpu.clone();

        pass.enter(Phase::Initialization);
        let mut descriptor = descriptor;
        if let Some(hook) = &capsule.module_meta_init {
            hook(&mut descriptor.platform).map_err(|detail| RegistryError::Hook {
                hook: HookKind::ModuleMetaInit,
                detail,
            })?;
            if descriptor.platform.name != module_name {
                return Err(RegistryError::Hook {
                    hook: HookKind::ModuleMetaInit,
                    detail: format!(
                        "module '{module_name}' was renamed to '{}'",
                        descriptor.platform.name
                    ),
                });
            }
            for interface in descriptor
                .platform
                .typedefs
                .iter()
                .chain(&descriptor.platform.inherits)
            {
                pass.require(interface)?;
            }
        }
        // The CPU is created after `module$meta$init`, from the descriptor's
        // own values.
        descriptor.platform.cpu = cpu;
        pass.require(&descriptor.platform.cpu.module)?;
        let schema = descriptor.schema();
        for base in schema.bases() {
            pass.require(base)?;
        }
        let warnings = match validate_descriptor(&descriptor) {
            Ok(warnings) => warnings,
            Err(issues) => {
                let detail = issues
                    .iter()
                    .filter(|i| i.severity == Severity::Error)
                    .map(|i| i.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ModelError::Validation { detail }.into());
            }
        };
        for warning in &warnings {
            log::warn!("{name}: {}", warning.message);
        }
        if let Some(hook) = &capsule.module_validate {
            hook(&descriptor.platform).map_err(|detail| RegistryError::Hook {
                hook: HookKind::ModuleValidate,
                detail,
            })?;
        }

        let phases = pass.phases;
        let registration = Registration {
            package: name,
            module: module_name,
            phases,
            hooks: hooks.iter().copied().collect(),
            warnings: warnings.into_iter().map(|w| w.message).collect(),
        };
        let fingerprint = descriptor.fingerprint()?;
        registry.insert(RegisteredPackage {
            descriptor,
            schema,
            version,
            fingerprint,
            hooks,
            capsule,
            instances: Vec::new(),
        })?;
        Ok(registration)
    }
}

/// Semantic version of a package; unversioned packages have none.
fn package_version(package: &PackageDescriptor) -> Result<Option<semver::Version>> {
    match package.version.as_slice() {
        [] => Ok(None),
        [major, minor, patch, ..] => Ok(Some(semver::Version::new(*major, *minor, *patch))),
        _ => {
            let dotted = package.version_string().unwrap_or_default();
            Ok(Some(semver::Version::parse(&dotted)?))
        }
    }
}
