//! Optional lifecycle hooks attached to a platform module.
//!
//! A capsule supplies any subset of the hooks below. Absent hooks are
//! never invoked and are not recorded on the registered module, so
//! `Registry::has_hook` answers `false` for them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use boardcfg_model::{PlatformInstance, PlatformModule};

/// Outcome of a hook; the error string becomes `RegistryError::Hook`.
pub type HookResult = std::result::Result<(), String>;

/// Hook that may adjust the module before it is bound.
pub type ModuleHook = Box<dyn Fn(&mut PlatformModule) -> HookResult + Send + Sync>;
/// Hook that inspects the finished module.
pub type ModuleCheck = Box<dyn Fn(&PlatformModule) -> HookResult + Send + Sync>;
/// Hook that may adjust a freshly created instance.
pub type InstanceHook = Box<dyn Fn(&mut PlatformInstance) -> HookResult + Send + Sync>;
/// Query answered for an instance (create args, exec command, link template).
pub type InstanceQuery = Box<dyn Fn(&PlatformInstance) -> String + Send + Sync>;

/// The hooks a capsule can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HookKind {
    ModuleUse,
    ModuleMetaInit,
    InstanceMetaInit,
    ModuleValidate,
    GetCreateArgs,
    GetExecCmd,
    GetLinkTemplate,
}

impl HookKind {
    pub const ALL: [HookKind; 7] = [
        HookKind::ModuleUse,
        HookKind::ModuleMetaInit,
        HookKind::InstanceMetaInit,
        HookKind::ModuleValidate,
        HookKind::GetCreateArgs,
        HookKind::GetExecCmd,
        HookKind::GetLinkTemplate,
    ];

    /// Name of the hook as it appears in capsule sources.
    pub fn name(&self) -> &'static str {
        match self {
            HookKind::ModuleUse => "module$use",
            HookKind::ModuleMetaInit => "module$meta$init",
            HookKind::InstanceMetaInit => "instance$meta$init",
            HookKind::ModuleValidate => "module$validate",
            HookKind::GetCreateArgs => "getCreateArgs",
            HookKind::GetExecCmd => "getExecCmd",
            HookKind::GetLinkTemplate => "getLinkTemplate",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hooks supplied for one platform module.
#[derive(Default)]
pub struct Capsule {
    pub module_use: Option<ModuleCheck>,
    pub module_meta_init: Option<ModuleHook>,
    pub instance_meta_init: Option<InstanceHook>,
    pub module_validate: Option<ModuleCheck>,
    pub get_create_args: Option<InstanceQuery>,
    pub get_exec_cmd: Option<InstanceQuery>,
    pub get_link_template: Option<InstanceQuery>,
}

impl Capsule {
    /// A capsule with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_module_use(
        mut self,
        f: impl Fn(&PlatformModule) -> HookResult + Send + Sync + 'static,
    ) -> Self {
        self.module_use = Some(Box::new(f));
        self
    }

    pub fn on_module_meta_init(
        mut self,
        f: impl Fn(&mut PlatformModule) -> HookResult + Send + Sync + 'static,
    ) -> Self {
        self.module_meta_init = Some(Box::new(f));
        self
    }

    pub fn on_instance_meta_init(
        mut self,
        f: impl Fn(&mut PlatformInstance) -> HookResult + Send + Sync + 'static,
    ) -> Self {
        self.instance_meta_init = Some(Box::new(f));
        self
    }

    pub fn on_module_validate(
        mut self,
        f: impl Fn(&PlatformModule) -> HookResult + Send + Sync + 'static,
    ) -> Self {
        self.module_validate = Some(Box::new(f));
        self
    }

    pub fn on_get_create_args(
        mut self,
        f: impl Fn(&PlatformInstance) -> String + Send + Sync + 'static,
    ) -> Self {
        self.get_create_args = Some(Box::new(f));
        self
    }

    pub fn on_get_exec_cmd(
        mut self,
        f: impl Fn(&PlatformInstance) -> String + Send + Sync + 'static,
    ) -> Self {
        self.get_exec_cmd = Some(Box::new(f));
        self
    }

    pub fn on_get_link_template(
        mut self,
        f: impl Fn(&PlatformInstance) -> String + Send + Sync + 'static,
    ) -> Self {
        self.get_link_template = Some(Box::new(f));
        self
    }

    /// Whether the capsule supplies `kind`.
    pub fn has(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::ModuleUse => self.module_use.is_some(),
            HookKind::ModuleMetaInit => self.module_meta_init.is_some(),
            HookKind::InstanceMetaInit => self.instance_meta_init.is_some(),
            HookKind::ModuleValidate => self.module_validate.is_some(),
            HookKind::GetCreateArgs => self.get_create_args.is_some(),
            HookKind::GetExecCmd => self.get_exec_cmd.is_some(),
            HookKind::GetLinkTemplate => self.get_link_template.is_some(),
        }
    }

    /// Every hook the capsule supplies.
    pub fn present(&self) -> BTreeSet<HookKind> {
        HookKind::ALL.into_iter().filter(|k| self.has(*k)).collect()
    }

    /// Answer an instance query, or `None` when the capsule lacks it.
    pub fn query(&self, kind: HookKind, instance: &PlatformInstance) -> Option<String> {
        let f = match kind {
            HookKind::GetCreateArgs => self.get_create_args.as_ref(),
            HookKind::GetExecCmd => self.get_exec_cmd.as_ref(),
            HookKind::GetLinkTemplate => self.get_link_template.as_ref(),
            _ => None,
        };
        f.map(|f| f(instance))
    }
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capsule")
            .field("hooks", &self.present())
            .finish()
    }
}
