//! Structural schema of a platform module.
//!
//! Each platform module declares three prototypes: the module itself,
//! its instances and the creation parameters. A prototype is a named
//! list of field declarations with types and defaults; it carries no
//! instance data.

use serde::{Deserialize, Serialize};

use crate::platform::PlatformParams;

/// Type of a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Bool,
    Num,
    Str,
    /// Instance of another module, by qualified module name.
    Instance(String),
}

/// A default value for a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Num(u64),
    Str(String),
}

/// Who may write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldAccess {
    /// Fixed at declaration time.
    ReadOnly,
    /// Writable by the host-side configuration script.
    HostWritable,
}

/// One field of a prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDecl {
    pub name: String,
    pub ty: FieldType,
    /// Default value; `None` leaves the field undefined until assigned.
    pub default: Option<FieldValue>,
    pub access: FieldAccess,
}

impl FieldDecl {
    pub fn new(
        name: impl Into<String>,
        ty: FieldType,
        default: Option<FieldValue>,
        access: FieldAccess,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            default,
            access,
        }
    }

    fn host_only() -> Self {
        Self::new(
            "$hostonly",
            FieldType::Num,
            Some(FieldValue::Num(1)),
            FieldAccess::ReadOnly,
        )
    }

    fn memory_name(name: &str, default: &str) -> Self {
        Self::new(
            name,
            FieldType::Str,
            Some(FieldValue::Str(default.to_string())),
            FieldAccess::HostWritable,
        )
    }
}

/// A named prototype: a base interface plus its declared fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Prototype {
    /// Qualified prototype name (e.g., "am335x_DDR3_512MB.Platform.Module").
    pub name: String,
    /// Qualified name of the prototype this one extends.
    pub base: String,
    pub fields: Vec<FieldDecl>,
}

impl Prototype {
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The three prototypes every platform module declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformSchema {
    pub module: Prototype,
    pub instance: Prototype,
    pub params: Prototype,
}

impl PlatformSchema {
    /// Declare the schema of `<package>.Platform`.
    ///
    /// `cpu_module` is the module the `CPU` field holds an instance of;
    /// `defaults` supplies the code, data and stack memory defaults.
    pub fn declare(package: &str, cpu_module: &str, defaults: &PlatformParams) -> Self {
        let module_name = format!("{package}.Platform");
        let memory_fields = || {
            let mut fields = vec![FieldDecl::host_only()];
            fields.extend(
                defaults
                    .assignments()
                    .into_iter()
                    .map(|(name, region)| FieldDecl::memory_name(name, region)),
            );
            fields
        };

        Self {
            module: Prototype {
                name: format!("{module_name}.Module"),
                base: "xdc.platform.IPlatform.Module".into(),
                fields: vec![
                    FieldDecl::host_only(),
                    FieldDecl::new(
                        "CPU",
                        FieldType::Instance(format!("{cpu_module}.Instance")),
                        None,
                        FieldAccess::HostWritable,
                    ),
                ],
            },
            instance: Prototype {
                name: format!("{module_name}.Instance"),
                base: "xdc.platform.IPlatform.Instance".into(),
                fields: memory_fields(),
            },
            params: Prototype {
                name: format!("{module_name}.Params"),
                base: "xdc.platform.IPlatform$$Params".into(),
                fields: memory_fields(),
            },
        }
    }

    /// Base interfaces the schema extends.
    pub fn bases(&self) -> [&str; 3] {
        [
            self.module.base.as_str(),
            self.instance.base.as_str(),
            self.params.base.as_str(),
        ]
    }
}
