//! `boardcfg.toml` project configuration and descriptor resolution.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use boardcfg_model::parse::{discover_descriptors, load_descriptor_toml};
use boardcfg_model::{board, ParamOverrides, PlatformDescriptor};
use boardcfg_registry::Mode;

/// File name of the project configuration.
pub const MANIFEST_FILE: &str = "boardcfg.toml";

/// The top-level configuration of a board project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardcfgManifest {
    pub project: ProjectConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// `[platform]`: default board and memory placement overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformConfig {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub code_memory: Option<String>,
    #[serde(default)]
    pub data_memory: Option<String>,
    #[serde(default)]
    pub stack_memory: Option<String>,
}

/// `[registry]`: how the registry is populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// `cfg` or `rov`.
    #[serde(default)]
    pub mode: Option<String>,
}

impl BoardcfgManifest {
    /// Search upward from `start_dir` for a `boardcfg.toml` file, parse it
    /// and return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: BoardcfgManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                log::debug!("loaded {}", candidate.display());
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing boardcfg.toml")
    }

    pub fn default_platform(&self) -> Option<&str> {
        self.platform.default.as_deref()
    }

    /// Memory placement overrides configured for new instances.
    pub fn overrides(&self) -> ParamOverrides {
        ParamOverrides {
            code_memory: self.platform.code_memory.clone(),
            data_memory: self.platform.data_memory.clone(),
            stack_memory: self.platform.stack_memory.clone(),
            ..ParamOverrides::default()
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.registry.mode.as_deref().and_then(|m| m.parse().ok())
    }

    /// Configuration written by `boardcfg init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
version = "0.1.0"

[platform]
default = "{default}"

[registry]
mode = "cfg"
"#,
            default = board::AM335X_DDR3_512MB
        )
    }
}

/// Where a resolved descriptor came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSource {
    Builtin,
    File(PathBuf),
}

impl fmt::Display for DescriptorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorSource::Builtin => f.write_str("built-in"),
            DescriptorSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolve a board name: built-in boards first, then the project's
/// `platforms/*.platform.toml` files.
pub fn resolve_descriptor(
    name: &str,
    project_dir: Option<&Path>,
) -> Result<Option<(PlatformDescriptor, DescriptorSource)>> {
    if let Some(descriptor) = board::builtin(name) {
        return Ok(Some((descriptor, DescriptorSource::Builtin)));
    }
    let Some(dir) = project_dir else {
        return Ok(None);
    };
    for (stem, path) in discover_descriptors(dir)? {
        if stem == name {
            let descriptor = load_descriptor_toml(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            if descriptor.name() != stem {
                bail!(
                    "{} declares package '{}' but is named '{stem}'",
                    path.display(),
                    descriptor.name()
                );
            }
            return Ok(Some((descriptor, DescriptorSource::File(path))));
        }
    }
    Ok(None)
}
