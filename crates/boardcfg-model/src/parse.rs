//! TOML parsing, serialization, validation, and discovery for descriptors.
//!
//! Board descriptors are stored as `.platform.toml` files in the
//! `platforms/` directory of a project. This module provides functions to
//! load, validate, serialize, and discover these files.

use std::path::{Path, PathBuf};

use crate::board;
use crate::descriptor::PlatformDescriptor;
use crate::error::{ModelError, Result};
use crate::package::is_valid_package_name;
use crate::platform::PlatformInstance;

/// File suffix of descriptor files.
pub const DESCRIPTOR_SUFFIX: &str = ".platform.toml";

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A validation issue found in a descriptor.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

/// Load a descriptor from a `.platform.toml` file.
pub fn load_descriptor_toml(path: &Path) -> Result<PlatformDescriptor> {
    if !path.exists() {
        return Err(ModelError::NotFound {
            path: path.to_path_buf(),
        });
    }
    log::debug!("loading descriptor {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_descriptor_toml(&content)
}

/// Parse a descriptor from a TOML string.
pub fn parse_descriptor_toml(toml_str: &str) -> Result<PlatformDescriptor> {
    let descriptor: PlatformDescriptor = toml::from_str(toml_str)?;
    Ok(descriptor)
}

/// Serialize a descriptor to pretty TOML.
pub fn descriptor_to_toml(descriptor: &PlatformDescriptor) -> Result<String> {
    let toml_str = toml::to_string_pretty(descriptor)?;
    Ok(toml_str)
}

/// Validate a descriptor for structural correctness.
///
/// Returns `Ok(warnings)` if there are no errors, or `Err(issues)` with
/// every problem found (errors and warnings).
pub fn validate_descriptor(
    descriptor: &PlatformDescriptor,
) -> std::result::Result<Vec<ValidationIssue>, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let package = &descriptor.package;
    let module = &descriptor.platform;
    let map = descriptor.memory_map();

    // 1. Package has a name and the module lives inside it
    if package.name.is_empty() {
        issues.push(ValidationIssue::error("package name is empty".into()));
    } else if !is_valid_package_name(&package.name) {
        issues.push(ValidationIssue::error(format!(
            "package name '{}' must be dot-separated identifiers",
            package.name
        )));
    }
    if !package.owns_module(&module.name) {
        issues.push(ValidationIssue::error(format!(
            "platform module '{}' is not a unit of package '{}' (expected '{}<Unit>')",
            module.name,
            package.name,
            package.qualifier()
        )));
    }

    // 2. At least one memory region exists
    if map.is_empty() {
        issues.push(ValidationIssue::error(
            "CPU memory map has no regions".into(),
        ));
    }

    // 3. Region names are unique
    for name in map.duplicate_names() {
        issues.push(ValidationIssue::error(format!(
            "memory region '{name}' is defined more than once"
        )));
    }

    // 4. base + len stays inside the 64-bit address space
    for region in map {
        if region.end().is_none() {
            issues.push(ValidationIssue::error(format!(
                "memory region '{}' (base 0x{:X}, len 0x{:X}) overflows the address space",
                region.name, region.base, region.len
            )));
        }
        if region.len == 0 {
            issues.push(ValidationIssue::warning(format!(
                "memory region '{}' is empty",
                region.name
            )));
        }
    }

    // 5. Regions don't overlap
    for (a, b) in map.overlapping_pairs() {
        issues.push(ValidationIssue::error(format!(
            "memory regions '{}' (0x{:X}..0x{:X}) and '{}' (0x{:X}..0x{:X}) overlap",
            a.name,
            a.base,
            a.base.saturating_add(a.len),
            b.name,
            b.base,
            b.base.saturating_add(b.len)
        )));
    }

    // 6. Default memory assignments name real regions
    let placement = PlatformInstance {
        name: module.name.clone(),
        index: 0,
        module: module.name.clone(),
        params: descriptor.params.clone(),
    };
    if let Err(e) = placement.check_memory_references(&module.cpu) {
        issues.push(ValidationIssue::error(e.to_string()));
    }

    // 7. Code goes into a region that can hold code, data/stack into data
    let effective = placement.effective_memory_map(&module.cpu);
    if let Some(region) = effective.get(&descriptor.params.code_memory) {
        if !region.space.holds_code() || !region.access.execute {
            issues.push(ValidationIssue::warning(format!(
                "codeMemory '{}' is not an executable code region",
                region.name
            )));
        }
    }
    for name in [&descriptor.params.data_memory, &descriptor.params.stack_memory] {
        if let Some(region) = effective.get(name) {
            if !region.space.holds_data() || !region.access.write {
                issues.push(ValidationIssue::warning(format!(
                    "'{}' holds data or stack but is not a writable data region",
                    region.name
                )));
            }
        }
    }

    // 8. The CPU names a device
    if module.cpu.device_name.is_empty() || module.cpu.catalog_name.is_empty() {
        issues.push(ValidationIssue::error(
            "CPU must name both a catalog and a device".into(),
        ));
    }

    if issues.iter().any(|i| i.severity == Severity::Error) {
        Err(issues)
    } else {
        Ok(issues)
    }
}

/// Generate a template `.platform.toml` for a new board.
///
/// Seeds from the AM335x board with the given package name.
pub fn generate_template(name: &str) -> Result<String> {
    let mut descriptor = board::am335x_ddr3_512mb();
    descriptor.platform.name = format!("{name}.Platform");
    descriptor.package.name = name.into();
    descriptor_to_toml(&descriptor)
}

/// Discover all `.platform.toml` files in a project's `platforms/` directory.
///
/// Returns a list of (package_name, file_path) pairs sorted by name.
pub fn discover_descriptors(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let platforms_dir = project_dir.join("platforms");
    if !platforms_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(&platforms_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(DESCRIPTOR_SUFFIX))
            .map(str::to_string);
        if let Some(name) = name {
            log::debug!("discovered descriptor '{name}' at {}", path.display());
            found.push((name, path));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}
