//! `boardcfg list | describe | validate | add`: board descriptor commands.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

use boardcfg_model::parse::{
    descriptor_to_toml, discover_descriptors, generate_template, validate_descriptor,
    DESCRIPTOR_SUFFIX,
};
use boardcfg_model::package::is_valid_package_name;
use boardcfg_model::{board, PlatformDescriptor, Severity};

use crate::manifest::{resolve_descriptor, DescriptorSource};

/// Output format of `boardcfg describe`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Toml,
    Json,
}

/// Resolve `name` or fail with a hint.
pub(crate) fn require_descriptor(
    name: &str,
    project_dir: Option<&Path>,
) -> Result<(PlatformDescriptor, DescriptorSource)> {
    match resolve_descriptor(name, project_dir)? {
        Some(found) => Ok(found),
        None => bail!("unknown board: '{name}'. Use 'boardcfg list' to see available boards."),
    }
}

/// List built-in boards and the project's descriptor files.
pub fn list(project_dir: Option<&Path>) -> Result<()> {
    println!("Built-in boards:");
    println!();
    for (name, description) in board::builtin_boards() {
        println!("  {name:<25} {description}");
    }

    if let Some(dir) = project_dir {
        let found = discover_descriptors(dir)?;
        if !found.is_empty() {
            println!();
            println!("Project boards (platforms/):");
            println!();
            for (name, path) in found {
                println!("  {name:<25} {}", path.display());
            }
        }
    }

    println!();
    println!("Use 'boardcfg describe <name>' for details.");
    Ok(())
}

/// Describe a board in the requested format.
pub fn describe(name: &str, project_dir: Option<&Path>, format: Format) -> Result<()> {
    let (descriptor, source) = require_descriptor(name, project_dir)?;
    log::info!("describing '{name}' from {source}");
    print!("{}", render(&descriptor, format)?);
    Ok(())
}

pub(crate) fn render(descriptor: &PlatformDescriptor, format: Format) -> Result<String> {
    match format {
        Format::Toml => Ok(descriptor_to_toml(descriptor)?),
        Format::Json => Ok(serde_json::to_string_pretty(descriptor)? + "\n"),
        Format::Text => render_text(descriptor),
    }
}

fn render_text(d: &PlatformDescriptor) -> Result<String> {
    let mut out = String::new();
    let module = &d.platform;
    let cpu = &module.cpu;

    writeln!(out, "=== Board: {} ===", d.name())?;
    writeln!(
        out,
        "Version: {}",
        d.package.version_string().unwrap_or_else(|| "(none)".into())
    )?;
    writeln!(out, "Imports: {}", d.package.imports.join(", "))?;
    writeln!(out)?;

    writeln!(out, "--- Module ---")?;
    writeln!(out, "  Name:     {}", module.name)?;
    writeln!(out, "  Inherits: {}", module.inherits.join(", "))?;
    writeln!(
        out,
        "  Flags:    hostonly={} inst={} iobj={} size={} dlg={} init={} norts={}",
        module.flags.host_only as u8,
        module.flags.instantiable as u8,
        module.flags.instance_object as u8,
        module.flags.sizeable as u8,
        module.flags.delegate as u8,
        module.flags.initialized as u8,
        module.flags.no_runtime as u8,
    )?;
    writeln!(out)?;

    writeln!(out, "--- CPU ---")?;
    writeln!(out, "  Module:  {}", cpu.module)?;
    writeln!(out, "  Device:  {}", cpu.device_path())?;
    writeln!(out, "  Clock:   {}", cpu.clock_rate)?;
    writeln!(out, "  Memory regions:")?;
    for region in cpu.memory_map() {
        writeln!(
            out,
            "    {:<8} 0x{:08X} - 0x{:08X} (0x{:X} bytes) [{}] {}",
            region.name,
            region.base,
            region.base.saturating_add(region.len),
            region.len,
            region.access,
            region.space,
        )?;
    }
    match cpu.memory_map().total_len() {
        Some(total) => writeln!(out, "  Total:   0x{total:X} bytes")?,
        None => writeln!(out, "  Total:   (overflow)")?,
    }
    writeln!(out)?;

    writeln!(out, "--- Instance defaults ---")?;
    for (field, region) in d.params.assignments() {
        writeln!(out, "  {field:<12} {region}")?;
    }
    Ok(out)
}

/// Validate a board descriptor, failing if it has errors.
pub fn validate(name: &str, project_dir: Option<&Path>) -> Result<()> {
    let (descriptor, source) = require_descriptor(name, project_dir)?;
    println!("Validating '{name}' ({source})");
    match validate_descriptor(&descriptor) {
        Ok(warnings) => {
            for w in &warnings {
                println!("  warning: {}", w.message);
            }
            println!("ok: '{name}' is valid");
            Ok(())
        }
        Err(issues) => {
            let mut errors = 0;
            for issue in &issues {
                match issue.severity {
                    Severity::Error => {
                        errors += 1;
                        println!("  error:   {}", issue.message);
                    }
                    Severity::Warning => println!("  warning: {}", issue.message),
                }
            }
            bail!("'{name}' has {errors} validation error(s)")
        }
    }
}

/// Write a template descriptor for a new board into `platforms/`.
pub fn add(name: &str, project_dir: &Path) -> Result<PathBuf> {
    if !is_valid_package_name(name) {
        bail!("invalid board name '{name}': expected dot-separated identifiers");
    }
    if board::builtin(name).is_some() {
        bail!("'{name}' is a built-in board");
    }
    let platforms = project_dir.join("platforms");
    let path = platforms.join(format!("{name}{DESCRIPTOR_SUFFIX}"));
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    std::fs::create_dir_all(&platforms).context("creating platforms/ directory")?;
    let content = generate_template(name)?;
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardcfg_model::board::am335x_ddr3_512mb;

    #[test]
    fn text_lists_regions_and_defaults() {
        let text = render(&am335x_ddr3_512mb(), Format::Text).unwrap();
        assert!(text.contains("=== Board: am335x_DDR3_512MB ==="));
        assert!(text.contains("ti.catalog.arm.cortexa8.AM3359"));
        assert!(text.contains("0x402F0400"));
        assert!(text.contains("0x80000000 - 0xA0000000"));
        assert!(text.contains("codeMemory   DDR3"));
        assert!(text.contains("Total:   0x2001FBFF bytes"));
    }

    #[test]
    fn toml_and_json_formats_parse_back() {
        let d = am335x_ddr3_512mb();
        let toml_str = render(&d, Format::Toml).unwrap();
        assert_eq!(boardcfg_model::parse::parse_descriptor_toml(&toml_str).unwrap(), d);
        let json = render(&d, Format::Json).unwrap();
        let back: PlatformDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn describe_unknown_board() {
        assert!(describe("nonexistent", None, Format::Text).is_err());
    }

    #[test]
    fn validate_builtin_board() {
        validate(board::AM335X_DDR3_512MB, None).unwrap();
    }

    #[test]
    fn add_writes_template_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = add("evm", dir.path()).unwrap();
        assert!(path.ends_with("platforms/evm.platform.toml"));
        validate("evm", Some(dir.path())).unwrap();

        assert!(add("evm", dir.path()).is_err());
        assert!(add(board::AM335X_DDR3_512MB, dir.path()).is_err());
    }

    #[test]
    fn add_rejects_names_outside_platforms_dir() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["../x", "a/b", "", ".hidden"] {
            assert!(add(bad, dir.path()).is_err(), "accepted {bad:?}");
        }
        assert!(!dir.path().join("x.platform.toml").exists());
        assert!(!dir.path().join("platforms").exists());
        let path = add("vendor.evm", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("platforms").join("vendor.evm.platform.toml"));
    }

    #[test]
    fn validate_reports_broken_project_board() {
        let dir = tempfile::tempdir().unwrap();
        let path = add("broken", dir.path()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replace("code-memory = \"DDR3\"", "code-memory = \"IRAM\"")).unwrap();
        let err = validate("broken", Some(dir.path())).unwrap_err();
        assert!(err.to_string().contains("1 validation error"));
    }
}
