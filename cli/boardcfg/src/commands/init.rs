//! `boardcfg init`: project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{BoardcfgManifest, MANIFEST_FILE};

/// Create a new board project in the directory `name`.
pub fn run(name: &str) -> Result<()> {
    create_project(Path::new(name), name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir.join("platforms"))
        .context("creating platforms/ directory")?;
    fs::write(
        project_dir.join(MANIFEST_FILE),
        BoardcfgManifest::template(name),
    )
    .with_context(|| format!("writing {MANIFEST_FILE}"))?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");
    println!("  {name}/platforms/");
    Ok(())
}
