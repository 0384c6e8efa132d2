//! boardcfg: inspect, validate and register board platform descriptors.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};

use boardcfg_registry::Mode;
use commands::platform::Format;
use commands::registry::MemoryFlags;
use manifest::{BoardcfgManifest, MANIFEST_FILE};

#[derive(Parser)]
#[command(name = "boardcfg", version, about = "Board platform descriptors and registry")]
struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new board project
    Init {
        /// Project name
        name: String,
    },
    /// List built-in and project boards
    List,
    /// Show details of a board
    Describe {
        /// Board name (default: [platform] default in boardcfg.toml)
        name: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Validate a board descriptor
    Validate {
        /// Board name (default: [platform] default in boardcfg.toml)
        name: Option<String>,
    },
    /// Add a template descriptor to platforms/
    Add {
        /// Package name of the new board
        name: String,
    },
    /// Register a board and print the registry snapshot as JSON
    Register {
        /// Board name (default: [platform] default in boardcfg.toml)
        name: Option<String>,
        /// Registry mode: cfg or rov
        #[arg(long)]
        mode: Option<String>,
    },
    /// Register a board and create one platform instance
    Instance {
        /// Board name (default: [platform] default in boardcfg.toml)
        name: Option<String>,
        /// Registry mode: cfg or rov
        #[arg(long)]
        mode: Option<String>,
        /// Region for code sections
        #[arg(long)]
        code_memory: Option<String>,
        /// Region for data sections
        #[arg(long)]
        data_memory: Option<String>,
        /// Region for the stack
        #[arg(long)]
        stack_memory: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::List => {
            let (_, project_dir) = load_manifest_optional(&cwd)?;
            commands::platform::list(Some(&project_dir.unwrap_or(cwd)))
        }

        Commands::Describe { name, format } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let name = board_name(name, manifest.as_ref())?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::platform::describe(&name, Some(&project_dir), format)
        }

        Commands::Validate { name } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let name = board_name(name, manifest.as_ref())?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::platform::validate(&name, Some(&project_dir))
        }

        Commands::Add { name } => {
            let (_, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::platform::add(&name, &project_dir).map(|_| ())
        }

        Commands::Register { name, mode } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let name = board_name(name, manifest.as_ref())?;
            let mode = registry_mode(mode.as_deref(), manifest.as_ref());
            let project_dir = project_dir.unwrap_or(cwd);
            commands::registry::register(&name, Some(&project_dir), mode)
        }

        Commands::Instance {
            name,
            mode,
            code_memory,
            data_memory,
            stack_memory,
        } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let name = board_name(name, manifest.as_ref())?;
            let mode = registry_mode(mode.as_deref(), manifest.as_ref());
            let configured = manifest
                .as_ref()
                .map(BoardcfgManifest::overrides)
                .unwrap_or_default();
            let overrides = MemoryFlags {
                code_memory,
                data_memory,
                stack_memory,
            }
            .over(configured);
            let project_dir = project_dir.unwrap_or(cwd);
            commands::registry::instance(&name, Some(&project_dir), mode, &overrides)
        }
    }
}

/// The board named on the command line, else the configured default.
fn board_name(name: Option<String>, manifest: Option<&BoardcfgManifest>) -> anyhow::Result<String> {
    match name.or_else(|| manifest.and_then(|m| m.default_platform().map(str::to_string))) {
        Some(name) => Ok(name),
        None => anyhow::bail!(
            "no board given and no [platform] default in {}",
            MANIFEST_FILE
        ),
    }
}

/// `--mode` wins over `[registry] mode`; the default is `cfg`.
fn registry_mode(flag: Option<&str>, manifest: Option<&BoardcfgManifest>) -> Mode {
    match flag {
        Some(flag) => flag.parse().unwrap_or_default(),
        None => manifest.and_then(BoardcfgManifest::mode).unwrap_or_default(),
    }
}

/// Try to load a manifest from the current directory upward. Returns (None, None) if not found.
fn load_manifest_optional(
    cwd: &Path,
) -> anyhow::Result<(Option<BoardcfgManifest>, Option<PathBuf>)> {
    match BoardcfgManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}
