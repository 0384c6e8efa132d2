//! Typed platform descriptors for board packages.
//!
//! A descriptor is assembled from:
//! - **Package:** name, version components, imports, build artifacts
//! - **Platform module:** capability flags, inherited interfaces, the CPU
//! - **CPU:** device, catalog, clock rate and the board's memory map
//! - **Params:** default code/data/stack placement for platform instances

pub mod board;
pub mod cpu;
pub mod descriptor;
pub mod error;
pub mod memory;
pub mod package;
pub mod parse;
pub mod platform;
pub mod schema;

pub use cpu::{CpuInstance, GENERIC_PLATFORM_MODULE};
pub use descriptor::{Fingerprint, PlatformDescriptor};
pub use error::{ModelError, Result};
pub use memory::{Access, AddressSpace, MemoryMap, MemoryRegion};
pub use package::{LibraryDesc, PackageDescriptor};
pub use parse::{Severity, ValidationIssue};
pub use platform::{ModuleFlags, ParamOverrides, PlatformInstance, PlatformModule, PlatformParams};
pub use schema::{FieldAccess, FieldDecl, FieldType, FieldValue, PlatformSchema, Prototype};
