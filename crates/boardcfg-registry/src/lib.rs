//! Platform registry and descriptor registrar.
//!
//! Board packages are bound into an explicit, caller-owned [`Registry`]
//! by a [`Registrar`], which walks a fixed phase sequence, checks every
//! referenced interface and records the capsule hooks the module
//! supplies before binding the package.
//!
//! # Architecture
//!
//! - [`registry`]: available interfaces, bound packages and their instances
//! - [`capsule`]: optional lifecycle hooks
//! - [`registrar`]: the single registration pass
//! - [`snapshot`]: serializable view for downstream tools

pub mod capsule;
pub mod error;
pub mod registrar;
pub mod registry;
pub mod snapshot;

// Re-exports for convenience.
pub use capsule::{Capsule, HookKind, HookResult};
pub use error::{RegistryError, Result};
pub use registrar::{Phase, Registrar, Registration};
pub use registry::{Mode, RegisteredPackage, Registry, XDC_CORE};
pub use snapshot::{PackageSnapshot, RegistrySnapshot};
