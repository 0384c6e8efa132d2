//! Registry error types.

use boardcfg_model::ModelError;

use crate::capsule::HookKind;

/// Errors that can occur while registering descriptors or creating instances.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A referenced interface, module or package is not in the registry.
    #[error("'{name}' not found (required by '{requester}')")]
    NotFound { name: String, requester: String },

    /// A package is already bound under this name.
    #[error("package '{name}' is already registered")]
    AlreadyBound { name: String },

    /// No registered package has this name.
    #[error("package not registered: {name}")]
    PackageNotFound { name: String },

    /// The module does not allow instances to be created.
    #[error("module '{module}' is not instantiable")]
    NotInstantiable { module: String },

    /// A capsule hook reported failure.
    #[error("{hook} failed: {detail}")]
    Hook { hook: HookKind, detail: String },

    /// Descriptor model error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Package version components do not form a semantic version.
    #[error("invalid package version: {0}")]
    Version(#[from] semver::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
