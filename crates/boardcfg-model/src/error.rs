//! Error types for platform descriptor operations.

use std::path::PathBuf;

/// Errors that can occur while building, loading or saving descriptors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading/writing descriptor files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Descriptor file not found.
    #[error("descriptor file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Validation error in a descriptor.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },

    /// Access permission string outside the R/W/X vocabulary.
    #[error("invalid access permissions '{value}' (expected a combination of R, W, X)")]
    InvalidAccess { value: String },

    /// Unknown address space tag.
    #[error("invalid address space '{value}' (expected code, data or code/data)")]
    InvalidSpace { value: String },

    /// A memory map already holds a region with this name.
    #[error("duplicate memory region '{name}'")]
    DuplicateRegion { name: String },

    /// `base + len` does not fit in a 64-bit address space.
    #[error("memory region '{name}' overflows the address space (base 0x{base:X}, len 0x{len:X})")]
    AddressOverflow { name: String, base: u64, len: u64 },
}

/// Result type for descriptor operations.
pub type Result<T> = std::result::Result<T, ModelError>;
