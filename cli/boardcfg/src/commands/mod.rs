//! CLI command implementations.

pub mod init;
pub mod platform;
pub mod registry;
