//! Package records.

use serde::{Deserialize, Serialize};

/// A library produced by building a package, with its target suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LibraryDesc {
    /// Library path relative to the package base.
    pub path: String,
    /// Target the library was built for (e.g., "gnu.targets.arm.A8F").
    pub target: String,
    /// Library file suffix (e.g., "a8fg").
    pub suffix: String,
}

/// The distributable unit that exports a platform module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageDescriptor {
    /// Package name (e.g., "am335x_DDR3_512MB").
    pub name: String,
    /// Version components, most significant first. Generated board
    /// packages usually carry none.
    #[serde(default)]
    pub version: Vec<u64>,
    /// Packages loaded before this one.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Build artifact paths.
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub lib_desc: Vec<LibraryDesc>,
    /// Directory containing the package, when installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_base: Option<String>,
    /// Repository the package was found in, when installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_repository: Option<String>,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Vec::new(),
            imports: Vec::new(),
            libraries: Vec::new(),
            lib_desc: Vec::new(),
            package_base: None,
            package_repository: None,
        }
    }

    /// Dotted version string, or `None` when the package is unversioned.
    pub fn version_string(&self) -> Option<String> {
        if self.version.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.version.iter().map(u64::to_string).collect();
        Some(parts.join("."))
    }

    /// Prefix used for qualified names inside this package.
    pub fn qualifier(&self) -> String {
        format!("{}.", self.name)
    }

    /// Whether `module` is exactly `<package>.<Unit>`.
    pub fn owns_module(&self, module: &str) -> bool {
        module
            .strip_prefix(&self.qualifier())
            .is_some_and(is_identifier)
    }
}

/// Whether `name` is a dotted package name: one or more non-empty
/// segments of ASCII letters, digits and `_`.
pub fn is_valid_package_name(name: &str) -> bool {
    name.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unversioned_package() {
        let pkg = PackageDescriptor::new("board");
        assert!(pkg.version_string().is_none());
        assert_eq!(pkg.qualifier(), "board.");
    }

    #[test]
    fn dotted_version() {
        let mut pkg = PackageDescriptor::new("board");
        pkg.version = vec![1, 0, 2];
        assert_eq!(pkg.version_string().as_deref(), Some("1.0.2"));
    }

    #[test]
    fn module_must_be_a_direct_unit() {
        let pkg = PackageDescriptor::new("am335x_DDR3_512MB");
        assert!(pkg.owns_module("am335x_DDR3_512MB.Platform"));
        assert!(!pkg.owns_module("am335x_DDR3_512MB.sub.Platform"));
        assert!(!pkg.owns_module("am335x_DDR3_512MB."));
        assert!(!pkg.owns_module("elsewhere.Platform"));

        let dotted = PackageDescriptor::new("ti.platforms.evm");
        assert!(dotted.owns_module("ti.platforms.evm.Platform"));
    }

    #[test]
    fn package_names() {
        assert!(is_valid_package_name("am335x_DDR3_512MB"));
        assert!(is_valid_package_name("ti.platforms.evm"));
        for bad in ["", "../x", "a/b", "a\\b", ".hidden", "a..b", "trailing.", "sp ace"] {
            assert!(!is_valid_package_name(bad), "{bad:?} accepted");
        }
    }
}
