//! Built-in board descriptors.

use crate::cpu::CpuInstance;
use crate::descriptor::PlatformDescriptor;
use crate::memory::{Access, AddressSpace, MemoryMap, MemoryRegion};
use crate::package::PackageDescriptor;
use crate::platform::{ModuleFlags, PlatformModule, PlatformParams};

/// Package name of the AM335x board with 512 MB of DDR3.
pub const AM335X_DDR3_512MB: &str = "am335x_DDR3_512MB";

/// Packages every generated board package imports.
pub const BOARD_IMPORTS: [&str; 4] = ["xdc", "xdc.corevers", "xdc.platform", "ti.platforms.generic"];

/// Interface package platform modules inherit from.
pub const PLATFORM_INTERFACE_PACKAGE: &str = "xdc.platform";

/// Look up a built-in board by package name.
pub fn builtin(name: &str) -> Option<PlatformDescriptor> {
    match name {
        AM335X_DDR3_512MB => Some(am335x_ddr3_512mb()),
        _ => None,
    }
}

/// Names and one-line descriptions of the built-in boards.
pub fn builtin_boards() -> Vec<(&'static str, &'static str)> {
    vec![(
        AM335X_DDR3_512MB,
        "TI AM3359 (Cortex-A8) with 127 KiB on-chip SRAM and 512 MiB DDR3",
    )]
}

/// AM335x board: AM3359 device, on-chip SRAM plus 512 MiB of DDR3, with
/// code, data and stack all placed in DDR3.
pub fn am335x_ddr3_512mb() -> PlatformDescriptor {
    let custom_memory_map = MemoryMap::from_literal(vec![
        MemoryRegion::new(
            "SRAM",
            0x402F_0400,
            0x0001_FBFF,
            AddressSpace::CodeData,
            Access::RWX,
        ),
        MemoryRegion::new(
            "DDR3",
            0x8000_0000,
            0x2000_0000, // 512 MiB
            AddressSpace::CodeData,
            Access::RWX,
        ),
    ]);

    let mut package = PackageDescriptor::new(AM335X_DDR3_512MB);
    package.imports = BOARD_IMPORTS.iter().map(|s| s.to_string()).collect();

    PlatformDescriptor {
        package,
        platform: PlatformModule {
            name: format!("{AM335X_DDR3_512MB}.Platform"),
            flags: ModuleFlags::platform(),
            inherits: vec![PLATFORM_INTERFACE_PACKAGE.into()],
            typedefs: vec![
                "xdc.platform.IPlatform.Board".into(),
                "xdc.platform.IPlatform.Memory".into(),
            ],
            cpu: CpuInstance::generic(1000, "ti.catalog.arm.cortexa8", "AM3359", custom_memory_map),
        },
        params: PlatformParams::uniform("DDR3"),
    }
}
