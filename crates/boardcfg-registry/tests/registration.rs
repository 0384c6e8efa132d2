//! Integration tests for registering board packages and creating instances.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use boardcfg_model::board::{am335x_ddr3_512mb, AM335X_DDR3_512MB};
use boardcfg_model::{
    Access, AddressSpace, MemoryMap, MemoryRegion, ModelError, ParamOverrides,
};
use boardcfg_registry::{
    Capsule, HookKind, Mode, Phase, Registrar, Registry, RegistryError,
};

const MODULE: &str = "am335x_DDR3_512MB.Platform";

fn bound_registry(capsule: Capsule) -> Registry {
    let mut registry = Registry::with_xdc_core(Mode::Config);
    Registrar::new(am335x_ddr3_512mb())
        .with_capsule(capsule)
        .register(&mut registry)
        .expect("register board");
    registry
}

#[test]
fn board_binds_with_exact_memory_map() {
    let registry = bound_registry(Capsule::new());
    let pkg = registry.find(AM335X_DDR3_512MB).expect("bound");
    let map = pkg.descriptor().memory_map();
    assert_eq!(map.len(), 2);

    let sram = map.get("SRAM").expect("SRAM");
    assert_eq!(sram.base, 0x402F_0400);
    assert_eq!(sram.len, 0x0001_FBFF);
    assert_eq!(sram.space, AddressSpace::CodeData);
    assert_eq!(sram.access, Access::RWX);

    let ddr3 = map.get("DDR3").expect("DDR3");
    assert_eq!(ddr3.base, 0x8000_0000);
    assert_eq!(ddr3.len, 0x2000_0000);
    assert_eq!(ddr3.space, AddressSpace::CodeData);
    assert_eq!(ddr3.access, Access::RWX);

    let cpu = &pkg.descriptor().platform.cpu;
    assert_eq!(cpu.clock_rate, 1000);
    assert_eq!(cpu.catalog_name, "ti.catalog.arm.cortexa8");
    assert_eq!(cpu.device_name, "AM3359");
}

#[test]
fn duplicate_registration_leaves_registry_unchanged() {
    let mut registry = bound_registry(Capsule::new());
    let before = registry.snapshot();

    let err = Registrar::new(am335x_ddr3_512mb())
        .register(&mut registry)
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyBound { ref name } if name == AM335X_DDR3_512MB));
    assert_eq!(registry.snapshot(), before);
    assert_eq!(registry.modules(), &[MODULE.to_string()]);
}

#[test]
fn missing_interface_binds_nothing() {
    let mut registry = Registry::new(Mode::Config);
    let err = Registrar::new(am335x_ddr3_512mb())
        .register(&mut registry)
        .unwrap_err();
    match err {
        RegistryError::NotFound { name, requester } => {
            assert_eq!(name, "xdc");
            assert_eq!(requester, AM335X_DDR3_512MB);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(registry.packages().count(), 0);
    assert!(registry.modules().is_empty());
}

#[test]
fn missing_cpu_module_is_reported() {
    let mut registry = Registry::new(Mode::Config);
    for name in boardcfg_registry::XDC_CORE {
        if !name.starts_with("ti.platforms.generic.Platform") {
            registry.provide(name);
        }
    }
    let err = Registrar::new(am335x_ddr3_512mb())
        .register(&mut registry)
        .unwrap_err();
    assert!(
        matches!(err, RegistryError::NotFound { ref name, .. } if name.starts_with("ti.platforms.generic.Platform"))
    );
    assert!(registry.find(AM335X_DDR3_512MB).is_none());
}

#[test]
fn default_instance_uses_ddr3() {
    let mut registry = bound_registry(Capsule::new());
    let inst = registry
        .create_instance(AM335X_DDR3_512MB, "board", &ParamOverrides::default())
        .expect("create");
    assert_eq!(inst.index, 0);
    assert_eq!(inst.module, MODULE);
    assert_eq!(inst.params.code_memory, "DDR3");
    assert_eq!(inst.params.data_memory, "DDR3");
    assert_eq!(inst.params.stack_memory, "DDR3");
}

#[test]
fn overrides_and_instance_indices() {
    let mut registry = bound_registry(Capsule::new());
    registry
        .create_instance(AM335X_DDR3_512MB, "first", &ParamOverrides::default())
        .expect("first");
    let overrides = ParamOverrides {
        stack_memory: Some("SRAM".into()),
        ..ParamOverrides::default()
    };
    let second = registry
        .create_instance(AM335X_DDR3_512MB, "second", &overrides)
        .expect("second");
    assert_eq!(second.index, 1);
    assert_eq!(second.params.code_memory, "DDR3");
    assert_eq!(second.params.stack_memory, "SRAM");

    let pkg = registry.find(AM335X_DDR3_512MB).expect("bound");
    assert_eq!(pkg.instances().len(), 2);
    // Defaults are untouched by overrides.
    assert_eq!(pkg.descriptor().params.stack_memory, "DDR3");
}

#[test]
fn override_to_unknown_region_is_rejected() {
    let mut registry = bound_registry(Capsule::new());
    let overrides = ParamOverrides {
        code_memory: Some("IRAM".into()),
        ..ParamOverrides::default()
    };
    let err = registry
        .create_instance(AM335X_DDR3_512MB, "board", &overrides)
        .unwrap_err();
    match err {
        RegistryError::Model(ModelError::Validation { detail }) => {
            assert!(detail.contains("IRAM"), "detail: {detail}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(registry.find(AM335X_DDR3_512MB).expect("bound").instances().is_empty());
}

#[test]
fn custom_memory_map_override_is_honoured() {
    let mut registry = bound_registry(Capsule::new());
    let iram = MemoryMap::from_regions([MemoryRegion::new(
        "IRAM",
        0x4030_0000,
        0x1_0000,
        AddressSpace::CodeData,
        Access::RWX,
    )])
    .expect("map");
    let overrides = ParamOverrides {
        code_memory: Some("IRAM".into()),
        data_memory: Some("IRAM".into()),
        stack_memory: Some("IRAM".into()),
        custom_memory_map: Some(iram),
        ..ParamOverrides::default()
    };
    let inst = registry
        .create_instance(AM335X_DDR3_512MB, "iram", &overrides)
        .expect("create");
    assert_eq!(inst.params.code_memory, "IRAM");
}

#[test]
fn absent_hooks_are_not_recorded() {
    let registry = bound_registry(Capsule::new());
    for kind in HookKind::ALL {
        assert!(!registry.has_hook(MODULE, kind), "{kind} should be absent");
    }
    let pkg = registry.find(AM335X_DDR3_512MB).expect("bound");
    assert_eq!(pkg.hooks().count(), 0);
    // Using a module without `module$use` is a no-op.
    registry.use_module(AM335X_DDR3_512MB).expect("use");
}

#[test]
fn present_hooks_are_recorded_and_invoked() {
    let meta_init = Arc::new(AtomicUsize::new(0));
    let uses = Arc::new(AtomicUsize::new(0));
    let (m, u) = (Arc::clone(&meta_init), Arc::clone(&uses));
    let capsule = Capsule::new()
        .on_module_meta_init(move |module| {
            m.fetch_add(1, Ordering::SeqCst);
            module.flags.host_only = true;
            Ok(())
        })
        .on_module_use(move |_| {
            u.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .on_instance_meta_init(|inst| {
            inst.params.stack_memory = "SRAM".into();
            Ok(())
        })
        .on_get_link_template(|_| "ti/platforms/generic/linkcmd.xdt".into());

    let mut registry = bound_registry(capsule);
    assert_eq!(meta_init.load(Ordering::SeqCst), 1);
    assert!(registry.has_hook(MODULE, HookKind::ModuleMetaInit));
    assert!(registry.has_hook(MODULE, HookKind::InstanceMetaInit));
    assert!(registry.has_hook(MODULE, HookKind::GetLinkTemplate));
    assert!(!registry.has_hook(MODULE, HookKind::ModuleValidate));

    registry.use_module(AM335X_DDR3_512MB).expect("use");
    registry.use_module(AM335X_DDR3_512MB).expect("use");
    assert_eq!(uses.load(Ordering::SeqCst), 2);

    let inst = registry
        .create_instance(AM335X_DDR3_512MB, "board", &ParamOverrides::default())
        .expect("create")
        .clone();
    assert_eq!(inst.params.stack_memory, "SRAM");

    let pkg = registry.find(AM335X_DDR3_512MB).expect("bound");
    assert_eq!(
        pkg.query(HookKind::GetLinkTemplate, &inst).as_deref(),
        Some("ti/platforms/generic/linkcmd.xdt")
    );
    assert!(pkg.query(HookKind::GetExecCmd, &inst).is_none());
}

#[test]
fn failing_hook_aborts_registration() {
    let mut registry = Registry::with_xdc_core(Mode::Config);
    let capsule = Capsule::new().on_module_validate(|_| Err("clock too slow".into()));
    let err = Registrar::new(am335x_ddr3_512mb())
        .with_capsule(capsule)
        .register(&mut registry)
        .unwrap_err();
    match err {
        RegistryError::Hook { hook, detail } => {
            assert_eq!(hook, HookKind::ModuleValidate);
            assert_eq!(detail, "clock too slow");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(registry.find(AM335X_DDR3_512MB).is_none());
}

#[test]
fn failing_instance_hook_creates_nothing() {
    let capsule = Capsule::new().on_instance_meta_init(|_| Err("no".into()));
    let mut registry = bound_registry(capsule);
    let err = registry
        .create_instance(AM335X_DDR3_512MB, "board", &ParamOverrides::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Hook {
            hook: HookKind::InstanceMetaInit,
            ..
        }
    ));
    assert!(registry.find(AM335X_DDR3_512MB).expect("bound").instances().is_empty());
}

#[test]
fn introspection_mode_runs_rov() {
    let mut registry = Registry::with_xdc_core(Mode::Introspection);
    let reg = Registrar::new(am335x_ddr3_512mb())
        .register(&mut registry)
        .expect("register");
    assert!(reg.phases.contains(&Phase::Rov));
    assert_eq!(reg.phases.first(), Some(&Phase::Imports));
    assert_eq!(reg.phases.last(), Some(&Phase::Initialization));
    assert_eq!(registry.snapshot().mode, Mode::Introspection);
}

#[test]
fn placement_warnings_do_not_block_registration() {
    let mut descriptor = am335x_ddr3_512mb();
    descriptor.platform.cpu.custom_memory_map = MemoryMap::from_regions([
        MemoryRegion::new("SRAM", 0x402F_0400, 0x0001_FBFF, AddressSpace::CodeData, Access::RWX),
        MemoryRegion::new("DDR3", 0x8000_0000, 0x2000_0000, AddressSpace::Data, Access::RW),
    ])
    .expect("map");

    let mut registry = Registry::with_xdc_core(Mode::Config);
    let reg = Registrar::new(descriptor)
        .register(&mut registry)
        .expect("register");
    assert!(!reg.warnings.is_empty());
    assert!(reg.warnings.iter().any(|w| w.contains("DDR3")));
}

#[test]
fn enumeration_follows_bind_order() {
    let mut registry = bound_registry(Capsule::new());
    let mut second = am335x_ddr3_512mb();
    second.package.name = "evm_board".into();
    second.platform.name = "evm_board.Platform".into();
    Registrar::new(second)
        .register(&mut registry)
        .expect("register second");

    let names: Vec<&str> = registry.packages().map(|p| p.name()).collect();
    assert_eq!(names, vec![AM335X_DDR3_512MB, "evm_board"]);
    assert_eq!(
        registry.modules(),
        &[MODULE.to_string(), "evm_board.Platform".to_string()]
    );
    // Bound modules become available to later packages.
    assert!(registry.is_available(MODULE));
}

#[test]
fn meta_init_cannot_change_cpu_literals() {
    let capsule = Capsule::new().on_module_meta_init(|module| {
        module.cpu.clock_rate = 5;
        module.cpu.device_name = "OTHER".into();
        module.cpu.custom_memory_map = MemoryMap::new();
        Ok(())
    });
    let registry = bound_registry(capsule);
    let pkg = registry.find(AM335X_DDR3_512MB).expect("bound");
    let cpu = &pkg.descriptor().platform.cpu;
    assert_eq!(cpu.clock_rate, 1000);
    assert_eq!(cpu.device_name, "AM3359");
    assert_eq!(
        cpu.memory_map().names().collect::<Vec<_>>(),
        vec!["SRAM", "DDR3"]
    );
    assert_eq!(pkg.fingerprint(), &am335x_ddr3_512mb().fingerprint().expect("fingerprint"));
}

#[test]
fn meta_init_rename_is_rejected() {
    let mut registry = Registry::with_xdc_core(Mode::Config);
    let capsule = Capsule::new().on_module_meta_init(|module| {
        module.name = "elsewhere.Platform".into();
        Ok(())
    });
    let err = Registrar::new(am335x_ddr3_512mb())
        .with_capsule(capsule)
        .register(&mut registry)
        .unwrap_err();
    match err {
        RegistryError::Hook { hook, detail } => {
            assert_eq!(hook, HookKind::ModuleMetaInit);
            assert!(detail.contains("elsewhere.Platform"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(registry.packages().count(), 0);
    assert!(!registry.is_available("elsewhere.Platform"));
}

#[test]
fn nested_module_name_is_rejected() {
    let mut descriptor = am335x_ddr3_512mb();
    descriptor.platform.name = format!("{AM335X_DDR3_512MB}.sub.Platform");
    let mut registry = Registry::with_xdc_core(Mode::Config);
    let err = Registrar::new(descriptor)
        .register(&mut registry)
        .unwrap_err();
    assert!(matches!(err, RegistryError::Model(ModelError::Validation { .. })));
    assert_eq!(registry.packages().count(), 0);
    assert!(registry.modules().is_empty());
}

#[test]
fn unit_names_are_enumerable() {
    let registry = bound_registry(Capsule::new());
    let pkg = registry.find(AM335X_DDR3_512MB).expect("bound");
    assert_eq!(pkg.unit_names(), vec!["Platform"]);
    let snap = registry.snapshot();
    assert_eq!(
        snap.package(AM335X_DDR3_512MB).expect("snapshot").unit_names,
        vec!["Platform".to_string()]
    );
}
