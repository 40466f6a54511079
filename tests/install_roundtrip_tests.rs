//! Install/uninstall round-trips against a temporary prefix.
//!
//! The bitness probe is fixed, dispatch is recorded instead of spawning
//! wine, and component packages are pre-seeded directories, so the whole
//! flow runs offline.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wrunner::component::{ComponentInstaller, ToolDirs, DXVK_DLLS, NVNGX_DLLS};
use wrunner::env::EnvContext;
use wrunner::package::{PackageResolver, PackageStore};
use wrunner::prefix::Prefix;
use wrunner::runner::bitness::FixedProbe;
use wrunner::runner::RecordingDispatch;

struct Fixture {
    _temp: TempDir,
    prefix: Prefix,
    env: EnvContext,
    store: PackageStore,
    resolver: PackageResolver,
    tools: ToolDirs,
    lib_root: PathBuf,
}

impl Fixture {
    /// Build a prefix with packages for every component already on disk.
    fn new(bit64: bool) -> Self {
        let temp = TempDir::new().unwrap();
        let app_dir = temp.path().join("app");
        let prefix = Prefix::new(&app_dir);

        fs::create_dir_all(prefix.system32_dir()).unwrap();
        if bit64 {
            fs::create_dir_all(prefix.syswow64_dir()).unwrap();
        }

        let dxvk_dir = temp.path().join("packages/dxvk-2.3");
        for sub in ["x32", "x64"] {
            let dir = dxvk_dir.join(sub);
            fs::create_dir_all(&dir).unwrap();
            for dll in DXVK_DLLS {
                fs::write(dir.join(dll), b"dxvk").unwrap();
            }
        }

        let nvapi_dir = temp.path().join("packages/dxvk-nvapi-0.7");
        fs::create_dir_all(nvapi_dir.join("x32")).unwrap();
        fs::create_dir_all(nvapi_dir.join("x64")).unwrap();
        fs::write(nvapi_dir.join("x32/nvapi.dll"), b"nvapi").unwrap();
        fs::write(nvapi_dir.join("x64/nvapi64.dll"), b"nvapi64").unwrap();

        let nine_dir = temp.path().join("packages/gallium-nine-0.9");
        for sub in ["bin32", "bin64", "lib32", "lib64"] {
            fs::create_dir_all(nine_dir.join(sub)).unwrap();
        }
        fs::write(nine_dir.join("bin32/ninewinecfg.exe.so"), b"cfg32").unwrap();
        fs::write(nine_dir.join("bin64/ninewinecfg.exe.so"), b"cfg64").unwrap();
        fs::write(nine_dir.join("lib32/d3d9-nine.dll.so"), b"nine32").unwrap();
        fs::write(nine_dir.join("lib64/d3d9-nine.dll.so"), b"nine64").unwrap();

        let lib_root = temp.path().join("usr-lib/nvidia");
        fs::create_dir_all(&lib_root).unwrap();
        for dll in NVNGX_DLLS {
            fs::write(lib_root.join(dll), b"shim").unwrap();
        }

        let store = PackageStore::new(temp.path().join("downloads"));
        let resolver = PackageResolver::new().unwrap();

        let tools = ToolDirs {
            dxvk: Some(dxvk_dir),
            dxvk_nvapi: Some(nvapi_dir),
            gallium_nine: Some(nine_dir),
        };

        Self {
            _temp: temp,
            prefix,
            env: EnvContext::new(),
            store,
            resolver,
            tools,
            lib_root,
        }
    }

    fn installer<'a>(
        &'a mut self,
        dispatch: &'a RecordingDispatch,
        probe: &'a FixedProbe,
    ) -> ComponentInstaller<'a> {
        ComponentInstaller::new(
            &self.prefix,
            &self.env,
            dispatch,
            probe,
            vec!["winepath".to_string()],
            &self.store,
            &self.resolver,
            &mut self.tools,
        )
        .with_lib_root(&self.lib_root)
    }
}

fn reg_ops(dispatch: &RecordingDispatch, op: &str) -> Vec<String> {
    dispatch
        .calls()
        .into_iter()
        .filter(|(_, args)| args.first().map(String::as_str) == Some("reg"))
        .filter(|(_, args)| args.get(1).map(String::as_str) == Some(op))
        .map(|(_, args)| args[4].clone())
        .collect()
}

fn no_dlls_in(dir: &Path, dlls: &[&str]) -> bool {
    dlls.iter().all(|dll| !dir.join(dll).exists())
}

#[test]
fn test_dxvk_roundtrip_64bit() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    fixture
        .installer(&dispatch, &probe)
        .install_dxvk()
        .unwrap();

    let system32 = fixture.prefix.system32_dir();
    let syswow64 = fixture.prefix.syswow64_dir();
    for dll in DXVK_DLLS {
        assert!(system32.join(dll).exists(), "{} missing in system32", dll);
        assert!(syswow64.join(dll).exists(), "{} missing in syswow64", dll);
    }

    // One native override per copied DLL: 4 into syswow64 + 4 into system32.
    assert_eq!(reg_ops(&dispatch, "add").len(), 8);

    fixture
        .installer(&dispatch, &probe)
        .uninstall_dxvk()
        .unwrap();

    assert!(no_dlls_in(&system32, &DXVK_DLLS));
    assert!(no_dlls_in(&syswow64, &DXVK_DLLS));

    // Every DXVK DLL base name had its override deleted.
    let deleted = reg_ops(&dispatch, "delete");
    for dll in DXVK_DLLS {
        let stem = dll.trim_end_matches(".dll");
        assert!(deleted.iter().any(|name| name == stem), "{} not deleted", stem);
    }
}

#[test]
fn test_dxvk_roundtrip_32bit() {
    let mut fixture = Fixture::new(false);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(false);

    fixture
        .installer(&dispatch, &probe)
        .install_dxvk()
        .unwrap();

    let system32 = fixture.prefix.system32_dir();
    for dll in DXVK_DLLS {
        assert!(system32.join(dll).exists());
    }
    // 32-bit-only: a single set of overrides.
    assert_eq!(reg_ops(&dispatch, "add").len(), 4);

    fixture
        .installer(&dispatch, &probe)
        .uninstall_dxvk()
        .unwrap();

    assert!(no_dlls_in(&system32, &DXVK_DLLS));
}

#[test]
fn test_dxvk_uninstall_is_idempotent() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    fixture
        .installer(&dispatch, &probe)
        .install_dxvk()
        .unwrap();
    fixture
        .installer(&dispatch, &probe)
        .uninstall_dxvk()
        .unwrap();
    // Second pass finds nothing to remove and still succeeds.
    fixture
        .installer(&dispatch, &probe)
        .uninstall_dxvk()
        .unwrap();
}

#[test]
fn test_uninstall_without_install_succeeds() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    fixture
        .installer(&dispatch, &probe)
        .uninstall_dxvk()
        .unwrap();
    fixture
        .installer(&dispatch, &probe)
        .uninstall_nvapi()
        .unwrap();
    fixture
        .installer(&dispatch, &probe)
        .uninstall_gallium_nine()
        .unwrap();
}

#[test]
fn test_nvapi_roundtrip_64bit_installs_dxvk_dependency() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    fixture
        .installer(&dispatch, &probe)
        .install_nvapi()
        .unwrap();

    let system32 = fixture.prefix.system32_dir();
    let syswow64 = fixture.prefix.syswow64_dir();

    // The dependency edge pulled DXVK in first.
    for dll in DXVK_DLLS {
        assert!(system32.join(dll).exists());
        assert!(syswow64.join(dll).exists());
    }
    assert!(system32.join("nvapi64.dll").exists());
    assert!(syswow64.join("nvapi.dll").exists());
    // NVNGX shims staged into system32.
    for dll in NVNGX_DLLS {
        assert!(system32.join(dll).exists());
    }

    fixture
        .installer(&dispatch, &probe)
        .uninstall_nvapi()
        .unwrap();

    assert!(!system32.join("nvapi64.dll").exists());
    assert!(!syswow64.join("nvapi.dll").exists());
    assert!(no_dlls_in(&system32, &NVNGX_DLLS));

    let deleted = reg_ops(&dispatch, "delete");
    for name in ["nvapi64", "nvapi", "_nvngx", "nvngx"] {
        assert!(deleted.iter().any(|n| n == name), "{} not deleted", name);
    }
}

#[test]
fn test_nvapi_roundtrip_32bit() {
    let mut fixture = Fixture::new(false);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(false);

    fixture
        .installer(&dispatch, &probe)
        .install_nvapi()
        .unwrap();

    let system32 = fixture.prefix.system32_dir();
    assert!(system32.join("nvapi.dll").exists());
    assert!(!system32.join("nvapi64.dll").exists());

    fixture
        .installer(&dispatch, &probe)
        .uninstall_nvapi()
        .unwrap();

    assert!(!system32.join("nvapi.dll").exists());
    assert!(no_dlls_in(&system32, &NVNGX_DLLS));
}

#[test]
fn test_nvapi_skips_dxvk_when_already_present() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    fixture
        .installer(&dispatch, &probe)
        .install_dxvk()
        .unwrap();
    let adds_after_dxvk = reg_ops(&dispatch, "add").len();

    fixture
        .installer(&dispatch, &probe)
        .install_nvapi()
        .unwrap();

    // nvapi.dll + nvapi64.dll + two NVNGX shims, but no second DXVK pass.
    assert_eq!(reg_ops(&dispatch, "add").len(), adds_after_dxvk + 4);
}

#[test]
fn test_gallium_nine_roundtrip_64bit() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    fixture
        .installer(&dispatch, &probe)
        .install_gallium_nine()
        .unwrap();

    let system32 = fixture.prefix.system32_dir();
    let syswow64 = fixture.prefix.syswow64_dir();
    assert!(system32.join("ninewinecfg.exe").exists());
    assert!(system32.join("d3d9-nine.dll").exists());
    assert!(syswow64.join("ninewinecfg.exe").exists());
    assert!(syswow64.join("d3d9-nine.dll").exists());

    // The enable helper ran inside the prefix.
    assert!(dispatch
        .calls()
        .iter()
        .any(|(_, args)| args == &vec!["ninewinecfg.exe".to_string(), "-e".to_string()]));

    fixture
        .installer(&dispatch, &probe)
        .uninstall_gallium_nine()
        .unwrap();

    for dir in [&system32, &syswow64] {
        assert!(!dir.join("ninewinecfg.exe").exists());
        assert!(!dir.join("d3d9-nine.dll").exists());
    }
    assert!(dispatch
        .calls()
        .iter()
        .any(|(_, args)| args == &vec!["ninewinecfg.exe".to_string(), "-d".to_string()]));
}

#[test]
fn test_gallium_nine_roundtrip_32bit() {
    let mut fixture = Fixture::new(false);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(false);

    fixture
        .installer(&dispatch, &probe)
        .install_gallium_nine()
        .unwrap();

    let system32 = fixture.prefix.system32_dir();
    assert_eq!(
        fs::read(system32.join("d3d9-nine.dll")).unwrap(),
        b"nine32"
    );

    fixture
        .installer(&dispatch, &probe)
        .uninstall_gallium_nine()
        .unwrap();

    assert!(!system32.join("d3d9-nine.dll").exists());
}

#[test]
fn test_gallium_nine_uninstall_restores_backup() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    let system32 = fixture.prefix.system32_dir();
    fs::write(system32.join("d3d9-nine.bak"), b"original d3d9").unwrap();

    fixture
        .installer(&dispatch, &probe)
        .uninstall_gallium_nine()
        .unwrap();

    assert!(!system32.join("d3d9-nine.bak").exists());
    assert_eq!(
        fs::read(system32.join("d3d9.dll")).unwrap(),
        b"original d3d9"
    );
}

#[test]
fn test_install_fails_without_system_dirs() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    fs::remove_dir_all(fixture.prefix.system32_dir()).unwrap();
    fs::remove_dir_all(fixture.prefix.syswow64_dir()).unwrap();

    assert!(fixture
        .installer(&dispatch, &probe)
        .install_dxvk()
        .is_err());
}

#[test]
fn test_install_fails_on_incomplete_package() {
    let mut fixture = Fixture::new(true);
    let dispatch = RecordingDispatch::new();
    let probe = FixedProbe(true);

    let dxvk_dir = fixture.tools.dxvk.clone().unwrap();
    fs::remove_file(dxvk_dir.join("x64/dxgi.dll")).unwrap();

    assert!(fixture
        .installer(&dispatch, &probe)
        .install_dxvk()
        .is_err());
}
