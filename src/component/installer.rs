//! Component installation and removal.
//!
//! Install never records state: placement is decided from the bitness probe
//! and the filesystem each time. A 32-bit-only prefix receives the 32-bit
//! DLL set in `system32`; a 64-bit-capable prefix receives the 32-bit set in
//! `syswow64` and the 64-bit set in `system32`. Uninstall is idempotent:
//! override entries are deleted unconditionally and files that are already
//! gone are skipped.

use crate::component::{ComponentKind, ToolDirs, DXVK_DLLS, NVNGX_DLLS, SYSTEM_LIB_ROOT};
use crate::core::path::find_files;
use crate::core::{WrunnerError, WrunnerResult};
use crate::env::EnvContext;
use crate::package::{PackageResolver, PackageStore};
use crate::prefix::overrides::RegistryOverrideManager;
use crate::prefix::Prefix;
use crate::runner::bitness::BitnessProbe;
use crate::runner::{PrefixDispatch, RunMode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Installs and removes components for one prefix.
pub struct ComponentInstaller<'a> {
    prefix: &'a Prefix,
    env: &'a EnvContext,
    dispatch: &'a dyn PrefixDispatch,
    probe: &'a dyn BitnessProbe,
    probe_command: Vec<String>,
    store: &'a PackageStore,
    resolver: &'a PackageResolver,
    tools: &'a mut ToolDirs,
    lib_root: PathBuf,
}

impl<'a> ComponentInstaller<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        prefix: &'a Prefix,
        env: &'a EnvContext,
        dispatch: &'a dyn PrefixDispatch,
        probe: &'a dyn BitnessProbe,
        probe_command: Vec<String>,
        store: &'a PackageStore,
        resolver: &'a PackageResolver,
        tools: &'a mut ToolDirs,
    ) -> Self {
        Self {
            prefix,
            env,
            dispatch,
            probe,
            probe_command,
            store,
            resolver,
            tools,
            lib_root: PathBuf::from(SYSTEM_LIB_ROOT),
        }
    }

    /// Override the NVNGX search root (tests point this at a fixture tree).
    pub fn with_lib_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.lib_root = root.into();
        self
    }

    fn probe_64bit(&self) -> bool {
        self.probe.probe(&self.probe_command, self.env)
    }

    fn registry(&self) -> RegistryOverrideManager<'_> {
        RegistryOverrideManager::new(self.dispatch)
    }

    /// Locate a component's package directory, downloading the current
    /// release when no valid directory is known yet.
    fn component_dir(&mut self, kind: ComponentKind) -> WrunnerResult<PathBuf> {
        if let Some(dir) = self.tools.get(kind) {
            if dir.exists() {
                return Ok(dir.clone());
            }
        }

        let dir = self
            .store
            .fetch(self.resolver, kind.releases_url(), kind.cache_subdir())?;

        if !dir.exists() {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "{} directory not found at: {}",
                kind.name(),
                dir.display()
            )));
        }

        self.tools.set(kind, dir.clone());
        Ok(dir)
    }

    /// Copy a DLL into a prefix directory and register a `native` override
    /// for its base name.
    fn place_dll(&self, reg: &RegistryOverrideManager, dll: &Path, dest_dir: &Path) -> WrunnerResult<()> {
        let name = dll
            .file_name()
            .ok_or_else(|| WrunnerError::Parse(format!("Malformed DLL path: {}", dll.display())))?;

        info!("{} -> {}", dll.display(), dest_dir.display());
        fs::copy(dll, dest_dir.join(name))?;
        reg.add(&dll_stem(dll), "native")?;

        Ok(())
    }

    fn remove_if_present(&self, file: &Path) -> WrunnerResult<()> {
        if !file.exists() {
            return Ok(());
        }

        fs::remove_file(file)?;
        info!("Removed: {}", file.display());

        Ok(())
    }

    fn wineboot_update(&self) -> WrunnerResult<()> {
        self.dispatch
            .dispatch(RunMode::Run, &["wineboot".to_string(), "-u".to_string()])
    }

    pub fn install_dxvk(&mut self) -> WrunnerResult<()> {
        let dir = self.component_dir(ComponentKind::Dxvk)?;

        let x32_dir = dir.join("x32");
        let x64_dir = dir.join("x64");
        if !x32_dir.exists() || !x64_dir.exists() {
            return Err(WrunnerError::Component(format!(
                "DXVK x32 or x64 directory not found at: {}",
                dir.display()
            )));
        }

        let dlls_x32: Vec<PathBuf> = DXVK_DLLS.iter().map(|dll| x32_dir.join(dll)).collect();
        let dlls_x64: Vec<PathBuf> = DXVK_DLLS.iter().map(|dll| x64_dir.join(dll)).collect();

        if !dlls_x32.iter().all(|dll| dll.exists()) || !dlls_x64.iter().all(|dll| dll.exists()) {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "Some or all DXVK dlls are missing: {}",
                dir.display()
            )));
        }

        self.prefix.check_system_dirs()?;

        info!("Installing DXVK.");

        let reg = self.registry();

        if !self.probe_64bit() {
            for dll in &dlls_x32 {
                self.place_dll(&reg, dll, &self.prefix.system32_dir())?;
            }
        } else {
            for dll in &dlls_x32 {
                self.place_dll(&reg, dll, &self.prefix.syswow64_dir())?;
            }
            for dll in &dlls_x64 {
                self.place_dll(&reg, dll, &self.prefix.system32_dir())?;
            }
        }

        info!("DXVK installed.");

        Ok(())
    }

    pub fn uninstall_dxvk(&mut self) -> WrunnerResult<()> {
        info!("Uninstalling DXVK.");

        let reg = self.registry();
        for dll in DXVK_DLLS {
            reg.delete(&dll_stem(Path::new(dll)))?;
        }

        for dir in [self.prefix.system32_dir(), self.prefix.syswow64_dir()] {
            for dll in DXVK_DLLS {
                self.remove_if_present(&dir.join(dll))?;
            }
        }

        self.wineboot_update()?;
        info!("DXVK uninstalled.");

        Ok(())
    }

    /// Whether every DXVK DLL is already present for the probed bitness.
    fn dxvk_present(&self, bit64: bool) -> bool {
        let in_dir = |dir: &Path| DXVK_DLLS.iter().all(|dll| dir.join(dll).exists());

        if bit64 {
            in_dir(&self.prefix.syswow64_dir()) && in_dir(&self.prefix.system32_dir())
        } else {
            in_dir(&self.prefix.system32_dir())
        }
    }

    /// Stage the host's NVNGX driver shims into `system32`.
    fn install_nvngx(&self, reg: &RegistryOverrideManager) -> WrunnerResult<()> {
        let shims = find_files(&self.lib_root, &NVNGX_DLLS);
        if shims.is_empty() {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "NVNGX dlls not found under: {}",
                self.lib_root.display()
            )));
        }

        let system32_dir = self.prefix.system32_dir();
        if !system32_dir.exists() {
            return Err(WrunnerError::Prefix(format!(
                "The directory system32 not found in prefix: {}",
                self.prefix.root().display()
            )));
        }

        for shim in shims {
            self.place_dll(reg, &shim, &system32_dir)?;
        }

        Ok(())
    }

    fn uninstall_nvngx(&self, reg: &RegistryOverrideManager) -> WrunnerResult<()> {
        info!("Uninstalling NVNGX.");

        let system32_dir = self.prefix.system32_dir();
        for name in NVNGX_DLLS {
            reg.delete(&dll_stem(Path::new(name)))?;
            self.remove_if_present(&system32_dir.join(name))?;
        }

        info!("NVNGX uninstalled.");

        Ok(())
    }

    pub fn install_nvapi(&mut self) -> WrunnerResult<()> {
        let dir = self.component_dir(ComponentKind::DxvkNvapi)?;
        let bit64 = self.probe_64bit();

        if !self.dxvk_present(bit64) {
            info!("DXVK NVAPI needs DXVK to be installed first, installing DXVK.");
            self.install_dxvk()?;
        }

        let x32_dir = dir.join("x32");
        let x64_dir = dir.join("x64");
        if !x32_dir.exists() || !x64_dir.exists() {
            return Err(WrunnerError::Component(format!(
                "DXVK NVAPI x32 or x64 directory not found at: {}",
                dir.display()
            )));
        }

        let dll_x32 = x32_dir.join("nvapi.dll");
        let dll_x64 = x64_dir.join("nvapi64.dll");
        if !dll_x32.exists() || !dll_x64.exists() {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "Some or all DXVK NVAPI dlls are missing: {}",
                dir.display()
            )));
        }

        self.prefix.check_system_dirs()?;

        info!("Installing DXVK NVAPI.");

        let reg = self.registry();
        self.install_nvngx(&reg)?;

        if !bit64 {
            self.place_dll(&reg, &dll_x32, &self.prefix.system32_dir())?;
        } else {
            self.place_dll(&reg, &dll_x32, &self.prefix.syswow64_dir())?;
            self.place_dll(&reg, &dll_x64, &self.prefix.system32_dir())?;
        }

        info!("DXVK NVAPI installed.");

        Ok(())
    }

    pub fn uninstall_nvapi(&mut self) -> WrunnerResult<()> {
        let bit64 = self.probe_64bit();

        info!("Uninstalling DXVK NVAPI.");

        let system32_dll = self
            .prefix
            .system32_dir()
            .join(if bit64 { "nvapi64.dll" } else { "nvapi.dll" });
        let syswow64_dll = self.prefix.syswow64_dir().join("nvapi.dll");

        self.remove_if_present(&system32_dll)?;
        self.remove_if_present(&syswow64_dll)?;

        let reg = self.registry();
        reg.delete("nvapi64")?;
        reg.delete("nvapi")?;

        self.uninstall_nvngx(&reg)?;
        self.wineboot_update()?;

        info!("DXVK NVAPI uninstalled.");

        Ok(())
    }

    pub fn install_gallium_nine(&mut self) -> WrunnerResult<()> {
        let dir = self.component_dir(ComponentKind::GalliumNine)?;

        let ninewinecfg_32 = dir.join("bin32/ninewinecfg.exe.so");
        let d3d9_32 = dir.join("lib32/d3d9-nine.dll.so");
        let ninewinecfg_64 = dir.join("bin64/ninewinecfg.exe.so");
        let d3d9_64 = dir.join("lib64/d3d9-nine.dll.so");

        self.prefix.check_system_dirs()?;

        let files = [&ninewinecfg_32, &d3d9_32, &ninewinecfg_64, &d3d9_64];
        if !files.iter().all(|file| file.exists()) {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "Some or all Gallium Nine files are missing: {}",
                dir.display()
            )));
        }

        info!("Installing Gallium Nine.");

        let enable = ["ninewinecfg.exe".to_string(), "-e".to_string()];

        if !self.probe_64bit() {
            let system32_dir = self.prefix.system32_dir();
            self.copy_renamed(&ninewinecfg_32, &system32_dir.join("ninewinecfg.exe"))?;
            self.copy_renamed(&d3d9_32, &system32_dir.join("d3d9-nine.dll"))?;
            self.dispatch.dispatch(RunMode::Run, &enable)?;
        } else {
            let syswow64_dir = self.prefix.syswow64_dir();
            self.copy_renamed(&ninewinecfg_32, &syswow64_dir.join("ninewinecfg.exe"))?;
            self.copy_renamed(&d3d9_32, &syswow64_dir.join("d3d9-nine.dll"))?;

            let system32_dir = self.prefix.system32_dir();
            self.copy_renamed(&ninewinecfg_64, &system32_dir.join("ninewinecfg.exe"))?;
            self.copy_renamed(&d3d9_64, &system32_dir.join("d3d9-nine.dll"))?;
            self.dispatch.dispatch(RunMode::Run, &enable)?;
        }

        info!("Gallium Nine installed.");

        Ok(())
    }

    pub fn uninstall_gallium_nine(&mut self) -> WrunnerResult<()> {
        self.dispatch.dispatch(
            RunMode::Run,
            &["ninewinecfg.exe".to_string(), "-d".to_string()],
        )?;

        info!("Uninstalling Gallium Nine.");

        // The disable helper leaves the original d3d9 behind under a backup
        // name; restore it instead of deleting.
        for dir in [self.prefix.system32_dir(), self.prefix.syswow64_dir()] {
            let backup = dir.join("d3d9-nine.bak");
            if backup.exists() {
                let restored = dir.join("d3d9.dll");
                fs::rename(&backup, &restored)?;
                info!(
                    "Renamed file: {} -> {}",
                    backup.display(),
                    restored.display()
                );
            }
        }

        for dir in [self.prefix.system32_dir(), self.prefix.syswow64_dir()] {
            self.remove_if_present(&dir.join("d3d9-nine.dll"))?;
            self.remove_if_present(&dir.join("ninewinecfg.exe"))?;
        }

        info!("Gallium Nine uninstalled.");

        Ok(())
    }

    fn copy_renamed(&self, source: &Path, dest: &Path) -> WrunnerResult<()> {
        info!(
            "{} -> {}",
            source.display(),
            dest.parent().unwrap_or(dest).display()
        );
        fs::copy(source, dest)?;
        Ok(())
    }
}

/// Base name of a DLL without its extension (`dxgi.dll` -> `dxgi`).
fn dll_stem(dll: &Path) -> String {
    dll.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dll_stem() {
        assert_eq!(dll_stem(Path::new("/x64/dxgi.dll")), "dxgi");
        assert_eq!(dll_stem(Path::new("_nvngx.dll")), "_nvngx");
        assert_eq!(dll_stem(Path::new("nvapi64.dll")), "nvapi64");
    }
}
