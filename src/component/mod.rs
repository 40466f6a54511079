//! Installable component catalog.

pub mod installer;

pub use installer::ComponentInstaller;

use std::path::PathBuf;

/// DLLs a DXVK release must provide for each bitness.
pub const DXVK_DLLS: [&str; 4] = ["d3d10core.dll", "d3d11.dll", "d3d9.dll", "dxgi.dll"];

/// NVIDIA driver shim DLLs staged alongside DXVK-NVAPI.
pub const NVNGX_DLLS: [&str; 2] = ["_nvngx.dll", "nvngx.dll"];

/// Where the host's NVNGX driver shims are searched for.
pub const SYSTEM_LIB_ROOT: &str = "/usr/lib";

/// The components this crate can install into a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Dxvk,
    DxvkNvapi,
    GalliumNine,
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Dxvk => "DXVK",
            ComponentKind::DxvkNvapi => "DXVK NVAPI",
            ComponentKind::GalliumNine => "Gallium Nine",
        }
    }

    /// The releases page the current archive is discovered from.
    pub fn releases_url(&self) -> &'static str {
        match self {
            ComponentKind::Dxvk => "https://github.com/doitsujin/dxvk/releases/latest",
            ComponentKind::DxvkNvapi => "https://github.com/jp7677/dxvk-nvapi/releases/latest",
            ComponentKind::GalliumNine => "https://github.com/iXit/wine-nine-standalone/releases",
        }
    }

    /// Subdirectory of the package store holding this component's releases.
    pub fn cache_subdir(&self) -> &'static str {
        match self {
            ComponentKind::Dxvk => "dxvk",
            ComponentKind::DxvkNvapi => "dxvk-nvapi",
            ComponentKind::GalliumNine => "gallium-nine",
        }
    }
}

/// Explicit component directories supplied by the profile, bypassing
/// discovery and download when present and valid. Updated with resolved
/// locations so repeated installs in one invocation skip re-resolution.
#[derive(Debug, Default, Clone)]
pub struct ToolDirs {
    pub dxvk: Option<PathBuf>,
    pub dxvk_nvapi: Option<PathBuf>,
    pub gallium_nine: Option<PathBuf>,
}

impl ToolDirs {
    pub fn get(&self, kind: ComponentKind) -> Option<&PathBuf> {
        match kind {
            ComponentKind::Dxvk => self.dxvk.as_ref(),
            ComponentKind::DxvkNvapi => self.dxvk_nvapi.as_ref(),
            ComponentKind::GalliumNine => self.gallium_nine.as_ref(),
        }
    }

    pub fn set(&mut self, kind: ComponentKind, dir: PathBuf) {
        match kind {
            ComponentKind::Dxvk => self.dxvk = Some(dir),
            ComponentKind::DxvkNvapi => self.dxvk_nvapi = Some(dir),
            ComponentKind::GalliumNine => self.gallium_nine = Some(dir),
        }
    }
}
