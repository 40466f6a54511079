use crate::cli::runner_for;
use clap::ValueEnum;
use std::path::Path;
use wrunner::WrunnerResult;

/// Component selector exposed on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ComponentArg {
    Dxvk,
    DxvkNvapi,
    GalliumNine,
}

impl ComponentArg {
    fn label(&self) -> &'static str {
        match self {
            ComponentArg::Dxvk => "DXVK",
            ComponentArg::DxvkNvapi => "DXVK-NVAPI",
            ComponentArg::GalliumNine => "Gallium Nine",
        }
    }
}

pub fn install(profile_path: &Path, component: ComponentArg) -> WrunnerResult<()> {
    let mut runner = runner_for(profile_path)?;

    match component {
        ComponentArg::Dxvk => runner.install_dxvk()?,
        ComponentArg::DxvkNvapi => runner.install_nvapi()?,
        ComponentArg::GalliumNine => runner.install_gallium_nine()?,
    }

    println!("✓ Installed {}", component.label());
    Ok(())
}

pub fn uninstall(profile_path: &Path, component: ComponentArg) -> WrunnerResult<()> {
    let mut runner = runner_for(profile_path)?;

    match component {
        ComponentArg::Dxvk => runner.uninstall_dxvk()?,
        ComponentArg::DxvkNvapi => runner.uninstall_nvapi()?,
        ComponentArg::GalliumNine => runner.uninstall_gallium_nine()?,
    }

    println!("✓ Uninstalled {}", component.label());
    Ok(())
}
