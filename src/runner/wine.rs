//! Wine-backed runner.

use crate::component::{ComponentInstaller, ToolDirs};
use crate::config::Profile;
use crate::core::{WrunnerError, WrunnerResult};
use crate::env::EnvContext;
use crate::package::{PackageResolver, PackageStore};
use crate::runner::bitness::{BitnessProbe, WinepathProbe};
use crate::runner::process::{run_command, run_status_checked, OutputMode};
use crate::runner::{BoundDispatch, PrefixDispatch, RunMode, Runner, RunnerContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// System fallback used when the configured wine build is not operable.
const SYSTEM_BIN_DIR: &str = "/usr/bin";

pub struct WineRunner {
    ctx: RunnerContext,
    wine64_bin: PathBuf,
    winetricks_path: Option<PathBuf>,
    default_bin: PathBuf,
    probe: WinepathProbe,
    tools: ToolDirs,
    store: PackageStore,
    resolver: PackageResolver,
}

impl WineRunner {
    pub fn new(profile: &Profile) -> WrunnerResult<Self> {
        let wine_directory = profile
            .wine_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(SYSTEM_BIN_DIR));

        let mut wine_bin = wine_directory.join("wine");
        let mut wine64_bin = wine_directory.join("wine64");
        let mut wineboot_bin = wine_directory.join("wineboot");
        let mut winecfg_bin = wine_directory.join("winecfg");

        // The configured build may be broken or missing; fall back to the
        // system install once before giving up.
        let process_env = EnvContext::from_process();
        if version_check(&wine_bin, &process_env) != 0 {
            let system = Path::new(SYSTEM_BIN_DIR);
            wine_bin = system.join("wine");
            wine64_bin = system.join("wine64");
            wineboot_bin = system.join("wineboot");
            winecfg_bin = system.join("winecfg");
        }

        if version_check(&wine_bin, &process_env) != 0 {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "Wine not found at: {}",
                wine_bin.display()
            )));
        }

        if !wineboot_bin.exists() {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "wineboot not found at: {}",
                wineboot_bin.display()
            )));
        }

        if !winecfg_bin.exists() {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "winecfg not found at: {}",
                winecfg_bin.display()
            )));
        }

        let mut ctx = RunnerContext::new(
            &profile.id,
            &profile.application_directory,
            profile.executables.clone(),
            &profile.environment,
            profile.output_mode(),
            wine64_bin.parent(),
        );

        // An existing prefix dictates which binary can talk to it.
        let probe = WinepathProbe;
        if ctx.prefix.exists() {
            let winepath = |bin: &Path| {
                vec![bin.display().to_string(), "winepath".to_string()]
            };

            if probe.probe(&winepath(&wine64_bin), &ctx.env) {
                ctx.env.set("WINE", wine64_bin.display().to_string());
            } else if probe.probe(&winepath(&wine_bin), &ctx.env) {
                ctx.env.set("WINE", wine_bin.display().to_string());
            } else {
                return Err(WrunnerError::Prefix(format!(
                    "Failed to check if the prefix {} is 32 or 64 bits.",
                    ctx.prefix.root().display()
                )));
            }
        }

        let default_bin = ctx
            .env
            .get("WINE")
            .map(PathBuf::from)
            .unwrap_or_else(|| wine64_bin.clone());

        let store = PackageStore::from_env(&ctx.env)?;
        let resolver = PackageResolver::new()?;

        let tools = ToolDirs {
            dxvk: profile.dxvk_directory.clone(),
            dxvk_nvapi: profile.dxvk_nvapi_directory.clone(),
            gallium_nine: profile.gallium_nine_directory.clone(),
        };

        Ok(Self {
            ctx,
            wine64_bin,
            winetricks_path: profile.winetricks_path.clone(),
            default_bin,
            probe,
            tools,
            store,
            resolver,
        })
    }

    fn bound_dispatch(&self) -> BoundDispatch<'_> {
        BoundDispatch {
            program: &self.default_bin,
            pass_mode: false,
            env: &self.ctx.env,
            output: &self.ctx.output,
        }
    }
}

fn version_check(wine_bin: &Path, env: &EnvContext) -> i32 {
    run_status_checked(
        &[wine_bin.display().to_string(), "--version".to_string()],
        env,
    )
}

/// Run a component operation with an installer built from split borrows of
/// the runner's fields.
macro_rules! component_op {
    ($self:ident, $method:ident) => {{
        let dispatch = BoundDispatch {
            program: &$self.default_bin,
            pass_mode: false,
            env: &$self.ctx.env,
            output: &$self.ctx.output,
        };
        let probe_command = vec![
            $self.wine64_bin.display().to_string(),
            "winepath".to_string(),
        ];
        ComponentInstaller::new(
            &$self.ctx.prefix,
            &$self.ctx.env,
            &dispatch,
            &$self.probe,
            probe_command,
            &$self.store,
            &$self.resolver,
            &mut $self.tools,
        )
        .$method()
    }};
}

impl Runner for WineRunner {
    fn run(&mut self, mode: RunMode, args: &[String]) -> WrunnerResult<()> {
        let fallback = ["--help".to_string()];
        let args = if args.is_empty() { &fallback[..] } else { args };

        self.bound_dispatch().dispatch(mode, args)
    }

    fn run_exe(&mut self, mode: RunMode, args: &[String]) -> WrunnerResult<()> {
        let Some((target, rest)) = self.ctx.resolve_executable(args) else {
            tracing::warn!("No matching executable for: {:?}", args);
            return Ok(());
        };

        let mut full = vec![target.display().to_string()];
        full.extend(rest);

        self.bound_dispatch()
            .dispatch_in(mode, &full, target.parent())
    }

    fn wineboot(&mut self, args: &[String]) -> WrunnerResult<()> {
        let mut command = vec![
            self.default_bin.display().to_string(),
            "wineboot".to_string(),
        ];
        if args.is_empty() {
            command.push("--help".to_string());
        } else {
            command.extend(args.iter().cloned());
        }

        run_command(&command, &self.ctx.env, &OutputMode::Stream)
    }

    fn init_prefix(&mut self) -> WrunnerResult<()> {
        info!("Initiating prefix.");

        if !self.ctx.application_directory.exists() {
            fs::create_dir_all(&self.ctx.application_directory)?;
        }

        self.wineboot(&["--init".to_string()])?;

        info!("Prefix created.");

        Ok(())
    }

    fn kill_all(&mut self) -> WrunnerResult<()> {
        self.wineboot(&["--kill".to_string()])
    }

    fn install_dxvk(&mut self) -> WrunnerResult<()> {
        component_op!(self, install_dxvk)
    }

    fn uninstall_dxvk(&mut self) -> WrunnerResult<()> {
        component_op!(self, uninstall_dxvk)
    }

    fn install_nvapi(&mut self) -> WrunnerResult<()> {
        component_op!(self, install_nvapi)
    }

    fn uninstall_nvapi(&mut self) -> WrunnerResult<()> {
        component_op!(self, uninstall_nvapi)
    }

    fn install_gallium_nine(&mut self) -> WrunnerResult<()> {
        component_op!(self, install_gallium_nine)
    }

    fn uninstall_gallium_nine(&mut self) -> WrunnerResult<()> {
        component_op!(self, uninstall_gallium_nine)
    }

    fn winetricks(&mut self, args: &[String]) -> WrunnerResult<()> {
        let Some(winetricks) = self.winetricks_path.clone().filter(|path| path.exists()) else {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "Winetricks not found at: {:?}",
                self.winetricks_path
            )));
        };

        let mut command = vec![winetricks.display().to_string()];
        if args.is_empty() {
            command.push("--help".to_string());
        } else {
            command.extend(args.iter().cloned());
        }

        run_command(&command, &self.ctx.env, &self.ctx.output)
    }

    fn winecfg(&mut self) -> WrunnerResult<()> {
        run_command(
            &[
                self.default_bin.display().to_string(),
                "winecfg".to_string(),
            ],
            &self.ctx.env,
            &self.ctx.output,
        )
    }

    fn destroy_prefix(&mut self) -> WrunnerResult<()> {
        info!("Removing prefix: {}.", self.ctx.prefix.root().display());

        if self.ctx.application_directory.exists() {
            let _ = fs::remove_dir_all(&self.ctx.application_directory);
        }

        info!("Removed prefix: {}.", self.ctx.prefix.root().display());

        Ok(())
    }

    fn profile_id(&self) -> &str {
        &self.ctx.profile_id
    }

    fn default_binary_path(&self) -> &Path {
        &self.default_bin
    }
}
