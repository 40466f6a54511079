//! UMU-backed runner (Proton via umu-run).

use crate::component::{ComponentInstaller, ToolDirs};
use crate::config::Profile;
use crate::core::{WrunnerError, WrunnerResult};
use crate::env::EnvContext;
use crate::package::{PackageResolver, PackageStore};
use crate::runner::bitness::WinepathProbe;
use crate::runner::process::{run_command, run_status_checked, OutputMode};
use crate::runner::{BoundDispatch, PrefixDispatch, RunMode, Runner, RunnerContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SYSTEM_BIN_DIR: &str = "/usr/bin";

pub struct UmuRunner {
    ctx: RunnerContext,
    umu_run: PathBuf,
    probe: WinepathProbe,
    tools: ToolDirs,
    store: PackageStore,
    resolver: PackageResolver,
}

impl UmuRunner {
    pub fn new(profile: &Profile) -> WrunnerResult<Self> {
        let umu_directory = match &profile.umu_directory {
            Some(dir) if dir.exists() => dir.clone(),
            configured => {
                warn!(
                    "umu-run not found at: {:?}, defaulting to system directory at: {}",
                    configured, SYSTEM_BIN_DIR
                );
                PathBuf::from(SYSTEM_BIN_DIR)
            }
        };

        let umu_run = umu_directory.join("umu-run");

        let process_env = EnvContext::from_process();
        let help_check = run_status_checked(
            &[umu_run.display().to_string(), "--help".to_string()],
            &process_env,
        );
        if help_check != 0 {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "umu-run not found at: {}",
                umu_run.display()
            )));
        }

        if !umu_run.is_file() {
            return Err(WrunnerError::MissingPrerequisite(format!(
                "umu-run path isn't a file: {}",
                umu_run.display()
            )));
        }

        let mut ctx = RunnerContext::new(
            &profile.id,
            &profile.application_directory,
            profile.executables.clone(),
            &profile.environment,
            profile.output_mode(),
            umu_run.parent(),
        );

        if let Some(proton_directory) = &profile.proton_directory {
            if proton_directory.join("proton").exists() {
                ctx.env
                    .set("PROTONPATH", proton_directory.display().to_string());
            } else {
                warn!(
                    "Proton wasn't found at the directory: {}, defaulting to UMU's proton path.",
                    proton_directory.display()
                );
            }
        }

        let store = PackageStore::from_env(&ctx.env)?;
        let resolver = PackageResolver::new()?;

        let tools = ToolDirs {
            dxvk: profile.dxvk_directory.clone(),
            dxvk_nvapi: profile.dxvk_nvapi_directory.clone(),
            gallium_nine: profile.gallium_nine_directory.clone(),
        };

        Ok(Self {
            ctx,
            umu_run,
            probe: WinepathProbe,
            tools,
            store,
            resolver,
        })
    }

    fn bound_dispatch(&self) -> BoundDispatch<'_> {
        BoundDispatch {
            program: &self.umu_run,
            pass_mode: true,
            env: &self.ctx.env,
            output: &self.ctx.output,
        }
    }
}

/// Run a component operation with an installer built from split borrows of
/// the runner's fields.
macro_rules! component_op {
    ($self:ident, $method:ident) => {{
        let dispatch = BoundDispatch {
            program: &$self.umu_run,
            pass_mode: true,
            env: &$self.ctx.env,
            output: &$self.ctx.output,
        };
        let probe_command = vec![
            $self.umu_run.display().to_string(),
            "run".to_string(),
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

impl Runner for UmuRunner {
    fn run(&mut self, mode: RunMode, args: &[String]) -> WrunnerResult<()> {
        let fallback = ["--help".to_string()];
        let args = if args.is_empty() { &fallback[..] } else { args };

        self.bound_dispatch().dispatch(mode, args)
    }

    fn run_exe(&mut self, mode: RunMode, args: &[String]) -> WrunnerResult<()> {
        let Some((target, rest)) = self.ctx.resolve_executable(args) else {
            warn!("No matching executable for: {:?}", args);
            return Ok(());
        };

        let mut full = vec![target.display().to_string()];
        full.extend(rest);

        self.bound_dispatch()
            .dispatch_in(mode, &full, target.parent())
    }

    fn wineboot(&mut self, args: &[String]) -> WrunnerResult<()> {
        let mut command = vec![
            self.umu_run.display().to_string(),
            "run".to_string(),
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
        // umu-run knows how to bootstrap winetricks inside the Proton
        // environment, so no host script is required.
        let mut command = vec![
            self.umu_run.display().to_string(),
            "winetricks".to_string(),
        ];
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
                self.umu_run.display().to_string(),
                "run".to_string(),
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
        &self.umu_run
    }
}
