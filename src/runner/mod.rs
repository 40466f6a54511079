//! Bound execution contexts for Wine- and UMU-backed prefixes.
//!
//! A [`Runner`] is created once per invocation from a validated profile and
//! is the only way the rest of the crate touches the prefix: launching
//! executables, booting or destroying the prefix, and installing optional
//! components all go through it.

pub mod bitness;
pub mod process;
pub mod umu;
pub mod wine;

use crate::config::Profile;
use crate::core::WrunnerResult;
use crate::env::sync::reconcile_sync_method;
use crate::env::EnvContext;
use crate::prefix::Prefix;
use crate::runner::process::{run_command_in, OutputMode};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::warn;

pub use umu::UmuRunner;
pub use wine::WineRunner;

/// Dispatch mode passed to UMU (Wine invocations ignore it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    WaitForExitAndRun,
    Run,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::WaitForExitAndRun => "waitforexitandrun",
            RunMode::Run => "run",
        }
    }
}

/// Something that can execute a command inside the prefix.
pub trait PrefixDispatch {
    fn dispatch_in(&self, mode: RunMode, args: &[String], cwd: Option<&Path>)
        -> WrunnerResult<()>;

    fn dispatch(&self, mode: RunMode, args: &[String]) -> WrunnerResult<()> {
        self.dispatch_in(mode, args, None)
    }
}

/// Dispatch through a concrete launcher binary.
///
/// Wine invokes the program directly; UMU expects the run mode as the first
/// argument (`pass_mode`).
pub struct BoundDispatch<'a> {
    pub program: &'a Path,
    pub pass_mode: bool,
    pub env: &'a EnvContext,
    pub output: &'a OutputMode,
}

impl PrefixDispatch for BoundDispatch<'_> {
    fn dispatch_in(
        &self,
        mode: RunMode,
        args: &[String],
        cwd: Option<&Path>,
    ) -> WrunnerResult<()> {
        let mut command = Vec::with_capacity(args.len() + 2);
        command.push(self.program.display().to_string());
        if self.pass_mode {
            command.push(mode.as_str().to_string());
        }
        command.extend(args.iter().cloned());

        run_command_in(&command, self.env, self.output, cwd)
    }
}

/// Recording dispatch for tests: collects calls instead of spawning.
#[derive(Debug, Default)]
pub struct RecordingDispatch {
    calls: RefCell<Vec<(RunMode, Vec<String>)>>,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(RunMode, Vec<String>)> {
        self.calls.borrow().clone()
    }
}

impl PrefixDispatch for RecordingDispatch {
    fn dispatch_in(
        &self,
        mode: RunMode,
        args: &[String],
        _cwd: Option<&Path>,
    ) -> WrunnerResult<()> {
        self.calls.borrow_mut().push((mode, args.to_vec()));
        Ok(())
    }
}

/// Capability surface of a bound runner.
///
/// Every concrete variant implements the full set; callers hold only this
/// interface.
pub trait Runner {
    /// Dispatch a program with its arguments into the prefix.
    fn run(&mut self, mode: RunMode, args: &[String]) -> WrunnerResult<()>;

    /// Resolve an executable alias (or path) and launch it from its own
    /// directory.
    fn run_exe(&mut self, mode: RunMode, args: &[String]) -> WrunnerResult<()>;

    /// Run wineboot with the given arguments.
    fn wineboot(&mut self, args: &[String]) -> WrunnerResult<()>;

    /// Set up a new prefix.
    fn init_prefix(&mut self) -> WrunnerResult<()>;

    /// Terminate every process attached to the prefix.
    fn kill_all(&mut self) -> WrunnerResult<()>;

    fn install_dxvk(&mut self) -> WrunnerResult<()>;
    fn uninstall_dxvk(&mut self) -> WrunnerResult<()>;
    fn install_nvapi(&mut self) -> WrunnerResult<()>;
    fn uninstall_nvapi(&mut self) -> WrunnerResult<()>;
    fn install_gallium_nine(&mut self) -> WrunnerResult<()>;
    fn uninstall_gallium_nine(&mut self) -> WrunnerResult<()>;

    fn winetricks(&mut self, args: &[String]) -> WrunnerResult<()>;
    fn winecfg(&mut self) -> WrunnerResult<()>;

    /// Remove the application directory and the prefix beneath it.
    fn destroy_prefix(&mut self) -> WrunnerResult<()>;

    fn profile_id(&self) -> &str;

    /// The binary selected at construction for dispatching into the prefix.
    fn default_binary_path(&self) -> &Path;
}

/// Construct the concrete runner a profile asks for.
pub fn create_runner(profile: &Profile) -> WrunnerResult<Box<dyn Runner>> {
    match profile.runner {
        crate::config::RunnerKind::Wine => Ok(Box::new(WineRunner::new(profile)?)),
        crate::config::RunnerKind::Umu => Ok(Box::new(UmuRunner::new(profile)?)),
    }
}

/// State shared by every runner variant.
pub(crate) struct RunnerContext {
    pub profile_id: String,
    pub application_directory: PathBuf,
    pub prefix: Prefix,
    pub aliases: IndexMap<String, String>,
    pub env: EnvContext,
    pub output: OutputMode,
}

impl RunnerContext {
    /// Build the execution context for a prefix.
    ///
    /// Ordering matters: the prefix location and launcher `PATH` entry are
    /// committed first, then the profile's own variables, and the sync
    /// method is reconciled last, before any subprocess can observe the
    /// context.
    pub fn new(
        profile_id: &str,
        application_directory: &Path,
        aliases: IndexMap<String, String>,
        environment: &IndexMap<String, String>,
        output: OutputMode,
        launcher_dir: Option<&Path>,
    ) -> Self {
        let prefix = Prefix::new(application_directory);

        let mut env = EnvContext::from_process();
        env.set("WINEPREFIX", prefix.root().display().to_string());
        if let Some(dir) = launcher_dir {
            env.append_path(dir);
        }
        env.extend(environment);
        reconcile_sync_method(&mut env);

        Self {
            profile_id: profile_id.to_string(),
            application_directory: application_directory.to_path_buf(),
            prefix,
            aliases,
            env,
            output,
        }
    }

    /// Resolve the executable to launch from alias arguments.
    ///
    /// With no arguments the first alias whose target exists wins; otherwise
    /// the first argument must equal an alias or its target path. Returns
    /// the target and the arguments to pass through.
    pub fn resolve_executable(&self, args: &[String]) -> Option<(PathBuf, Vec<String>)> {
        let requested = args.first();

        for (alias, target) in &self.aliases {
            let target_path = PathBuf::from(target);

            match requested {
                None => {
                    if !target_path.exists() {
                        warn!("Path: {} does not exist.", target);
                        continue;
                    }
                    return Some((target_path, Vec::new()));
                }
                Some(exe) => {
                    if alias != exe && target != exe {
                        continue;
                    }
                    if !target_path.exists() {
                        warn!("Path: {} does not exist.", target);
                        continue;
                    }
                    return Some((target_path, args[1..].to_vec()));
                }
            }
        }

        None
    }
}
