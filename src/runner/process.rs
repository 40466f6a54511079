//! Blocking subprocess invocation.
//!
//! Every invocation runs to completion before control returns. Output is
//! discarded, streamed to the console, or written to a log file depending on
//! the profile's debug settings. `LC_ALL=C` is pinned per command so parsers
//! downstream never see localized output; the pin lives on the `Command`
//! itself and the execution context is left untouched.

use crate::core::{WrunnerError, WrunnerResult};
use crate::env::EnvContext;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Where a spawned command's output goes.
#[derive(Debug, Clone, Default)]
pub enum OutputMode {
    /// Silence stdout and stderr.
    #[default]
    Discard,
    /// Stream output to the console.
    Stream,
    /// Write output to a log file.
    LogFile(PathBuf),
}

/// Run a command to completion under the given context.
pub fn run_command(args: &[String], env: &EnvContext, output: &OutputMode) -> WrunnerResult<()> {
    run_command_in(args, env, output, None)
}

/// Run a command to completion, optionally from a working directory.
pub fn run_command_in(
    args: &[String],
    env: &EnvContext,
    output: &OutputMode,
    cwd: Option<&Path>,
) -> WrunnerResult<()> {
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| WrunnerError::Config("Empty command".to_string()))?;

    let mut command = Command::new(program);
    command.args(rest);
    env.apply(&mut command);
    command.env("LC_ALL", "C");

    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    match output {
        OutputMode::Discard => {
            command.stdout(Stdio::null());
            command.stderr(Stdio::null());
        }
        OutputMode::Stream => {
            command.stdout(Stdio::inherit());
            command.stderr(Stdio::inherit());
        }
        OutputMode::LogFile(path) => {
            let log = File::create(path)?;
            let log_err = log.try_clone()?;
            command.stdout(Stdio::from(log));
            command.stderr(Stdio::from(log_err));
        }
    }

    let status = command.status()?;
    if !status.success() {
        debug!("{} exited with {}", program, status);
    }

    Ok(())
}

/// Run a command with all output discarded and return its exit code.
///
/// A command that cannot be spawned (typically a missing binary) reports a
/// non-zero code instead of an error.
pub fn run_status_checked(args: &[String], env: &EnvContext) -> i32 {
    let Some((program, rest)) = args.split_first() else {
        return -1;
    };

    let mut command = Command::new(program);
    command.args(rest);
    env.apply(&mut command);
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    match command.status() {
        Ok(status) => status.code().unwrap_or(-1),
        Err(_) => -1,
    }
}
