use crate::cli::runner_for;
use std::path::Path;
use wrunner::runner::RunMode;
use wrunner::WrunnerResult;

/// Launch an executable (by alias, path, or the profile's first alias).
pub fn run(profile_path: &Path, args: Vec<String>) -> WrunnerResult<()> {
    let mut runner = runner_for(profile_path)?;
    runner.run_exe(RunMode::WaitForExitAndRun, &args)
}
