//! CLI subcommand implementations.

pub mod install;
pub mod launch;
pub mod prefix;

use std::path::Path;
use wrunner::config::Profile;
use wrunner::runner::{create_runner, Runner};
use wrunner::WrunnerResult;

/// Load the profile and construct its runner.
pub fn runner_for(profile_path: &Path) -> WrunnerResult<Box<dyn Runner>> {
    let profile = Profile::load(profile_path)?;
    create_runner(&profile)
}
