use crate::cli::runner_for;
use std::path::Path;
use wrunner::WrunnerResult;

pub fn init(profile_path: &Path) -> WrunnerResult<()> {
    runner_for(profile_path)?.init_prefix()
}

pub fn kill(profile_path: &Path) -> WrunnerResult<()> {
    runner_for(profile_path)?.kill_all()
}

pub fn winecfg(profile_path: &Path) -> WrunnerResult<()> {
    runner_for(profile_path)?.winecfg()
}

pub fn winetricks(profile_path: &Path, args: Vec<String>) -> WrunnerResult<()> {
    runner_for(profile_path)?.winetricks(&args)
}

pub fn destroy(profile_path: &Path) -> WrunnerResult<()> {
    runner_for(profile_path)?.destroy_prefix()
}
