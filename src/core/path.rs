use crate::core::error::{WrunnerError, WrunnerResult};
use crate::env::EnvContext;
use std::path::{Path, PathBuf};

/// Environment variable overriding the download cache root.
pub const DATA_DIR_VAR: &str = "WRUNNER_DATA_DIR";

/// Get the download cache root.
///
/// `WRUNNER_DATA_DIR` from the execution context wins; otherwise the
/// platform data directory is used:
/// - Linux: ~/.local/share/wrunner/downloads
/// - macOS: ~/Library/Application Support/wrunner/downloads
pub fn download_root(env: &EnvContext) -> WrunnerResult<PathBuf> {
    if let Some(dir) = env.get(DATA_DIR_VAR) {
        return Ok(PathBuf::from(dir));
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| WrunnerError::Config("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("wrunner").join("downloads"))
}

/// Create a directory and any missing parents.
pub fn ensure_dir(path: &Path) -> WrunnerResult<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Recursively collect files below `root` whose file name matches one of
/// `names` exactly (no globbing). Unreadable directories are skipped with a
/// warning.
pub fn find_files(root: &Path, names: &[&str]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for entry in walkdir::WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("cannot access {}: {}, ignoring", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(name) = entry.file_name().to_str() {
            if names.contains(&name) {
                found.push(entry.path().to_path_buf());
            }
        }
    }

    found
}
