//! Application profiles.
//!
//! A profile is a small YAML document describing one managed application:
//! which runner backs it, where its prefix lives, the environment it runs
//! under, and its launchable executables. Values arrive already validated by
//! whoever wrote the profile; beyond shape checks nothing is verified here.

use crate::core::{WrunnerError, WrunnerResult};
use crate::runner::process::OutputMode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which backend launches the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    Wine,
    Umu,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile identifier.
    pub id: String,

    /// Backend used to launch the application.
    pub runner: RunnerKind,

    /// Directory the prefix is created under (`<dir>/pfx`).
    pub application_directory: PathBuf,

    /// Wine `bin` directory; system wine is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wine_directory: Option<PathBuf>,

    /// Directory containing `umu-run`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub umu_directory: Option<PathBuf>,

    /// Proton build UMU should use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proton_directory: Option<PathBuf>,

    /// Explicit DXVK package directory, bypassing download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxvk_directory: Option<PathBuf>,

    /// Explicit DXVK-NVAPI package directory, bypassing download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxvk_nvapi_directory: Option<PathBuf>,

    /// Explicit Gallium Nine package directory, bypassing download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gallium_nine_directory: Option<PathBuf>,

    /// Path to the winetricks script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winetricks_path: Option<PathBuf>,

    /// Extra environment variables, applied in file order.
    #[serde(default)]
    pub environment: IndexMap<String, String>,

    /// Executable aliases: name -> absolute path, matched in file order.
    #[serde(default)]
    pub executables: IndexMap<String, String>,

    /// Stream subprocess output to the console.
    #[serde(default)]
    pub debug: bool,

    /// Write subprocess output to this file instead (implies debug).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Profile {
    /// Load a profile from a YAML file.
    pub fn load(path: &Path) -> WrunnerResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WrunnerError::Config(format!("Failed to read profile {}: {}", path.display(), e))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            WrunnerError::Config(format!("Failed to parse profile {}: {}", path.display(), e))
        })
    }

    /// How subprocess output should be handled for this profile.
    pub fn output_mode(&self) -> OutputMode {
        match (&self.log_file, self.debug) {
            (Some(path), _) => OutputMode::LogFile(path.clone()),
            (None, true) => OutputMode::Stream,
            (None, false) => OutputMode::Discard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = "\
id: my-game
runner: wine
application_directory: /apps/my-game
";

    #[test]
    fn test_load_minimal_profile() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile.yaml");
        fs::write(&path, MINIMAL).unwrap();

        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile.id, "my-game");
        assert_eq!(profile.runner, RunnerKind::Wine);
        assert_eq!(
            profile.application_directory,
            PathBuf::from("/apps/my-game")
        );
        assert!(profile.environment.is_empty());
        assert!(!profile.debug);
    }

    #[test]
    fn test_load_full_profile_preserves_map_order() {
        let yaml = "\
id: my-game
runner: umu
application_directory: /apps/my-game
umu_directory: /opt/umu
proton_directory: /opt/proton-ge
winetricks_path: /usr/bin/winetricks
environment:
  ZVAR: last
  AVAR: first
executables:
  game: /apps/my-game/drive_c/game.exe
  editor: /apps/my-game/drive_c/editor.exe
debug: true
";
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile.yaml");
        fs::write(&path, yaml).unwrap();

        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile.runner, RunnerKind::Umu);

        let env_keys: Vec<&String> = profile.environment.keys().collect();
        assert_eq!(env_keys, vec!["ZVAR", "AVAR"]);

        let exe_keys: Vec<&String> = profile.executables.keys().collect();
        assert_eq!(exe_keys, vec!["game", "editor"]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Profile::load(Path::new("/nonexistent/profile.yaml"));
        assert!(matches!(result, Err(WrunnerError::Config(_))));
    }

    #[test]
    fn test_load_malformed_profile() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile.yaml");
        fs::write(&path, "runner: [not, a, scalar").unwrap();

        assert!(Profile::load(&path).is_err());
    }

    #[test]
    fn test_output_mode_selection() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile.yaml");
        fs::write(&path, MINIMAL).unwrap();
        let mut profile = Profile::load(&path).unwrap();

        assert!(matches!(profile.output_mode(), OutputMode::Discard));

        profile.debug = true;
        assert!(matches!(profile.output_mode(), OutputMode::Stream));

        profile.log_file = Some(PathBuf::from("/tmp/run.log"));
        assert!(matches!(profile.output_mode(), OutputMode::LogFile(_)));
    }
}
