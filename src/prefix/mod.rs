//! The Wine prefix filesystem layout.

pub mod overrides;

use crate::core::{WrunnerError, WrunnerResult};
use std::path::{Path, PathBuf};

/// An isolated Windows-compatible runtime environment rooted at
/// `<application_directory>/pfx`.
#[derive(Debug, Clone)]
pub struct Prefix {
    root: PathBuf,
}

impl Prefix {
    /// Derive the prefix location from an application directory.
    pub fn new(application_directory: &Path) -> Self {
        Self {
            root: application_directory.join("pfx"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    /// The 64-bit (or only) system DLL directory.
    pub fn system32_dir(&self) -> PathBuf {
        self.root.join("drive_c/windows/system32")
    }

    /// The 32-bit DLL directory of a 64-bit prefix.
    pub fn syswow64_dir(&self) -> PathBuf {
        self.root.join("drive_c/windows/syswow64")
    }

    /// Fail when the prefix exposes neither system DLL directory.
    pub fn check_system_dirs(&self) -> WrunnerResult<()> {
        if !self.system32_dir().exists() && !self.syswow64_dir().exists() {
            return Err(WrunnerError::Prefix(format!(
                "The directories system32 and syswow64 were not found in prefix: {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}
