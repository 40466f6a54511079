//! On-disk package store for downloaded component releases.
//!
//! Packages are never deleted automatically; a later install reuses the
//! cached archive whenever its size still matches the published one.

use crate::core::path::{download_root, ensure_dir};
use crate::core::WrunnerResult;
use crate::env::EnvContext;
use crate::package::downloader::Downloader;
use crate::package::extractor;
use crate::package::resolver::PackageResolver;
use std::path::{Path, PathBuf};

/// Download cache rooted at `WRUNNER_DATA_DIR` or the platform data dir.
#[derive(Debug, Clone)]
pub struct PackageStore {
    root: PathBuf,
}

impl PackageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the store root from the execution context.
    pub fn from_env(env: &EnvContext) -> WrunnerResult<Self> {
        Ok(Self::new(download_root(env)?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The per-component cache directory.
    pub fn component_dir(&self, subdir: &str) -> PathBuf {
        self.root.join(subdir)
    }

    /// Resolve, download, and extract the current release of a project.
    ///
    /// Returns the extracted package root.
    pub fn fetch(
        &self,
        resolver: &PackageResolver,
        releases_url: &str,
        subdir: &str,
    ) -> WrunnerResult<PathBuf> {
        let package_url = resolver.resolve_download_url(releases_url)?;
        let directory = self.component_dir(subdir);
        ensure_dir(&directory)?;

        let archive = Downloader::new(resolver.client(), &package_url, &directory).download()?;
        extractor::extract(&archive, &directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_component_dir_layout() {
        let store = PackageStore::new(PathBuf::from("/data/wrunner/downloads"));
        assert_eq!(
            store.component_dir("dxvk"),
            PathBuf::from("/data/wrunner/downloads/dxvk")
        );
    }

    #[test]
    fn test_from_env_honors_override() {
        let temp = TempDir::new().unwrap();
        let mut env = EnvContext::new();
        env.set("WRUNNER_DATA_DIR", temp.path().display().to_string());

        let store = PackageStore::from_env(&env).unwrap();
        assert_eq!(store.root(), temp.path());
    }
}
