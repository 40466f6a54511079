//! Archive download with size-based reuse.

use crate::core::path::ensure_dir;
use crate::core::{WrunnerError, WrunnerResult};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Filename used when the response carries no usable Content-Disposition.
const FALLBACK_FILENAME: &str = "unknown.tar.gz";

/// Downloads one file into a directory, skipping the body read when a
/// same-sized copy is already on disk.
pub struct Downloader<'a> {
    client: &'a Client,
    url: String,
    directory: PathBuf,
}

impl<'a> Downloader<'a> {
    pub fn new(client: &'a Client, url: &str, directory: &Path) -> Self {
        Self {
            client,
            url: url.to_string(),
            directory: directory.to_path_buf(),
        }
    }

    /// Fetch the file and return its local path.
    ///
    /// The destination name comes from the response's Content-Disposition
    /// header. When a file of exactly the declared content length already
    /// exists there, the response body is never read.
    pub fn download(&self) -> WrunnerResult<PathBuf> {
        ensure_dir(&self.directory)?;

        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| WrunnerError::Network(format!("Failed to request {}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(WrunnerError::Network(format!(
                "Failed to fetch download information for {}: HTTP {}",
                self.url,
                response.status()
            )));
        }

        let filename = filename_from_disposition(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
        );
        let filepath = self.directory.join(&filename);

        if let Some(expected) = response.content_length() {
            if let Ok(metadata) = fs::metadata(&filepath) {
                if metadata.len() == expected {
                    info!("{} already downloaded, reusing", filename);
                    return Ok(filepath);
                }
            }
        }

        info!("Downloading {}", filename);

        let body = response
            .bytes()
            .map_err(|e| WrunnerError::Network(format!("Failed to read {}: {}", self.url, e)))?;
        fs::write(&filepath, &body)?;

        info!("Download complete.");

        Ok(filepath)
    }
}

/// Extract the `filename=` parameter of a Content-Disposition header.
fn filename_from_disposition(header: Option<&str>) -> String {
    let Some(header) = header else {
        return FALLBACK_FILENAME.to_string();
    };

    let pattern = Regex::new(r#"filename="?([^";]+)"?"#).expect("static regex");
    pattern
        .captures(header)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}
