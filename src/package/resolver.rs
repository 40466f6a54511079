//! Release-asset URL discovery.
//!
//! GitHub-style release pages do not expose the asset list directly: it is
//! loaded from a second "expanded assets" fragment. Resolution is therefore
//! two chained GETs, each answered by a single-pass tag scan.

use crate::core::{WrunnerError, WrunnerResult};
use crate::package::scan::TagScan;
use reqwest::blocking::Client;
use reqwest::header;
use std::time::Duration;

/// Host root prepended to the relative asset link found on the fragment.
pub const GITHUB_HOST: &str = "https://github.com";

/// Suffix identifying the release archive among the fragment's anchors.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves the current downloadable archive URL of a project.
pub struct PackageResolver {
    client: Client,
    host: String,
}

impl PackageResolver {
    /// Create a resolver with a browser user-agent and a fixed timeout.
    pub fn new() -> WrunnerResult<Self> {
        Self::with_host(GITHUB_HOST)
    }

    /// Create a resolver against a different host root.
    pub fn with_host(host: impl Into<String>) -> WrunnerResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(BROWSER_USER_AGENT),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WrunnerError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: host.into(),
        })
    }

    /// The shared blocking client (reused by the downloader).
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Resolve a releases-page URL to the current archive download URL.
    pub fn resolve_download_url(&self, releases_url: &str) -> WrunnerResult<String> {
        let page = self.fetch_page(releases_url)?;

        let fragment_url = TagScan::new("include-fragment", "src")
            .value_predicate(|value| value.starts_with("http"))
            .first_match(&page)
            .ok_or_else(|| {
                WrunnerError::Parse(format!(
                    "No expanded-assets fragment found at: {}",
                    releases_url
                ))
            })?;

        let fragment = self.fetch_page(&fragment_url)?;

        let relative_url = TagScan::new("a", "href")
            .value_predicate(|value| value.ends_with(ARCHIVE_SUFFIX))
            .first_match(&fragment)
            .ok_or_else(|| {
                WrunnerError::Parse(format!("No {} asset found at: {}", ARCHIVE_SUFFIX, fragment_url))
            })?;

        Ok(format!("{}{}", self.host, relative_url))
    }

    fn fetch_page(&self, url: &str) -> WrunnerResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| WrunnerError::Network(format!("Failed to request {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(WrunnerError::Network(format!(
                "Failed to fetch document at {}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .map_err(|e| WrunnerError::Network(format!("Failed to read {}: {}", url, e)))
    }
}
