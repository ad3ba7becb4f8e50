use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::config::{latest_release_url, UpdateConfig};
use crate::error::{Result, UpdateError};

const USER_AGENT: &str = concat!("release-updater/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    browser_download_url: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

/// What the latest release offers: its tag and where to get the first asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub version: String,
    pub download_url: String,
    pub asset_name: Option<String>,
    pub asset_size: Option<u64>,
}

/// Reads the latest release of one repository from the GitHub REST API.
#[derive(Debug, Clone)]
pub struct ReleaseFetcher {
    client: Client,
    api_base: String,
}

impl ReleaseFetcher {
    pub fn new(config: &UpdateConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpdateError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
        })
    }

    /// Single blocking attempt, no retry.
    pub fn fetch_latest(&self, owner: &str, repo: &str) -> Result<ReleaseDescriptor> {
        let url = latest_release_url(&self.api_base, owner, repo);
        debug!(%url, "fetching latest release");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| UpdateError::Network(format!("failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(UpdateError::Network(format!(
                "no releases found for {}/{}",
                owner, repo
            )));
        }
        if !status.is_success() {
            return Err(UpdateError::Network(format!("GitHub API error: {}", status)));
        }

        let body = response
            .text()
            .map_err(|e| UpdateError::Network(format!("failed to read response body: {}", e)))?;

        parse_release(&body)
    }
}

/// Parse a `releases/latest` payload. Fails when `assets` is empty.
pub fn parse_release(body: &str) -> Result<ReleaseDescriptor> {
    let release: Release = serde_json::from_str(body)
        .map_err(|e| UpdateError::MalformedResponse(e.to_string()))?;

    let asset = release
        .assets
        .into_iter()
        .next()
        .ok_or_else(|| UpdateError::MissingAsset {
            tag: release.tag_name.clone(),
        })?;

    Ok(ReleaseDescriptor {
        version: release.tag_name,
        download_url: asset.browser_download_url,
        asset_name: asset.name,
        asset_size: asset.size,
    })
}
