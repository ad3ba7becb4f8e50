use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, UpdateError};
use crate::update::UpdateConfigBuilder;

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct DialogSettings {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub positive_label: Option<String>,

    #[serde(default)]
    pub negative_label: Option<String>,
}

/// Defaults read from `config.toml`. Anything set here can be overridden on
/// the command line.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub repo: Option<String>,

    #[serde(default)]
    pub current_version: Option<String>,

    /// API root, defaults to https://api.github.com
    #[serde(default)]
    pub api_base: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    #[serde(default)]
    pub file_name: Option<String>,

    /// Installer command, the downloaded file is appended as last argument
    #[serde(default)]
    pub installer: Option<Vec<String>>,

    #[serde(default)]
    pub dialog: DialogSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| UpdateError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("release-updater")
            .join("config.toml")
    }

    /// Copy every value present in the file onto `builder`.
    pub fn apply(&self, mut builder: UpdateConfigBuilder) -> UpdateConfigBuilder {
        if let Some(owner) = &self.owner {
            builder = builder.owner(owner);
        }
        if let Some(repo) = &self.repo {
            builder = builder.repo(repo);
        }
        if let Some(version) = &self.current_version {
            builder = builder.current_version(version);
        }
        if let Some(base) = &self.api_base {
            builder = builder.api_base(base);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(name) = &self.file_name {
            builder = builder.file_name(name);
        }
        if let Some(title) = &self.dialog.title {
            builder = builder.title(title);
        }
        if let Some(message) = &self.dialog.message {
            builder = builder.message(message);
        }
        if let Some(label) = &self.dialog.positive_label {
            builder = builder.positive_label(label);
        }
        if let Some(label) = &self.dialog.negative_label {
            builder = builder.negative_label(label);
        }
        builder
    }
}
