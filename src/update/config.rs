use std::time::Duration;

use crate::error::{Result, UpdateError};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TITLE: &str = "Update Available";
pub const DEFAULT_MESSAGE: &str = "A new version is available. Do you want to update?";
pub const DEFAULT_POSITIVE_LABEL: &str = "Update";
pub const DEFAULT_NEGATIVE_LABEL: &str = "Cancel";
pub const DEFAULT_FILE_NAME: &str = "update.apk";
pub const DEFAULT_DOWNLOAD_TITLE: &str = "Downloading Update";
pub const DEFAULT_DOWNLOAD_DESCRIPTION: &str = "Please wait...";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Text shown in the confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDialog {
    pub title: String,
    pub message: String,
    pub positive_label: String,
    pub negative_label: String,
}

/// Immutable settings for one [`Updater`](super::Updater).
///
/// Build with [`UpdateConfig::builder`]; owner, repo and current version are
/// required, everything else has a default.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub owner: String,
    pub repo: String,
    pub current_version: String,
    pub dialog: UpdateDialog,
    pub api_base: String,
    pub timeout: Duration,
    pub file_name: String,
    pub download_title: String,
    pub download_description: String,
}

impl UpdateConfig {
    pub fn builder() -> UpdateConfigBuilder {
        UpdateConfigBuilder::default()
    }
}

/// Endpoint for the latest published release of `owner/repo`.
pub(crate) fn latest_release_url(api_base: &str, owner: &str, repo: &str) -> String {
    format!(
        "{}/repos/{}/{}/releases/latest",
        api_base.trim_end_matches('/'),
        owner,
        repo
    )
}

#[derive(Debug, Clone)]
pub struct UpdateConfigBuilder {
    owner: String,
    repo: String,
    current_version: String,
    title: String,
    message: String,
    positive_label: String,
    negative_label: String,
    api_base: String,
    timeout: Duration,
    file_name: String,
    download_title: String,
    download_description: String,
}

impl Default for UpdateConfigBuilder {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            current_version: String::new(),
            title: DEFAULT_TITLE.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            positive_label: DEFAULT_POSITIVE_LABEL.to_string(),
            negative_label: DEFAULT_NEGATIVE_LABEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            file_name: DEFAULT_FILE_NAME.to_string(),
            download_title: DEFAULT_DOWNLOAD_TITLE.to_string(),
            download_description: DEFAULT_DOWNLOAD_DESCRIPTION.to_string(),
        }
    }
}

impl UpdateConfigBuilder {
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn positive_label(mut self, label: impl Into<String>) -> Self {
        self.positive_label = label.into();
        self
    }

    pub fn negative_label(mut self, label: impl Into<String>) -> Self {
        self.negative_label = label.into();
        self
    }

    /// Override the API root, e.g. for GitHub Enterprise or a mock server.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// File name the artifact is saved under. Later downloads overwrite it.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn download_title(mut self, title: impl Into<String>) -> Self {
        self.download_title = title.into();
        self
    }

    pub fn download_description(mut self, description: impl Into<String>) -> Self {
        self.download_description = description.into();
        self
    }

    pub fn build(self) -> Result<UpdateConfig> {
        let mut missing = Vec::new();
        if self.owner.trim().is_empty() {
            missing.push("owner");
        }
        if self.repo.trim().is_empty() {
            missing.push("repo");
        }
        if self.current_version.trim().is_empty() {
            missing.push("current version");
        }
        if !missing.is_empty() {
            return Err(UpdateError::Config(format!(
                "{} must be set",
                missing.join(", ")
            )));
        }

        if self.file_name.is_empty() || self.file_name.contains(['/', '\\']) {
            return Err(UpdateError::Config(format!(
                "invalid download file name '{}'",
                self.file_name
            )));
        }

        Ok(UpdateConfig {
            owner: self.owner,
            repo: self.repo,
            current_version: self.current_version,
            dialog: UpdateDialog {
                title: self.title,
                message: self.message,
                positive_label: self.positive_label,
                negative_label: self.negative_label,
            },
            api_base: self.api_base,
            timeout: self.timeout,
            file_name: self.file_name,
            download_title: self.download_title,
            download_description: self.download_description,
        })
    }
}
