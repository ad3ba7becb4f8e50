//! Error types for the update workflow.

/// Coarse classification of an [`UpdateError`], for callers that only need
/// to branch on what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Network,
    MalformedResponse,
    MissingAsset,
    InvalidUrl,
    PermissionDenied,
    FileMissing,
    DownloadFailed,
    Install,
    CheckInProgress,
    Io,
}

/// Every failure the check, download and install stages can produce.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpdateError {
    /// Required configuration was missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Connection failure, timeout, or a non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The release payload was not JSON or lacked an expected field.
    #[error("malformed release response: {0}")]
    MalformedResponse(String),

    /// The latest release has no uploaded assets.
    #[error("release {tag} has no downloadable assets")]
    MissingAsset { tag: String },

    /// The asset URL could not be handed to the downloader.
    #[error("invalid download URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The user refused the permissions needed to download.
    #[error("permission denied")]
    PermissionDenied,

    /// The download reported completion but the file is not on disk.
    #[error("downloaded file not found: {0}")]
    FileMissing(String),

    /// The download service rejected or lost the transfer.
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// The platform installer could not be started.
    #[error("install failed: {0}")]
    Install(String),

    /// Another update check is still running.
    #[error("an update check is already in progress")]
    CheckInProgress,

    #[error("I/O error: {0}")]
    Io(String),
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Network(_) => ErrorKind::Network,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::MissingAsset { .. } => ErrorKind::MissingAsset,
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::FileMissing(_) => ErrorKind::FileMissing,
            Self::DownloadFailed(_) => ErrorKind::DownloadFailed,
            Self::Install(_) => ErrorKind::Install,
            Self::CheckInProgress => ErrorKind::CheckInProgress,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Short message suitable for a toast or status line.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "Invalid download URL",
            Self::PermissionDenied => "Permission denied",
            Self::FileMissing(_) => "File not found",
            Self::DownloadFailed(_) => "Download failed",
            Self::Install(_) => "Could not start installer",
            Self::CheckInProgress => "Update check already running",
            _ => "Update check failed",
        }
    }
}

impl From<std::io::Error> for UpdateError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, UpdateError>;
