//! Seams between the update workflow and the host platform.
//!
//! The orchestrator never touches a download manager, permission system or
//! dialog directly; hosts plug those in through the traits below. The
//! [`desktop`](crate::desktop) module has ready-made implementations.

use std::fmt;
use std::path::PathBuf;

use url::Url;

use super::config::UpdateDialog;
use super::github::ReleaseDescriptor;
use crate::error::{Result, UpdateError};

/// MIME type handed to the installer for Android packages.
pub const APK_MIME_TYPE: &str = "application/vnd.android.package-archive";

/// Request code used when asking the host for permissions. Permission results
/// carrying any other code are not ours.
pub const PERMISSION_REQUEST_CODE: i32 = 1;

/// Handle returned by [`DownloadService::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DownloadId(pub u64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: Url,
    /// Fixed name inside the service's public download directory.
    pub file_name: String,
    pub title: String,
    pub description: String,
    pub notify_on_completion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub path: PathBuf,
    pub mime_type: &'static str,
}

/// Managed background downloader plus package installer.
pub trait DownloadService: Send + Sync {
    /// Queue a transfer and return immediately.
    fn submit(&self, request: &DownloadRequest) -> Result<DownloadId>;

    /// Block until the transfer finishes and return where the file landed.
    /// Unknown ids fail with [`UpdateError::DownloadFailed`].
    fn on_complete(&self, id: DownloadId) -> Result<PathBuf>;

    /// Hand a finished file to the OS installer.
    fn request_install(&self, request: &InstallRequest) -> Result<()>;
}

/// Runtime permissions needed before a download may start (storage and
/// notifications on Android).
pub trait PermissionGate: Send + Sync {
    fn has_permissions(&self) -> bool;

    /// Ask the user. The answer arrives later through
    /// [`Updater::on_permission_result`](super::Updater::on_permission_result).
    fn request_permissions(&self, request_code: i32);
}

/// User-facing surface. Implementations that own a UI thread must marshal
/// these calls onto it.
pub trait UserInterface: Send + Sync {
    /// Show the update prompt; `true` means the affirmative button was chosen.
    fn confirm_update(&self, dialog: &UpdateDialog, release: &ReleaseDescriptor) -> bool;

    /// Transient message (toast, status line).
    fn show_message(&self, message: &str);
}

/// Callbacks for one update check.
pub trait UpdateListener: Send + Sync {
    fn on_update_available(&self, download_url: &str);

    fn on_update_failed(&self, error: &UpdateError);
}

/// Listener for callers that only care about the outcome returned by
/// [`CheckHandle::wait`](super::CheckHandle::wait).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl UpdateListener for NoopListener {
    fn on_update_available(&self, _download_url: &str) {}

    fn on_update_failed(&self, _error: &UpdateError) {}
}
