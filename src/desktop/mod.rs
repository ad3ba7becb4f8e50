//! Implementations of the platform traits for desktop hosts: a plain HTTP
//! downloader, a console prompt and a permission gate that never asks.

mod download;
mod prompt;

pub use download::HttpDownloadService;
pub use prompt::ConsolePrompt;

use crate::update::PermissionGate;

/// Desktop processes need no runtime grants to write a download.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn has_permissions(&self) -> bool {
        true
    }

    fn request_permissions(&self, _request_code: i32) {}
}
