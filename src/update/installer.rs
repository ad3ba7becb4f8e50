use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};
use url::Url;

use super::config::UpdateConfig;
use super::github::ReleaseDescriptor;
use super::platform::{
    DownloadId, DownloadRequest, DownloadService, InstallRequest, UpdateListener, UserInterface,
    APK_MIME_TYPE,
};
use crate::error::{Result, UpdateError};

/// Hands release assets to the platform downloader and installs them once the
/// transfer completes.
///
/// Every failure is reported twice: as a message on the [`UserInterface`] and
/// through the listener's `on_update_failed`. Callers should not report the
/// returned errors again.
pub struct DownloadBridge {
    service: Arc<dyn DownloadService>,
    ui: Arc<dyn UserInterface>,
    file_name: String,
    title: String,
    description: String,
}

/// A submitted download and its one-shot completion waiter.
#[derive(Debug)]
pub struct DownloadTicket {
    pub id: DownloadId,
    waiter: JoinHandle<Result<PathBuf>>,
}

impl DownloadTicket {
    /// Block until the file was handed to the installer (or failed).
    pub fn wait(self) -> Result<PathBuf> {
        self.waiter
            .join()
            .unwrap_or_else(|_| Err(UpdateError::DownloadFailed("completion waiter panicked".into())))
    }
}

impl DownloadBridge {
    pub fn new(
        config: &UpdateConfig,
        service: Arc<dyn DownloadService>,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        Self {
            service,
            ui,
            file_name: config.file_name.clone(),
            title: config.download_title.clone(),
            description: config.download_description.clone(),
        }
    }

    pub fn start(
        &self,
        release: &ReleaseDescriptor,
        listener: Arc<dyn UpdateListener>,
    ) -> Result<DownloadTicket> {
        let submitted = validate_url(&release.download_url).and_then(|url| {
            let request = DownloadRequest {
                url,
                file_name: self.file_name.clone(),
                title: self.title.clone(),
                description: self.description.clone(),
                notify_on_completion: true,
            };
            self.service.submit(&request).map_err(|e| match e {
                UpdateError::DownloadFailed(_) => e,
                other => UpdateError::DownloadFailed(other.to_string()),
            })
        });

        let id = match submitted {
            Ok(id) => id,
            Err(e) => {
                report(self.ui.as_ref(), listener.as_ref(), &e);
                return Err(e);
            }
        };
        info!(%id, url = %release.download_url, "download submitted");

        let service = Arc::clone(&self.service);
        let ui = Arc::clone(&self.ui);
        let expected_size = release.asset_size;
        let waiter = thread::spawn(move || {
            let result = finish_download(service.as_ref(), id, expected_size);
            if let Err(e) = &result {
                report(ui.as_ref(), listener.as_ref(), e);
            }
            result
        });

        Ok(DownloadTicket { id, waiter })
    }
}

/// Accept only absolute http(s) URLs.
pub fn validate_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| UpdateError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn finish_download(
    service: &dyn DownloadService,
    id: DownloadId,
    expected_size: Option<u64>,
) -> Result<PathBuf> {
    let path = service.on_complete(id).map_err(|e| match e {
        UpdateError::DownloadFailed(_) => e,
        other => UpdateError::DownloadFailed(format!("download {}: {}", id, other)),
    })?;

    if !path.exists() {
        return Err(UpdateError::FileMissing(path.display().to_string()));
    }

    if let Some(expected) = expected_size {
        check_size(&path, expected)?;
    }

    // Size is the only check; the installer is the one verifying signatures.
    warn!(path = %path.display(), "installing artifact without signature verification");
    service.request_install(&InstallRequest {
        path: path.clone(),
        mime_type: APK_MIME_TYPE,
    })?;

    info!(path = %path.display(), "install requested");
    Ok(path)
}

fn check_size(path: &Path, expected: u64) -> Result<()> {
    let actual = fs::metadata(path)
        .map_err(|e| UpdateError::DownloadFailed(format!("cannot inspect {}: {}", path.display(), e)))?
        .len();
    if actual != expected {
        return Err(UpdateError::DownloadFailed(format!(
            "expected {} bytes, got {}",
            expected, actual
        )));
    }
    Ok(())
}

fn report(ui: &dyn UserInterface, listener: &dyn UpdateListener, error: &UpdateError) {
    warn!(%error, "download/install failed");
    ui.show_message(error.user_message());
    listener.on_update_failed(error);
}
