use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::{Result, UpdateError};
use crate::update::{DownloadId, DownloadRequest, DownloadService, InstallRequest};

const USER_AGENT: &str = concat!("release-updater/", env!("CARGO_PKG_VERSION"));
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Downloads over HTTP on a background thread per request and installs by
/// running an external command with the file path appended
/// (e.g. `adb install -r`).
pub struct HttpDownloadService {
    client: Client,
    download_dir: PathBuf,
    installer: Option<Vec<String>>,
    show_progress: bool,
    next_id: AtomicU64,
    jobs: Mutex<HashMap<DownloadId, JoinHandle<Result<PathBuf>>>>,
}

impl HttpDownloadService {
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| UpdateError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            download_dir: download_dir.into(),
            installer: None,
            show_progress: false,
            next_id: AtomicU64::new(1),
            jobs: Mutex::new(HashMap::new()),
        })
    }

    /// The user's download folder, or the temp dir when there is none.
    pub fn default_download_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(std::env::temp_dir)
    }

    /// Program and leading arguments used to install a finished download.
    pub fn with_installer(mut self, command: Vec<String>) -> Self {
        self.installer = if command.is_empty() { None } else { Some(command) };
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn jobs(&self) -> std::sync::MutexGuard<'_, HashMap<DownloadId, JoinHandle<Result<PathBuf>>>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DownloadService for HttpDownloadService {
    fn submit(&self, request: &DownloadRequest) -> Result<DownloadId> {
        fs::create_dir_all(&self.download_dir)?;

        let id = DownloadId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let dest = self.download_dir.join(&request.file_name);
        let client = self.client.clone();
        let url = request.url.clone();
        let progress = self.show_progress.then(|| new_progress_bar(&request.title));

        debug!(%id, %url, dest = %dest.display(), "starting download");
        let handle = thread::Builder::new()
            .name(format!("download-{}", id.0))
            .spawn(move || {
                let result = download_to(&client, url.as_str(), &dest, progress.as_ref());
                if let Some(pb) = &progress {
                    match &result {
                        Ok(_) => pb.finish_with_message("Download complete"),
                        Err(_) => pb.abandon_with_message("Download failed"),
                    }
                }
                result.map(|_| dest)
            })?;

        self.jobs().insert(id, handle);
        Ok(id)
    }

    fn on_complete(&self, id: DownloadId) -> Result<PathBuf> {
        let handle = self
            .jobs()
            .remove(&id)
            .ok_or_else(|| UpdateError::DownloadFailed(format!("unknown download {}", id)))?;

        handle
            .join()
            .unwrap_or_else(|_| Err(UpdateError::DownloadFailed(format!("download {} panicked", id))))
    }

    fn request_install(&self, request: &InstallRequest) -> Result<()> {
        let Some((program, args)) = self.installer.as_ref().and_then(|c| c.split_first()) else {
            info!(path = %request.path.display(), "no installer configured, leaving file in place");
            return Ok(());
        };

        info!(%program, path = %request.path.display(), "running installer");
        let status = Command::new(program)
            .args(args)
            .arg(&request.path)
            .status()
            .map_err(|e| UpdateError::Install(format!("failed to run {}: {}", program, e)))?;

        if !status.success() {
            return Err(UpdateError::Install(format!("{} exited with {}", program, status)));
        }
        Ok(())
    }
}

fn new_progress_bar(title: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} {spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(title.to_string());
    pb
}

/// Stream `url` into `dest`, overwriting any earlier file.
fn download_to(client: &Client, url: &str, dest: &Path, progress: Option<&ProgressBar>) -> Result<u64> {
    let mut response = client
        .get(url)
        .send()
        .map_err(|e| UpdateError::DownloadFailed(format!("failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(UpdateError::DownloadFailed(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    if let (Some(pb), Some(total)) = (progress, response.content_length()) {
        pb.set_length(total);
    }

    let mut file = File::create(dest)?;
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| UpdateError::DownloadFailed(format!("connection dropped: {}", e)))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        if let Some(pb) = progress {
            pb.set_position(downloaded);
        }
    }

    file.flush()?;
    Ok(downloaded)
}
