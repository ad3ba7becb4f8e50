#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use release_updater::error::{Result, UpdateError};
use release_updater::update::{
    DownloadId, DownloadRequest, DownloadService, InstallRequest, PermissionGate, ReleaseDescriptor,
    UpdateDialog, UpdateListener, UserInterface,
};
use release_updater::{UpdateConfig, Updater};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const OWNER: &str = "2dust";
pub const REPO: &str = "V2rayNG";
pub const LATEST_PATH: &str = "/repos/2dust/V2rayNG/releases/latest";

pub fn release_json(tag: &str, urls: &[&str]) -> Value {
    let assets: Vec<Value> = urls
        .iter()
        .map(|url| json!({ "browser_download_url": url }))
        .collect();
    json!({ "tag_name": tag, "assets": assets })
}

/// Run blocking updater code off the async test runtime.
pub async fn blocking<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap();
}

#[derive(Default)]
pub struct RecordingListener {
    pub available: Mutex<Vec<String>>,
    pub failures: Mutex<Vec<UpdateError>>,
}

impl RecordingListener {
    pub fn available(&self) -> Vec<String> {
        self.available.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<UpdateError> {
        self.failures.lock().unwrap().clone()
    }
}

impl UpdateListener for RecordingListener {
    fn on_update_available(&self, download_url: &str) {
        self.available.lock().unwrap().push(download_url.to_string());
    }

    fn on_update_failed(&self, error: &UpdateError) {
        self.failures.lock().unwrap().push(error.clone());
    }
}

pub struct FakeUi {
    pub answer: bool,
    pub prompts: Mutex<Vec<(UpdateDialog, ReleaseDescriptor)>>,
    pub messages: Mutex<Vec<String>>,
}

impl FakeUi {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl UserInterface for FakeUi {
    fn confirm_update(&self, dialog: &UpdateDialog, release: &ReleaseDescriptor) -> bool {
        self.prompts
            .lock()
            .unwrap()
            .push((dialog.clone(), release.clone()));
        self.answer
    }

    fn show_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

pub struct FakePermissions {
    pub granted: AtomicBool,
    pub requests: Mutex<Vec<i32>>,
}

impl FakePermissions {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<i32> {
        self.requests.lock().unwrap().clone()
    }
}

impl PermissionGate for FakePermissions {
    fn has_permissions(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_permissions(&self, request_code: i32) {
        self.requests.lock().unwrap().push(request_code);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    WriteFile,
    SkipFile,
    Fail,
}

/// Download service that "downloads" by writing fixed bytes into a temp dir.
pub struct FakeDownloads {
    pub dir: TempDir,
    pub completion: Completion,
    pub contents: Vec<u8>,
    next_id: AtomicU64,
    pub submitted: Mutex<Vec<DownloadRequest>>,
    pub installed: Mutex<Vec<InstallRequest>>,
}

impl FakeDownloads {
    pub fn new(completion: Completion) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            completion,
            contents: b"fake apk".to_vec(),
            next_id: AtomicU64::new(100),
            submitted: Mutex::new(Vec::new()),
            installed: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted(&self) -> Vec<DownloadRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn installed(&self) -> Vec<InstallRequest> {
        self.installed.lock().unwrap().clone()
    }
}

impl DownloadService for FakeDownloads {
    fn submit(&self, request: &DownloadRequest) -> Result<DownloadId> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(DownloadId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn on_complete(&self, id: DownloadId) -> Result<PathBuf> {
        let file_name = self
            .submitted
            .lock()
            .unwrap()
            .last()
            .map(|r| r.file_name.clone())
            .unwrap_or_default();
        let path = self.dir.path().join(file_name);

        match self.completion {
            Completion::WriteFile => {
                fs::write(&path, &self.contents)?;
                Ok(path)
            }
            Completion::SkipFile => Ok(path),
            Completion::Fail => Err(UpdateError::DownloadFailed(format!("no such download {}", id))),
        }
    }

    fn request_install(&self, request: &InstallRequest) -> Result<()> {
        self.installed.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub struct Harness {
    pub updater: Updater,
    pub listener: Arc<RecordingListener>,
    pub ui: Arc<FakeUi>,
    pub permissions: Arc<FakePermissions>,
    pub downloads: Arc<FakeDownloads>,
}

pub struct HarnessOptions {
    pub current_version: &'static str,
    pub confirm: bool,
    pub granted: bool,
    pub completion: Completion,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            current_version: "1.0.0",
            confirm: false,
            granted: true,
            completion: Completion::WriteFile,
        }
    }
}

impl Harness {
    pub fn new(api_base: &str, options: HarnessOptions) -> Self {
        let config = UpdateConfig::builder()
            .owner(OWNER)
            .repo(REPO)
            .current_version(options.current_version)
            .api_base(api_base)
            .build()
            .unwrap();
        Self::with_config(config, options)
    }

    pub fn with_config(config: UpdateConfig, options: HarnessOptions) -> Self {
        let listener = Arc::new(RecordingListener::default());
        let ui = Arc::new(FakeUi::new(options.confirm));
        let permissions = Arc::new(FakePermissions::new(options.granted));
        let downloads = Arc::new(FakeDownloads::new(options.completion));

        let updater = Updater::new(config, downloads.clone(), permissions.clone(), ui.clone()).unwrap();

        Self {
            updater,
            listener,
            ui,
            permissions,
            downloads,
        }
    }
}
