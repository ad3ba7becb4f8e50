//! Check a GitHub repository for a newer release and walk the user through
//! downloading and installing it.
//!
//! The flow is strictly forward: fetch the latest release, compare its tag to
//! the running version, tell the listener, prompt, check permissions, then
//! hand the asset to the [`DownloadBridge`].

pub mod config;
pub mod github;
pub mod installer;
pub mod platform;
pub mod state;
pub mod version;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

pub use config::{UpdateConfig, UpdateConfigBuilder, UpdateDialog};
pub use github::{ReleaseDescriptor, ReleaseFetcher};
pub use installer::{DownloadBridge, DownloadTicket};
pub use platform::{
    DownloadId, DownloadRequest, DownloadService, InstallRequest, NoopListener, PermissionGate,
    UpdateListener, UserInterface, PERMISSION_REQUEST_CODE,
};
pub use state::UpdateState;

use crate::error::{Result, UpdateError};

/// What the user's answer to the prompt led to.
#[derive(Debug)]
pub enum Decision {
    Declined,
    /// Permissions were requested; the host must forward the answer to
    /// [`Updater::on_permission_result`].
    AwaitingPermission,
    Downloading(DownloadTicket),
    /// The bridge refused the download. Already reported to the listener.
    DownloadRejected(UpdateError),
}

/// Final result of one [`Updater::check_for_updates`] call.
#[derive(Debug)]
pub enum CheckOutcome {
    UpToDate { version: String },
    UpdateAvailable {
        release: ReleaseDescriptor,
        decision: Decision,
    },
    Failed(UpdateError),
    Cancelled,
}

/// Handle to a running check.
pub struct CheckHandle {
    cancel: Arc<AtomicBool>,
    rx: Receiver<CheckOutcome>,
}

impl CheckHandle {
    /// Stop issuing callbacks and prompts. The in-flight HTTP request is left
    /// to finish or time out on its own.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn wait(self) -> CheckOutcome {
        self.rx.recv().unwrap_or_else(|_| worker_lost())
    }

    /// Wait at most `timeout`. Hands the handle back if the check is still
    /// running so the caller can wait again or cancel.
    pub fn wait_timeout(self, timeout: Duration) -> std::result::Result<CheckOutcome, CheckHandle> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(outcome),
            Err(RecvTimeoutError::Timeout) => Err(self),
            Err(RecvTimeoutError::Disconnected) => Ok(worker_lost()),
        }
    }
}

fn worker_lost() -> CheckOutcome {
    CheckOutcome::Failed(UpdateError::Io("update check worker exited unexpectedly".into()))
}

struct PendingDownload {
    release: ReleaseDescriptor,
    listener: Arc<dyn UpdateListener>,
}

struct Inner {
    config: UpdateConfig,
    fetcher: ReleaseFetcher,
    bridge: DownloadBridge,
    permissions: Arc<dyn PermissionGate>,
    ui: Arc<dyn UserInterface>,
    state: Mutex<UpdateState>,
    pending: Mutex<Option<PendingDownload>>,
    in_flight: AtomicBool,
}

/// Orchestrates check → prompt → permission → download for one repository.
///
/// Cheap to clone; clones share state, so a permission result forwarded to
/// any clone resumes the pending download.
#[derive(Clone)]
pub struct Updater {
    inner: Arc<Inner>,
}

impl Updater {
    pub fn new(
        config: UpdateConfig,
        service: Arc<dyn DownloadService>,
        permissions: Arc<dyn PermissionGate>,
        ui: Arc<dyn UserInterface>,
    ) -> Result<Self> {
        let fetcher = ReleaseFetcher::new(&config)?;
        let bridge = DownloadBridge::new(&config, service, Arc::clone(&ui));

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                fetcher,
                bridge,
                permissions,
                ui,
                state: Mutex::new(UpdateState::Idle),
                pending: Mutex::new(None),
                in_flight: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.inner.config
    }

    pub fn state(&self) -> UpdateState {
        lock(&self.inner.state).clone()
    }

    pub fn is_checking(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Start a check on a background thread and return immediately.
    ///
    /// Only one check runs at a time; a second call while one is in flight
    /// fails with [`UpdateError::CheckInProgress`] and fires no callbacks.
    pub fn check_for_updates(&self, listener: Arc<dyn UpdateListener>) -> Result<CheckHandle> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("update check already running");
            return Err(UpdateError::CheckInProgress);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let worker_cancel = Arc::clone(&cancel);

        let spawned = thread::Builder::new()
            .name("update-check".into())
            .spawn(move || {
                let outcome = {
                    let _flight = FlightGuard(&inner.in_flight);
                    inner.run_check(listener, &worker_cancel)
                };
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            self.inner.in_flight.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        Ok(CheckHandle { cancel, rx })
    }

    /// Forward the host's permission answer. Returns the download ticket when
    /// the grant started a download.
    pub fn on_permission_result(&self, request_code: i32, granted: bool) -> Option<DownloadTicket> {
        if request_code != PERMISSION_REQUEST_CODE {
            return None;
        }

        let pending = lock(&self.inner.pending).take()?;
        if granted {
            info!("permission granted, starting download");
            match self.inner.start_download(&pending.release, pending.listener) {
                Decision::Downloading(ticket) => Some(ticket),
                _ => None,
            }
        } else {
            info!("permission denied");
            self.inner.set_state(UpdateState::Idle);
            let error = UpdateError::PermissionDenied;
            self.inner.ui.show_message(error.user_message());
            pending.listener.on_update_failed(&error);
            None
        }
    }
}

impl Inner {
    fn set_state(&self, state: UpdateState) {
        debug!(%state, "update state");
        *lock(&self.state) = state;
    }

    fn run_check(&self, listener: Arc<dyn UpdateListener>, cancel: &AtomicBool) -> CheckOutcome {
        let cancelled = || cancel.load(Ordering::SeqCst);
        if cancelled() {
            return CheckOutcome::Cancelled;
        }

        // A grant forwarded after this point belongs to an earlier cycle.
        lock(&self.pending).take();
        self.set_state(UpdateState::Checking);
        let fetched = self
            .fetcher
            .fetch_latest(&self.config.owner, &self.config.repo);

        if cancelled() {
            self.set_state(UpdateState::Idle);
            return CheckOutcome::Cancelled;
        }

        let release = match fetched {
            Ok(release) => release,
            Err(error) => {
                warn!(%error, "update check failed");
                self.set_state(UpdateState::CheckFailed);
                listener.on_update_failed(&error);
                return CheckOutcome::Failed(error);
            }
        };

        if !version::is_update(&self.config.current_version, &release.version) {
            info!(version = %release.version, "already on the latest release");
            self.set_state(UpdateState::UpToDate);
            return CheckOutcome::UpToDate {
                version: release.version,
            };
        }

        info!(
            current = %self.config.current_version,
            latest = %release.version,
            "update available"
        );
        self.set_state(UpdateState::UpdateAvailable {
            download_url: release.download_url.clone(),
        });
        listener.on_update_available(&release.download_url);

        if cancelled() {
            self.set_state(UpdateState::Idle);
            return CheckOutcome::Cancelled;
        }

        let decision = if self.ui.confirm_update(&self.config.dialog, &release) {
            self.proceed(&release, listener)
        } else {
            debug!("update declined");
            self.set_state(UpdateState::Idle);
            Decision::Declined
        };

        CheckOutcome::UpdateAvailable { release, decision }
    }

    fn proceed(&self, release: &ReleaseDescriptor, listener: Arc<dyn UpdateListener>) -> Decision {
        if self.permissions.has_permissions() {
            return self.start_download(release, listener);
        }

        // Stored before asking; a gate may answer synchronously.
        *lock(&self.pending) = Some(PendingDownload {
            release: release.clone(),
            listener,
        });
        self.set_state(UpdateState::AwaitingPermission {
            download_url: release.download_url.clone(),
        });
        self.permissions.request_permissions(PERMISSION_REQUEST_CODE);
        Decision::AwaitingPermission
    }

    fn start_download(&self, release: &ReleaseDescriptor, listener: Arc<dyn UpdateListener>) -> Decision {
        self.set_state(UpdateState::Downloading {
            download_url: release.download_url.clone(),
        });
        match self.bridge.start(release, listener) {
            Ok(ticket) => Decision::Downloading(ticket),
            Err(error) => {
                self.set_state(UpdateState::Idle);
                Decision::DownloadRejected(error)
            }
        }
    }
}

struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
