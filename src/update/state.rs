use std::fmt;

/// Where the orchestrator is in a check → prompt → download cycle.
///
/// `UpToDate`, `CheckFailed` and `Downloading` are terminal for a cycle; the
/// install step after `Downloading` runs on the download bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Checking,
    UpToDate,
    UpdateAvailable { download_url: String },
    AwaitingPermission { download_url: String },
    Downloading { download_url: String },
    CheckFailed,
}

impl Default for UpdateState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::UpToDate => "up to date",
            Self::UpdateAvailable { .. } => "update available",
            Self::AwaitingPermission { .. } => "awaiting permission",
            Self::Downloading { .. } => "downloading",
            Self::CheckFailed => "check failed",
        };
        f.write_str(name)
    }
}
