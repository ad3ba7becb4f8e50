pub mod config;
pub mod desktop;
pub mod error;
pub mod update;

pub use error::{ErrorKind, Result, UpdateError};
pub use update::{CheckHandle, CheckOutcome, Decision, UpdateConfig, UpdateListener, Updater};
