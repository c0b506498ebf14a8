//! Worker platform trait and shared types.
//!
//! The [`WorkerPlatform`] trait is the injectable boundary between the
//! [`UpdateCoordinator`](super::coordinator::UpdateCoordinator) and whatever
//! actually hosts the background worker. The production implementation is
//! [`FsWorkerPlatform`](super::fs_platform::FsWorkerPlatform), which polls a
//! deploy manifest on disk; tests substitute a mock that scripts check
//! results and records every call.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("background workers are not supported in this environment")]
    Unsupported,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),
    #[error("Update check failed: {0}")]
    CheckFailed(String),
    #[error("no update is waiting")]
    NothingWaiting,
}

/// A short-lived system notification raised when a new build is installed.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateNotice {
    pub title: String,
    pub body: String,
    /// The notification dismisses itself after this long.
    pub auto_dismiss: Duration,
}

/// Host-side operations the coordinator needs.
///
/// Every implementation must be safe to call from the polling thread and the
/// UI thread at once; `check` in particular may be invoked concurrently with
/// itself and must degrade to a redundant no-op, never corrupt state.
pub trait WorkerPlatform: Send + Sync {
    /// Register the background worker. Called at most once per coordinator.
    fn register(&self) -> Result<(), PlatformError>;

    /// Refresh the registration and report the version of a newly installed,
    /// waiting build, if any.
    fn check(&self) -> Result<Option<String>, PlatformError>;

    /// Whether system-notification permission is already granted. The
    /// coordinator never requests permission itself.
    fn notification_permission(&self) -> bool;

    /// Raise a system notification. Only called when permission is granted.
    fn notify(&self, notice: &UpdateNotice);

    /// Signal the waiting worker to take over. Returns once control has
    /// changed hands to the new build.
    fn skip_waiting(&self) -> Result<(), PlatformError>;

    /// Trigger the full reload that hands the session to the new build.
    fn reload(&self);
}
