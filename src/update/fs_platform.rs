//! Filesystem worker platform — polls a deploy manifest on disk.
//!
//! A deployed build ships a small JSON manifest next to its assets:
//!
//! ```json
//! { "version": "1.4.2" }
//! ```
//!
//! Registration records the manifest as the active build. Each check re-reads
//! the file and compares a SHA-256 fingerprint of its contents, so any new
//! deploy is detected — including same-version content changes and mtime-only
//! touches in either direction. A changed manifest becomes the *waiting*
//! build; `skip_waiting` promotes it to active, and `reload` records that the
//! session must be restarted on the new build.

use super::platform::{PlatformError, UpdateNotice, WorkerPlatform};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// The deploy manifest a build publishes alongside its assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployManifest {
    pub version: String,
}

/// One observed deploy: its declared version plus a content fingerprint.
/// Equality is by fingerprint — the version string is for display.
#[derive(Debug, Clone)]
struct DeployStamp {
    version: String,
    fingerprint: String,
}

impl PartialEq for DeployStamp {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

#[derive(Default)]
struct RegistrationState {
    active: Option<DeployStamp>,
    waiting: Option<DeployStamp>,
}

/// Production [`WorkerPlatform`] over a deploy-manifest file.
pub struct FsWorkerPlatform {
    manifest_path: PathBuf,
    notifications: bool,
    state: Mutex<RegistrationState>,
    reloaded: AtomicBool,
}

impl FsWorkerPlatform {
    pub fn new(manifest_path: impl Into<PathBuf>, notifications: bool) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            notifications,
            state: Mutex::new(RegistrationState::default()),
            reloaded: AtomicBool::new(false),
        }
    }

    /// Whether `reload` has been triggered. The embedding shell watches this
    /// to restart onto the new build.
    pub fn reload_requested(&self) -> bool {
        self.reloaded.load(Ordering::SeqCst)
    }

    fn read_stamp(&self) -> Result<DeployStamp, PlatformError> {
        let bytes = std::fs::read(&self.manifest_path)?;
        let manifest: DeployManifest = serde_json::from_slice(&bytes).map_err(|e| {
            PlatformError::CheckFailed(format!(
                "invalid deploy manifest {}: {}",
                self.manifest_path.display(),
                e
            ))
        })?;
        Ok(DeployStamp {
            version: manifest.version,
            fingerprint: format!("{:x}", Sha256::digest(&bytes)),
        })
    }
}

/// Write a deploy manifest. The publish side of what
/// [`FsWorkerPlatform`] polls; used by deploy tooling and tests.
pub fn write_deploy_manifest(path: &Path, version: &str) -> std::io::Result<()> {
    let manifest = DeployManifest {
        version: version.to_string(),
    };
    let json = serde_json::to_string_pretty(&manifest).expect("manifest serializes");
    std::fs::write(path, json)
}

impl WorkerPlatform for FsWorkerPlatform {
    fn register(&self) -> Result<(), PlatformError> {
        let stamp = self.read_stamp().map_err(|e| {
            PlatformError::RegistrationFailed(format!(
                "{}: {}",
                self.manifest_path.display(),
                e
            ))
        })?;
        let mut state = self.state.lock().unwrap();
        state.active = Some(stamp);
        Ok(())
    }

    fn check(&self) -> Result<Option<String>, PlatformError> {
        let stamp = self.read_stamp()?;
        let mut state = self.state.lock().unwrap();
        let Some(active) = &state.active else {
            return Err(PlatformError::CheckFailed("worker not registered".to_string()));
        };
        if stamp == *active {
            state.waiting = None;
            return Ok(None);
        }
        let version = stamp.version.clone();
        state.waiting = Some(stamp);
        Ok(Some(version))
    }

    fn notification_permission(&self) -> bool {
        self.notifications
    }

    fn notify(&self, notice: &UpdateNotice) {
        info!(
            title = %notice.title,
            body = %notice.body,
            auto_dismiss_secs = notice.auto_dismiss.as_secs(),
            "update notification"
        );
    }

    fn skip_waiting(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        let waiting = state.waiting.take().ok_or(PlatformError::NothingWaiting)?;
        info!(version = %waiting.version, "waiting build took control");
        state.active = Some(waiting);
        Ok(())
    }

    fn reload(&self) {
        self.reloaded.store(true, Ordering::SeqCst);
        info!("reload triggered");
    }
}
