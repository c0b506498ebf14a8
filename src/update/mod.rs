//! Update coordination — detect a newer deployed build, mediate activation.
//!
//! | Concern | Module |
//! |---|---|
//! | Injectable platform boundary + mock | [`platform`] |
//! | Production platform over a deploy manifest | [`fs_platform`] |
//! | Polling, triggers, latch, apply flow | [`coordinator`] |

pub mod coordinator;
pub mod fs_platform;
pub mod platform;

pub use coordinator::{
    DEV_POLL_INTERVAL, PROD_POLL_INTERVAL, UpdateAvailable, UpdateCoordinator, UpdatePhase,
    poll_interval_for_host,
};
pub use fs_platform::{DeployManifest, FsWorkerPlatform, write_deploy_manifest};
pub use platform::{PlatformError, UpdateNotice, WorkerPlatform};
