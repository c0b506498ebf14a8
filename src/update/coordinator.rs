//! Deploy-update coordination.
//!
//! [`UpdateCoordinator`] owns the registration with a [`WorkerPlatform`],
//! polls it for newly installed builds, and mediates the user's decision to
//! activate one. Detection is fed by three independent triggers — the
//! background poll, visibility regained, and focus regained — all funneled
//! into the same idempotent check. Background polling alone under-detects in
//! suspended tabs; the event triggers catch the "user comes back to an open
//! tab" case immediately instead of waiting for the next tick. Keep them
//! separate; the redundancy is intentional.
//!
//! The `update_available` flag is a one-way latch: checks only ever set it,
//! and the only thing that clears it is the reload that ends the session.
//! This is what makes concurrent triggers harmless — any interleaving of
//! checks converges on the same observable state.

use super::platform::{UpdateNotice, WorkerPlatform};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Poll interval on localhost-like hosts.
pub const DEV_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Poll interval everywhere else.
pub const PROD_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Gap between the two checks of [`UpdateCoordinator::force_check`]. The
/// platform's own refresh is asynchronous and does not reliably reflect new
/// state within the same tick, so a forced check deliberately runs twice.
pub const FORCE_CHECK_GAP: Duration = Duration::from_secs(1);

/// How long the update notification stays up before dismissing itself.
pub const NOTICE_AUTO_DISMISS: Duration = Duration::from_secs(5);

/// Classify a hostname into a poll interval. Hostname-based deployment
/// convenience, not a security boundary.
pub fn poll_interval_for_host(host: &str) -> Duration {
    if is_dev_host(host) {
        DEV_POLL_INTERVAL
    } else {
        PROD_POLL_INTERVAL
    }
}

fn is_dev_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    if host == "::1" || host == "[::1]" || host.starts_with("[::1]:") {
        return true;
    }
    let name = host.split(':').next().unwrap_or(&host);
    matches!(name, "localhost" | "127.0.0.1" | "0.0.0.0") || name.ends_with(".localhost")
}

/// Coordinator lifecycle. No transition skips `UpdateAvailable`, and nothing
/// leaves `Applying` short of the reload that discards all of this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Unregistered,
    Registered,
    UpdateAvailable,
    Applying,
}

/// The one event surface: a new build is installed and waiting.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAvailable {
    pub version: String,
}

struct CoordState {
    phase: UpdatePhase,
    /// Version of the waiting build, kept so each newly installed build
    /// notifies exactly once.
    waiting_version: Option<String>,
}

struct Shared<P> {
    platform: P,
    poll_interval: Duration,
    state: Mutex<CoordState>,
    update_available: AtomicBool,
    started: AtomicBool,
    reload_fired: AtomicBool,
    listener: Mutex<Option<Sender<UpdateAvailable>>>,
}

/// Tracks whether a newer deployed build is available and applies it on
/// request. One coordinator per session; state lives until the reload.
pub struct UpdateCoordinator<P: WorkerPlatform + 'static> {
    shared: Arc<Shared<P>>,
}

impl<P: WorkerPlatform + 'static> UpdateCoordinator<P> {
    /// Coordinator with the poll interval classified from `host`.
    pub fn new(platform: P, host: &str) -> Self {
        Self::with_poll_interval(platform, poll_interval_for_host(host))
    }

    /// Coordinator with an explicit poll interval.
    pub fn with_poll_interval(platform: P, poll_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                platform,
                poll_interval,
                state: Mutex::new(CoordState {
                    phase: UpdatePhase::Unregistered,
                    waiting_version: None,
                }),
                update_available: AtomicBool::new(false),
                started: AtomicBool::new(false),
                reload_fired: AtomicBool::new(false),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Register the single "update available" listener, replacing any
    /// previous one.
    pub fn set_listener(&self, listener: Sender<UpdateAvailable>) {
        *self.shared.listener.lock().unwrap() = Some(listener);
    }

    /// Register the background worker and begin watching for updates: one
    /// immediate check, then a recurring check every poll interval.
    ///
    /// Runs at most once per coordinator. A failed registration is logged
    /// and leaves the coordinator permanently inert for this session — the
    /// next full navigation re-registers from scratch.
    pub fn start(&self) {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.shared.platform.register() {
            warn!("worker registration failed, update checks disabled: {e}");
            return;
        }
        self.shared.state.lock().unwrap().phase = UpdatePhase::Registered;
        info!(poll_interval_secs = self.shared.poll_interval.as_secs(), "update watcher started");

        self.shared.run_check();

        let weak = Arc::downgrade(&self.shared);
        let interval = self.shared.poll_interval;
        let spawned = thread::Builder::new()
            .name("update-poll".to_string())
            .spawn(move || poll_loop(weak, interval));
        if let Err(e) = spawned {
            warn!("failed to spawn update poll thread: {e}");
        }
    }

    /// Ask the platform to refresh and latch any newly installed build.
    /// Idempotent; safe to call from any trigger in any interleaving.
    pub fn check_for_updates(&self) {
        self.shared.run_check();
    }

    /// Trigger: the tab became visible again.
    pub fn on_visibility_regained(&self) {
        self.shared.run_check();
    }

    /// Trigger: the window regained focus.
    pub fn on_focus_regained(&self) {
        self.shared.run_check();
    }

    /// Two checks with a [`FORCE_CHECK_GAP`] pause in between. Blocks the
    /// caller for the gap.
    pub fn force_check(&self) {
        self.force_check_with_gap(FORCE_CHECK_GAP);
    }

    fn force_check_with_gap(&self, gap: Duration) {
        self.shared.run_check();
        thread::sleep(gap);
        self.shared.run_check();
    }

    /// Signal the waiting build to take over and reload onto it. The reload
    /// fires exactly once; this is the only path that ever clears
    /// `update_available`. No-op unless an update is available.
    pub fn apply_update(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            if state.phase != UpdatePhase::UpdateAvailable {
                return;
            }
            state.phase = UpdatePhase::Applying;
        }
        match self.shared.platform.skip_waiting() {
            Ok(()) => {
                // Control has changed hands; restart the session once.
                if !self.shared.reload_fired.swap(true, Ordering::SeqCst) {
                    self.shared.platform.reload();
                }
            }
            Err(e) => warn!("apply update failed: {e}"),
        }
    }

    pub fn update_available(&self) -> bool {
        self.shared.update_available.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> UpdatePhase {
        self.shared.state.lock().unwrap().phase
    }

    pub fn waiting_version(&self) -> Option<String> {
        self.shared.state.lock().unwrap().waiting_version.clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.shared.poll_interval
    }

    pub fn platform(&self) -> &P {
        &self.shared.platform
    }
}

fn poll_loop<P: WorkerPlatform>(weak: Weak<Shared<P>>, interval: Duration) {
    // The interval runs for the coordinator's whole life; the loop ends at
    // the first tick after the coordinator is gone.
    loop {
        thread::sleep(interval);
        match weak.upgrade() {
            Some(shared) => shared.run_check(),
            None => break,
        }
    }
}

impl<P: WorkerPlatform> Shared<P> {
    fn run_check(&self) {
        if self.state.lock().unwrap().phase == UpdatePhase::Unregistered {
            return;
        }
        match self.platform.check() {
            Ok(Some(version)) => self.update_found(version),
            Ok(None) => {}
            // Transient; no retry here — the next trigger checks again.
            Err(e) => warn!("update check failed: {e}"),
        }
    }

    fn update_found(&self, version: String) {
        {
            let mut state = self.state.lock().unwrap();
            if state.waiting_version.as_deref() == Some(version.as_str()) {
                return;
            }
            state.waiting_version = Some(version.clone());
            if state.phase == UpdatePhase::Registered {
                state.phase = UpdatePhase::UpdateAvailable;
            }
            self.update_available.store(true, Ordering::SeqCst);
        }

        info!(%version, "new build installed and waiting");
        if let Some(listener) = &*self.listener.lock().unwrap() {
            let _ = listener.send(UpdateAvailable {
                version: version.clone(),
            });
        }
        if self.platform.notification_permission() {
            self.platform.notify(&UpdateNotice {
                title: "Update available".to_string(),
                body: format!("Pulsly {version} is ready — reload to get the latest."),
                auto_dismiss: NOTICE_AUTO_DISMISS,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::platform::tests::{MockPlatform, RecordedOp};
    use std::sync::mpsc;

    fn idle(platform: MockPlatform) -> UpdateCoordinator<MockPlatform> {
        // An interval long enough that the poll thread never ticks in-test.
        UpdateCoordinator::with_poll_interval(platform, Duration::from_secs(3600))
    }

    #[test]
    fn localhost_polls_every_30_seconds() {
        assert_eq!(poll_interval_for_host("localhost"), Duration::from_millis(30_000));
        assert_eq!(poll_interval_for_host("localhost:5173"), DEV_POLL_INTERVAL);
        assert_eq!(poll_interval_for_host("127.0.0.1"), DEV_POLL_INTERVAL);
        assert_eq!(poll_interval_for_host("[::1]:8080"), DEV_POLL_INTERVAL);
        assert_eq!(poll_interval_for_host("preview.localhost"), DEV_POLL_INTERVAL);
    }

    #[test]
    fn production_hosts_poll_every_5_minutes() {
        assert_eq!(
            poll_interval_for_host("app.example.com"),
            Duration::from_millis(300_000)
        );
        assert_eq!(poll_interval_for_host("localhost.evil.com"), PROD_POLL_INTERVAL);
    }

    #[test]
    fn start_registers_once_and_checks_immediately() {
        let coordinator = idle(MockPlatform::new());
        coordinator.start();
        coordinator.start();

        let registers = coordinator.platform().count_ops(|op| *op == RecordedOp::Register);
        let checks = coordinator.platform().count_ops(|op| *op == RecordedOp::Check);
        assert_eq!(registers, 1);
        assert_eq!(checks, 1);
        assert_eq!(coordinator.phase(), UpdatePhase::Registered);
    }

    #[test]
    fn failed_registration_leaves_coordinator_inert() {
        let coordinator = idle(MockPlatform::unsupported());
        coordinator.start();
        coordinator.check_for_updates();
        coordinator.force_check_with_gap(Duration::ZERO);
        coordinator.start();

        assert_eq!(coordinator.phase(), UpdatePhase::Unregistered);
        assert_eq!(coordinator.platform().count_ops(|op| *op == RecordedOp::Register), 1);
        // Inert: no check ever reaches the platform.
        assert_eq!(coordinator.platform().count_ops(|op| *op == RecordedOp::Check), 0);
    }

    #[test]
    fn check_latches_update_available() {
        let coordinator = idle(MockPlatform::with_checks(vec![
            None,
            Some("2.0".to_string()),
        ]));
        coordinator.start();
        assert!(!coordinator.update_available());

        coordinator.check_for_updates();
        assert!(coordinator.update_available());
        assert_eq!(coordinator.phase(), UpdatePhase::UpdateAvailable);
        assert_eq!(coordinator.waiting_version(), Some("2.0".to_string()));
    }

    #[test]
    fn latch_survives_checks_that_report_nothing() {
        let coordinator = idle(MockPlatform::with_checks(vec![
            Some("2.0".to_string()),
            None,
            None,
        ]));
        coordinator.start();
        assert!(coordinator.update_available());

        coordinator.check_for_updates();
        coordinator.on_focus_regained();
        assert!(coordinator.update_available(), "only a reload clears the latch");
        assert_eq!(coordinator.phase(), UpdatePhase::UpdateAvailable);
    }

    #[test]
    fn duplicate_checks_are_idempotent() {
        let (tx, rx) = mpsc::channel();
        let coordinator = idle(
            MockPlatform::with_checks(vec![
                Some("2.0".to_string()),
                Some("2.0".to_string()),
            ])
            .with_permission(),
        );
        coordinator.set_listener(tx);
        coordinator.start();
        coordinator.check_for_updates();

        assert_eq!(rx.try_iter().count(), 1, "one installed build, one event");
        let notifies = coordinator
            .platform()
            .count_ops(|op| matches!(op, RecordedOp::Notify { .. }));
        assert_eq!(notifies, 1);
    }

    #[test]
    fn each_new_build_notifies_again() {
        let (tx, rx) = mpsc::channel();
        let coordinator = idle(MockPlatform::with_checks(vec![
            Some("2.0".to_string()),
            Some("3.0".to_string()),
        ]));
        coordinator.set_listener(tx);
        coordinator.start();
        coordinator.check_for_updates();

        let events: Vec<_> = rx.try_iter().map(|e| e.version).collect();
        assert_eq!(events, vec!["2.0".to_string(), "3.0".to_string()]);
    }

    #[test]
    fn no_system_notification_without_permission() {
        let coordinator = idle(MockPlatform::with_checks(vec![Some("2.0".to_string())]));
        coordinator.start();

        assert!(coordinator.update_available());
        let notifies = coordinator
            .platform()
            .count_ops(|op| matches!(op, RecordedOp::Notify { .. }));
        assert_eq!(notifies, 0);
    }

    #[test]
    fn notification_auto_dismisses_after_5_seconds() {
        let coordinator = idle(MockPlatform::with_checks(vec![Some("2.0".to_string())]).with_permission());
        coordinator.start();

        let ops = coordinator.platform().get_operations();
        assert!(ops.iter().any(|op| matches!(
            op,
            RecordedOp::Notify { auto_dismiss, .. } if *auto_dismiss == Duration::from_secs(5)
        )));
    }

    #[test]
    fn apply_update_reloads_exactly_once() {
        let coordinator = idle(MockPlatform::with_checks(vec![Some("2.0".to_string())]));
        coordinator.start();
        assert!(coordinator.update_available());

        coordinator.apply_update();
        coordinator.apply_update();

        assert_eq!(coordinator.phase(), UpdatePhase::Applying);
        assert_eq!(coordinator.platform().count_ops(|op| *op == RecordedOp::SkipWaiting), 1);
        assert_eq!(coordinator.platform().count_ops(|op| *op == RecordedOp::Reload), 1);
    }

    #[test]
    fn apply_update_without_an_update_is_a_noop() {
        let coordinator = idle(MockPlatform::new());
        coordinator.start();
        coordinator.apply_update();

        assert_eq!(coordinator.phase(), UpdatePhase::Registered);
        assert_eq!(coordinator.platform().count_ops(|op| *op == RecordedOp::SkipWaiting), 0);
    }

    #[test]
    fn check_failure_is_absorbed_and_recovers() {
        let platform = MockPlatform::with_checks(vec![None, Some("2.0".to_string())]);
        platform.fail_checks.store(true, std::sync::atomic::Ordering::SeqCst);
        let coordinator = idle(platform);
        coordinator.start();
        assert!(!coordinator.update_available());

        coordinator
            .platform()
            .fail_checks
            .store(false, std::sync::atomic::Ordering::SeqCst);
        coordinator.check_for_updates();
        coordinator.check_for_updates();
        assert!(coordinator.update_available());
    }

    #[test]
    fn force_check_runs_two_checks() {
        let coordinator = idle(MockPlatform::new());
        coordinator.start();
        coordinator.force_check_with_gap(Duration::from_millis(10));

        assert_eq!(coordinator.platform().count_ops(|op| *op == RecordedOp::Check), 3);
    }

    #[test]
    fn force_check_gap_is_one_second() {
        assert_eq!(FORCE_CHECK_GAP, Duration::from_secs(1));
    }

    #[test]
    fn polling_thread_detects_a_later_deploy() {
        let coordinator = UpdateCoordinator::with_poll_interval(
            MockPlatform::with_checks(vec![None, None, Some("2.0".to_string())]),
            Duration::from_millis(10),
        );
        coordinator.start();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !coordinator.update_available() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(coordinator.update_available());
        assert!(coordinator.platform().count_ops(|op| *op == RecordedOp::Check) >= 3);
    }
}
