//! What consumers of the sync observe.

use std::fmt;
use std::sync::Arc;

use qrschool_models::{AttendanceKey, AttendanceMap, AttendanceStatus, ScheduleSlot, StudentProfile};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Pipeline stage. Stages only move forward; the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStage {
    #[default]
    Idle,
    TokenReady,
    ProfileLoaded,
    ScheduleLoaded,
    Live,
    /// No usable session; the user has to sign in again.
    AuthFailed,
    Failed,
    Stopped,
}

impl SyncStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AuthFailed | Self::Failed | Self::Stopped)
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::TokenReady => "token_ready",
            Self::ProfileLoaded => "profile_loaded",
            Self::ScheduleLoaded => "schedule_loaded",
            Self::Live => "live",
            Self::AuthFailed => "auth_failed",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// State of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// Immutable view of the merged sync state.
///
/// Cloning is cheap: the profile, schedule and attendance map are shared.
#[derive(Debug, Clone, Default)]
pub struct SyncSnapshot {
    pub stage: SyncStage,
    pub realtime: ChannelState,
    pub profile: Option<Arc<StudentProfile>>,
    pub schedule: Arc<[ScheduleSlot]>,
    pub attendance: Arc<AttendanceMap>,
    /// Bumped once per applied realtime event.
    pub version: u64,
    /// User-facing banner for a failure that ended the pipeline.
    pub error: Option<String>,
    /// Set while realtime updates are unavailable. REST data stays usable.
    pub realtime_warning: Option<String>,
}

impl SyncSnapshot {
    pub fn slot(&self, id: &str) -> Option<&ScheduleSlot> {
        self.schedule.iter().find(|slot| slot.id == id)
    }

    pub fn status(&self, date: &str, slot_id: &str) -> AttendanceStatus {
        self.attendance.status(&AttendanceKey::new(date, slot_id))
    }
}

/// Owner side of a running sync.
///
/// Dropping the handle stops the sync just like [`SyncHandle::shutdown`], but
/// without waiting for it to finish.
pub struct SyncHandle {
    state: watch::Receiver<SyncSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub(crate) fn new(
        state: watch::Receiver<SyncSnapshot>,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            state,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.borrow().clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// Returns `None` if the sync finished without ever satisfying it.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&SyncSnapshot) -> bool,
    ) -> Option<SyncSnapshot> {
        self.state
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }

    /// Close the channel, discard in-flight fetches and wait for the sync to
    /// stop. Returns the final snapshot.
    pub async fn shutdown(mut self) -> SyncSnapshot {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Sync task ended abnormally");
            }
        }
        self.snapshot()
    }
}
