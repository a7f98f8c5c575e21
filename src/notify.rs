//! Local notifications for attendance changes.
//!
//! Delivery is best-effort: [`NotificationDispatcher`] bounds every attempt
//! with a timeout and never hands an error back to the sync flow.

use std::future::Future;
use std::time::Duration;

use qrschool_core::SyncError;
use qrschool_models::{AttendanceEvent, ScheduleSlot};
use tracing::{info, warn};

pub const ATTENDANCE_TITLE: &str = "Attendance Updated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Text for an applied attendance event. `slot` is the schedule slot the
/// event refers to, when the schedule has one.
pub fn attendance_notification(event: &AttendanceEvent, slot: Option<&ScheduleSlot>) -> Notification {
    let label = event.status.notification_label();
    let body = match slot {
        Some(slot) => format!(
            "Your attendance for {} on {} has been marked as {label}.",
            slot.subject_name, event.date
        ),
        None => format!(
            "Your attendance on {} has been marked as {label}.",
            event.date
        ),
    };
    Notification {
        title: ATTENDANCE_TITLE.to_string(),
        body,
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Writes notifications to the log. Used by the CLI, which has no system
/// notification surface.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), SyncError> {
        info!(title = %notification.title, body = %notification.body, "Notification");
        Ok(())
    }
}

pub struct NotificationDispatcher<N> {
    notifier: N,
    timeout: Duration,
}

impl<N: Notifier> NotificationDispatcher<N> {
    pub fn new(notifier: N, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Returns whether the notifier accepted the notification in time.
    pub async fn dispatch(&self, notification: &Notification) -> bool {
        match tokio::time::timeout(self.timeout, self.notifier.notify(notification)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, title = %notification.title, "Notification not delivered");
                false
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    title = %notification.title,
                    "Notification timed out"
                );
                false
            }
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingNotifier;

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Keeps every notification it is asked to show. Clones share the log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<Notification>>>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// Records, then reports a delivery failure.
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Sleeps for `delay` before recording.
        pub fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<(), SyncError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(notification.clone());
            }
            if self.fail {
                return Err(SyncError::Notification("permission denied".into()));
            }
            Ok(())
        }
    }
}
