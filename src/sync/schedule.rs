//! Schedule assembly.
//!
//! The weekly schedule is the join of three catalogs: raw schedule items,
//! subjects and teachers. The three are fetched as one batch; a failure of any
//! call fails the whole batch, which is retried after a fixed delay.

use std::time::Duration;

use qrschool_config::SyncConfig;
use qrschool_core::{ErrorKind, SyncError};
use qrschool_models::schedule::{subject_lookup, teacher_lookup};
use qrschool_models::{ScheduleItem, ScheduleSlot, Subject, Teacher};
use tracing::{info, instrument, warn};

use crate::client::StudentApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.schedule_max_attempts.max(1),
            delay: config.schedule_retry_delay(),
        }
    }
}

/// Join raw items against the catalogs. Unresolved ids get the sentinel
/// labels; item order is preserved.
pub fn assemble(items: &[ScheduleItem], subjects: &[Subject], teachers: &[Teacher]) -> Vec<ScheduleSlot> {
    let subjects = subject_lookup(subjects);
    let teachers = teacher_lookup(teachers);
    items
        .iter()
        .map(|item| ScheduleSlot::resolve(item, &subjects, &teachers))
        .collect()
}

// A garbled body is worth another attempt as much as a dropped connection;
// rejected credentials are not.
fn worth_retrying(err: &SyncError) -> bool {
    err.is_retryable() || err.kind() == ErrorKind::Validation
}

/// Fetch and assemble the schedule under `policy`.
///
/// # Errors
///
/// [`SyncError::Exhausted`] wrapping the last failure once every attempt
/// failed; non-retryable failures are returned as they are.
#[instrument(skip(api, token))]
pub async fn fetch_schedule<A: StudentApi>(
    api: &A,
    token: &str,
    policy: &RetryPolicy,
) -> Result<Vec<ScheduleSlot>, SyncError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let batch = tokio::try_join!(
            api.fetch_schedule_items(token),
            api.fetch_subjects(token),
            api.fetch_teachers(token),
        );

        match batch {
            Ok((items, subjects, teachers)) => {
                let slots = assemble(&items, &subjects, &teachers);
                info!(attempt, slots = slots.len(), "Schedule assembled");
                return Ok(slots);
            }
            Err(e) if !worth_retrying(&e) => return Err(e),
            Err(e) if attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %e,
                    "Schedule fetch failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                warn!(attempts = attempt, error = %e, "Schedule fetch gave up");
                return Err(SyncError::Exhausted {
                    operation: "schedule fetch",
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
        }
    }
}
