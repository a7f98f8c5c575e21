mod common;

use std::time::Duration;

use common::FakeApi;
use qrschool::sync::{RetryPolicy, fetch_schedule};
use qrschool_core::{ErrorKind, SyncError};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(2000),
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_failures_then_success_returns_single_schedule() {
    let api = FakeApi::new().with_failing_batches(2);
    let started = Instant::now();

    let slots = assert_ok!(fetch_schedule(&api, "token", &policy()).await);

    assert_eq!(slots.len(), 2);
    let ids: Vec<_> = slots.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["7", "8"]);
    assert_eq!(api.schedule_calls(), 3);
    // Fixed delay between attempts, not exponential
    assert_eq!(started.elapsed(), Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_after_max_attempts() {
    let api = FakeApi::new().with_failing_batches(5);
    let started = Instant::now();

    let err = assert_err!(fetch_schedule(&api, "token", &policy()).await);

    match &err {
        SyncError::Exhausted { attempts, last, .. } => {
            assert_eq!(*attempts, 3);
            assert_eq!(last.status(), Some(503));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(api.subjects_calls(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn test_partial_batch_failure_is_retried_wholesale() {
    // Only the subject call fails; items are fetched again anyway
    let api = FakeApi::new().with_failing_batches(1);

    let slots = assert_ok!(fetch_schedule(&api, "token", &policy()).await);

    assert_eq!(api.schedule_calls(), 2);
    assert_eq!(slots[0].subject_name, "Mathematics");
    assert_eq!(slots[0].teacher_name, "Ada Lovelace");
}

#[tokio::test(start_paused = true)]
async fn test_unresolved_ids_get_fallback_labels() {
    let api = FakeApi::new();

    let slots = assert_ok!(fetch_schedule(&api, "token", &policy()).await);

    let orphan = slots.iter().find(|s| s.id == "8").unwrap();
    assert_eq!(orphan.subject_name, "Unknown Subject");
    assert_eq!(orphan.teacher_name, "Unknown Teacher");
    assert_eq!(orphan.day, "TUE");
    assert_eq!(orphan.start_time, "08:00");
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy_does_not_sleep() {
    let api = FakeApi::new().with_failing_batches(1);
    let started = Instant::now();
    let policy = RetryPolicy {
        max_attempts: 1,
        delay: Duration::from_secs(60),
    };

    let err = assert_err!(fetch_schedule(&api, "token", &policy).await);

    assert!(err.to_string().contains("after 1 attempts"));
    assert_eq!(started.elapsed(), Duration::ZERO);
}
