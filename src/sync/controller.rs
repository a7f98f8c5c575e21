//! The attendance sync pipeline.
//!
//! ```text
//! Idle ──token──▶ TokenReady ──profile──▶ ProfileLoaded ──schedule──▶ ScheduleLoaded ──channel open──▶ Live
//!   │                  │                        │
//!   └─▶ AuthFailed     └─▶ Failed               └─▶ Failed
//! ```
//!
//! The attendance snapshot is fetched in the background as soon as a token is
//! available and again after every applied realtime event. The channel opens
//! only once the schedule is assembled, since event notifications are resolved
//! against its slots.

use std::future::Future;
use std::sync::Arc;

use qrschool_auth::{AuthApi, SessionProvider, TokenStore};
use qrschool_config::SyncConfig;
use qrschool_core::SyncError;
use qrschool_models::{AttendanceEvent, AttendanceMap, EventRejection};
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::attendance::fetch_attendance;
use super::schedule::{RetryPolicy, fetch_schedule};
use super::snapshot::{ChannelState, SyncHandle, SyncSnapshot, SyncStage};
use crate::client::{AttendanceFeed, FeedConnection, StudentApi};
use crate::notify::{NotificationDispatcher, Notifier, attendance_notification};

pub const REALTIME_UNAVAILABLE: &str = "Realtime updates unavailable";

type Reconciled = (u64, Result<AttendanceMap, SyncError>);

fn task_failure(task: &str, err: &JoinError) -> SyncError {
    if err.is_panic() {
        SyncError::internal(format!("{task} task panicked"))
    } else {
        SyncError::internal(format!("{task} task: {err}"))
    }
}

/// Mutable state of one run. Only the run task touches it; consumers see
/// published clones of `snapshot`.
struct RunState {
    tx: watch::Sender<SyncSnapshot>,
    snapshot: SyncSnapshot,
    shutdown: oneshot::Receiver<()>,
    /// At most one live fetch; a finished but unjoined one may linger.
    reconciles: JoinSet<Reconciled>,
}

impl RunState {
    fn publish(&self) {
        self.tx.send_replace(self.snapshot.clone());
    }

    fn set_stage(&mut self, stage: SyncStage) {
        debug!(from = %self.snapshot.stage, to = %stage, "Stage transition");
        self.snapshot.stage = stage;
        self.publish();
    }

    fn set_channel(&mut self, realtime: ChannelState) {
        self.snapshot.realtime = realtime;
        self.publish();
    }

    fn fail(&mut self, stage: SyncStage, err: &SyncError) {
        self.reconciles.abort_all();
        self.snapshot.error = Some(err.to_string());
        self.set_stage(stage);
    }

    fn stop(&mut self) {
        self.reconciles.abort_all();
        if self.snapshot.realtime != ChannelState::Disconnected {
            self.snapshot.realtime = ChannelState::Closed;
        }
        self.set_stage(SyncStage::Stopped);
        info!(version = self.snapshot.version, "Sync stopped");
    }
}

enum Pump {
    Shutdown,
    Closed { received: bool },
}

pub struct SyncController<A, S, F, N> {
    api: Arc<A>,
    session: Arc<SessionProvider<S, A>>,
    feed: F,
    notifications: NotificationDispatcher<N>,
    config: SyncConfig,
}

impl<A, S, F, N> SyncController<A, S, F, N>
where
    A: StudentApi + AuthApi,
    S: TokenStore,
    F: AttendanceFeed,
    N: Notifier,
{
    pub fn new(
        api: Arc<A>,
        session: Arc<SessionProvider<S, A>>,
        feed: F,
        notifier: N,
        config: SyncConfig,
    ) -> Self {
        let notifications = NotificationDispatcher::new(notifier, config.notify_timeout());
        Self {
            api,
            session,
            feed,
            notifications,
            config,
        }
    }

    /// Start the pipeline on the current runtime.
    pub fn spawn(self) -> SyncHandle {
        let (tx, rx) = watch::channel(SyncSnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let span = info_span!("attendance_sync", run_id = %Uuid::new_v4());
        let task = tokio::spawn(self.run(tx, shutdown_rx).instrument(span));
        SyncHandle::new(rx, shutdown_tx, task)
    }

    /// Run the pipeline until it fails or `shutdown` fires (or its sender is
    /// dropped). The final snapshot is always published before returning.
    pub async fn run(self, tx: watch::Sender<SyncSnapshot>, shutdown: oneshot::Receiver<()>) {
        let mut run = RunState {
            tx,
            snapshot: SyncSnapshot::default(),
            shutdown,
            reconciles: JoinSet::new(),
        };
        run.publish();

        let token = match self.drive(&mut run, self.session.get_valid_token()).await {
            None => return run.stop(),
            Some(Ok(token)) => token,
            Some(Err(e)) => {
                warn!(error = %e, "No valid session, sign in required");
                return run.fail(SyncStage::AuthFailed, &e);
            }
        };
        run.set_stage(SyncStage::TokenReady);
        self.reconcile(&mut run, &token);

        let profile = match self.drive(&mut run, self.api.fetch_profile(&token)).await {
            None => return run.stop(),
            Some(Ok(profile)) => profile,
            Some(Err(e)) => {
                warn!(error = %e, "Profile fetch failed");
                return run.fail(SyncStage::Failed, &e);
            }
        };
        let student_id = profile.student_id.clone();
        info!(%student_id, "Profile loaded");
        run.snapshot.profile = Some(Arc::new(profile));
        run.set_stage(SyncStage::ProfileLoaded);

        let policy = RetryPolicy::from_config(&self.config);
        let schedule = match self
            .drive(&mut run, fetch_schedule(&*self.api, &token, &policy))
            .await
        {
            None => return run.stop(),
            Some(Ok(schedule)) => schedule,
            Some(Err(e)) => return run.fail(SyncStage::Failed, &e),
        };
        run.snapshot.schedule = schedule.into();
        run.set_stage(SyncStage::ScheduleLoaded);

        if run.snapshot.schedule.is_empty() {
            info!("Empty schedule, realtime channel not opened");
        } else if !self.live(&mut run, &student_id, token).await {
            return run.stop();
        }

        // Channel gone for good; keep absorbing reconciliations until told to stop.
        self.drive(&mut run, std::future::pending::<()>()).await;
        run.stop();
    }

    /// Spawn a snapshot fetch tagged with the current version, replacing any
    /// fetch still in flight.
    fn reconcile(&self, run: &mut RunState, token: &str) {
        run.reconciles.abort_all();
        let tag = run.snapshot.version;
        let api = Arc::clone(&self.api);
        let token = token.to_string();
        run.reconciles
            .spawn(async move { (tag, fetch_attendance(&*api, &token).await) }.in_current_span());
    }

    fn absorb(&self, run: &mut RunState, joined: Result<Reconciled, JoinError>) {
        match joined {
            Ok((tag, Ok(map))) if tag == run.snapshot.version => {
                debug!(tag, entries = map.len(), "Attendance snapshot applied");
                run.snapshot.attendance = Arc::new(map);
                run.publish();
            }
            Ok((tag, Ok(_))) => {
                debug!(tag, version = run.snapshot.version, "Discarding superseded attendance snapshot");
            }
            Ok((tag, Err(e))) => warn!(tag, error = %e, "Attendance snapshot fetch failed"),
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                let err = task_failure("attendance snapshot", &e);
                warn!(error = %err, "Attendance snapshot task failed");
            }
        }
    }

    /// Await `fut` while applying finished reconciliations. `None` means
    /// shutdown was requested first.
    async fn drive<T>(&self, run: &mut RunState, fut: impl Future<Output = T>) -> Option<T> {
        tokio::pin!(fut);
        loop {
            let joined = tokio::select! {
                biased;
                _ = &mut run.shutdown => return None,
                out = &mut fut => return Some(out),
                Some(joined) = run.reconciles.join_next(), if !run.reconciles.is_empty() => joined,
            };
            self.absorb(run, joined);
        }
    }

    /// Connect and pump the channel, reconnecting as configured. Returns
    /// `false` on shutdown.
    async fn live(&self, run: &mut RunState, student_id: &str, mut token: String) -> bool {
        let reconnect = self.config.reconnect;
        let mut attempt = 0u32;

        loop {
            run.set_channel(ChannelState::Connecting);
            match self.drive(run, self.feed.connect(&token)).await {
                None => return false,
                Some(Ok(mut conn)) => {
                    run.snapshot.realtime_warning = None;
                    run.snapshot.stage = SyncStage::Live;
                    run.set_channel(ChannelState::Open);

                    match self.pump(run, &mut conn, student_id, &token).await {
                        Pump::Shutdown => {
                            conn.close().await;
                            return false;
                        }
                        Pump::Closed { received } => {
                            conn.close().await;
                            if received {
                                attempt = 0;
                            }
                        }
                    }
                }
                Some(Err(e)) => warn!(error = %e, "Attendance channel connect failed"),
            }

            run.snapshot.realtime_warning = Some(REALTIME_UNAVAILABLE.to_string());
            run.set_channel(ChannelState::Closed);
            warn!("{REALTIME_UNAVAILABLE}");

            if !reconnect.enabled() || attempt >= reconnect.max_attempts {
                return true;
            }
            let delay = reconnect.delay_for(attempt);
            attempt += 1;
            info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting attendance channel");
            if self.drive(run, tokio::time::sleep(delay)).await.is_none() {
                return false;
            }

            token = match self.drive(run, self.session.get_valid_token()).await {
                None => return false,
                Some(Ok(token)) => token,
                Some(Err(e)) => {
                    warn!(error = %e, "Cannot reconnect without a valid session");
                    return true;
                }
            };
        }
    }

    async fn pump(
        &self,
        run: &mut RunState,
        conn: &mut F::Connection,
        student_id: &str,
        token: &str,
    ) -> Pump {
        let mut received = false;
        loop {
            enum Step {
                Message(Option<Result<String, SyncError>>),
                Reconciled(Result<Reconciled, JoinError>),
            }

            let step = tokio::select! {
                biased;
                _ = &mut run.shutdown => return Pump::Shutdown,
                Some(joined) = run.reconciles.join_next(), if !run.reconciles.is_empty() => {
                    Step::Reconciled(joined)
                }
                message = conn.next_message() => Step::Message(message),
            };

            match step {
                Step::Reconciled(joined) => self.absorb(run, joined),
                Step::Message(None) => {
                    info!("Attendance channel closed by server");
                    return Pump::Closed { received };
                }
                Step::Message(Some(Err(e))) => {
                    warn!(error = %e, "Attendance channel error");
                    return Pump::Closed { received };
                }
                Step::Message(Some(Ok(text))) => {
                    received = true;
                    if !self.handle_message(run, &text, student_id, token).await {
                        return Pump::Shutdown;
                    }
                }
            }
        }
    }

    /// Apply one feed message. Returns `false` if shutdown arrived while the
    /// notification was being shown.
    async fn handle_message(
        &self,
        run: &mut RunState,
        text: &str,
        student_id: &str,
        token: &str,
    ) -> bool {
        let event = match AttendanceEvent::parse(text, student_id) {
            Ok(event) => event,
            Err(EventRejection::ForeignStudent) => {
                warn!("Ignoring attendance event addressed to another student");
                return true;
            }
            Err(rejection) => {
                let err = SyncError::from(rejection);
                warn!(error = %err, "Dropping attendance event");
                return true;
            }
        };

        let key = event.key();
        let mut attendance = AttendanceMap::clone(&run.snapshot.attendance);
        let changed = attendance.apply(key.clone(), event.status);
        run.snapshot.attendance = Arc::new(attendance);
        run.snapshot.version += 1;
        run.publish();
        info!(
            %key,
            status = %event.status,
            raw_status = event.raw_status.as_deref().unwrap_or_default(),
            changed,
            version = run.snapshot.version,
            "Attendance event applied"
        );

        self.reconcile(run, token);

        let notification = attendance_notification(&event, run.snapshot.slot(&event.schedule_id));
        self.drive(run, self.notifications.dispatch(&notification))
            .await
            .is_some()
    }
}
