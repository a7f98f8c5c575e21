#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use qrschool::client::{AttendanceFeed, FeedConnection, RawAttendance, StudentApi};
use qrschool::notify::RecordingNotifier;
use qrschool::sync::{SyncController, SyncHandle};
use qrschool_auth::{AuthApi, MemoryTokenStore, SessionProvider};
use qrschool_config::SyncConfig;
use qrschool_core::SyncError;
use qrschool_models::{
    AttendanceStatus, LoginRequest, LoginResponse, ScheduleItem, Session, StudentProfile, Subject,
    Teacher,
};
use tokio::sync::mpsc;

pub const STUDENT_ID: &str = "42";

/// HS256 access token expiring `secs` from now, signed with a key the client
/// never sees.
pub fn mint_token(secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "exp": now + secs,
        "iat": now,
        "user_id": 42,
        "token_type": "access",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-only-secret"),
    )
    .unwrap()
}

pub fn valid_session() -> Session {
    Session {
        access_token: Some(mint_token(3600)),
        refresh_token: Some("refresh-1".into()),
        role: Some("student".into()),
    }
}

pub fn event(student_id: &str, schedule_id: &str, date: &str, status: &str) -> String {
    serde_json::json!({
        "type": "attendance_update",
        "studentId": student_id,
        "scheduleId": schedule_id,
        "date": date,
        "status": status,
    })
    .to_string()
}

pub fn schedule_item(id: i64, day: &str, subject: i64, teacher: i64) -> ScheduleItem {
    ScheduleItem {
        id,
        day: day.into(),
        subject,
        start_time: "08:00:00".into(),
        end_time: "09:00:00".into(),
        teacher,
        classe: Some(1),
        level: None,
        notes: None,
    }
}

#[derive(Default)]
struct Counters {
    profile: AtomicUsize,
    schedule: AtomicUsize,
    subjects: AtomicUsize,
    teachers: AtomicUsize,
    attendance: AtomicUsize,
    refresh: AtomicUsize,
}

/// Scripted backend.
pub struct FakeApi {
    pub profile: Mutex<Option<StudentProfile>>,
    pub items: Mutex<Vec<ScheduleItem>>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    /// Served by every attendance fetch unless a scripted response is queued.
    pub attendance: Mutex<HashMap<String, String>>,
    /// Per-call (delay, response) overrides, consumed in call order.
    pub scripted_attendance: Mutex<VecDeque<(Duration, HashMap<String, String>)>>,
    /// Number of upcoming schedule batches whose subject call fails.
    pub failing_batches: AtomicU32,
    pub refresh_result: Mutex<Option<String>>,
    pub profile_tokens: Mutex<Vec<String>>,
    counters: Counters,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            profile: Mutex::new(Some(StudentProfile {
                student_id: STUDENT_ID.into(),
                name: "Amina Benali".into(),
                email: Some("amina@example.com".into()),
                photo: None,
                qr_code: None,
                level: Some(2),
            })),
            items: Mutex::new(vec![
                schedule_item(7, "MON", 1, 10),
                schedule_item(8, "TUE", 99, 98),
            ]),
            subjects: vec![Subject {
                id: 1,
                name: "Mathematics".into(),
            }],
            teachers: vec![Teacher {
                id: 10,
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
            }],
            attendance: Mutex::new(HashMap::new()),
            scripted_attendance: Mutex::new(VecDeque::new()),
            failing_batches: AtomicU32::new(0),
            refresh_result: Mutex::new(None),
            profile_tokens: Mutex::new(Vec::new()),
            counters: Counters::default(),
        }
    }

    pub fn with_failing_batches(self, n: u32) -> Self {
        self.failing_batches.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_refresh(self, access: &str) -> Self {
        *self.refresh_result.lock().unwrap() = Some(access.to_string());
        self
    }

    pub fn without_profile(self) -> Self {
        *self.profile.lock().unwrap() = None;
        self
    }

    pub fn with_items(self, items: Vec<ScheduleItem>) -> Self {
        *self.items.lock().unwrap() = items;
        self
    }

    pub fn set_attendance(&self, entries: &[(&str, &str)]) {
        *self.attendance.lock().unwrap() = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
    }

    /// Record a mark server-side, as the backend does before pushing it.
    pub fn record_mark(&self, schedule_id: &str, date: &str, status: &str) {
        let key = format!("{date}-{schedule_id}");
        let mut attendance = self.attendance.lock().unwrap();
        if AttendanceStatus::normalize(Some(status)).is_set() {
            attendance.insert(key, status.to_string());
        } else {
            attendance.remove(&key);
        }
    }

    pub fn script_attendance(&self, delay: Duration, entries: &[(&str, &str)]) {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.scripted_attendance.lock().unwrap().push_back((delay, map));
    }

    pub fn profile_calls(&self) -> usize {
        self.counters.profile.load(Ordering::SeqCst)
    }

    pub fn schedule_calls(&self) -> usize {
        self.counters.schedule.load(Ordering::SeqCst)
    }

    pub fn subjects_calls(&self) -> usize {
        self.counters.subjects.load(Ordering::SeqCst)
    }

    pub fn attendance_calls(&self) -> usize {
        self.counters.attendance.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.counters.refresh.load(Ordering::SeqCst)
    }
}

impl StudentApi for FakeApi {
    async fn fetch_profile(&self, token: &str) -> Result<StudentProfile, SyncError> {
        self.counters.profile.fetch_add(1, Ordering::SeqCst);
        self.profile_tokens.lock().unwrap().push(token.to_string());
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SyncError::network("profile fetch", Some(404), "Student not found"))
    }

    async fn fetch_attendance(&self, _token: &str) -> Result<RawAttendance, SyncError> {
        self.counters.attendance.fetch_add(1, Ordering::SeqCst);
        let scripted = self.scripted_attendance.lock().unwrap().pop_front();
        match scripted {
            Some((delay, map)) => {
                tokio::time::sleep(delay).await;
                Ok(map)
            }
            None => Ok(self.attendance.lock().unwrap().clone()),
        }
    }

    async fn fetch_schedule_items(&self, _token: &str) -> Result<Vec<ScheduleItem>, SyncError> {
        self.counters.schedule.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.lock().unwrap().clone())
    }

    async fn fetch_subjects(&self, _token: &str) -> Result<Vec<Subject>, SyncError> {
        self.counters.subjects.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_batches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SyncError::network("subjects fetch", Some(503), "unavailable"));
        }
        Ok(self.subjects.clone())
    }

    async fn fetch_teachers(&self, _token: &str) -> Result<Vec<Teacher>, SyncError> {
        self.counters.teachers.fetch_add(1, Ordering::SeqCst);
        Ok(self.teachers.clone())
    }
}

impl AuthApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, SyncError> {
        Ok(LoginResponse {
            access: mint_token(3600),
            refresh: "refresh-login".into(),
            role: Some(request.role.to_string()),
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<String, SyncError> {
        self.counters.refresh.fetch_add(1, Ordering::SeqCst);
        self.refresh_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SyncError::network("token refresh", Some(401), "token not valid"))
    }
}

#[derive(Default)]
struct FeedInner {
    pending: Mutex<VecDeque<mpsc::UnboundedReceiver<String>>>,
    tokens: Mutex<Vec<String>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

/// Feed whose connections are prepared by the test. Each prepared connection
/// delivers what is sent on its sender and closes when the sender is dropped.
#[derive(Clone, Default)]
pub struct FakeFeed {
    inner: Arc<FeedInner>,
}

impl FakeFeed {
    pub fn add_connection(&self) -> mpsc::UnboundedSender<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.pending.lock().unwrap().push_back(rx);
        tx
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.inner.tokens.lock().unwrap().clone()
    }
}

pub struct FakeConnection {
    rx: mpsc::UnboundedReceiver<String>,
    inner: Arc<FeedInner>,
}

impl AttendanceFeed for FakeFeed {
    type Connection = FakeConnection;

    async fn connect(&self, token: &str) -> Result<FakeConnection, SyncError> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.tokens.lock().unwrap().push(token.to_string());
        let rx = self.inner.pending.lock().unwrap().pop_front();
        match rx {
            Some(rx) => Ok(FakeConnection {
                rx,
                inner: Arc::clone(&self.inner),
            }),
            None => Err(SyncError::network("realtime connect", Some(503), "refused")),
        }
    }
}

impl FeedConnection for FakeConnection {
    async fn next_message(&mut self) -> Option<Result<String, SyncError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.rx.close();
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub feed: FakeFeed,
    pub notifier: RecordingNotifier,
    pub session: Arc<SessionProvider<MemoryTokenStore, FakeApi>>,
}

impl Harness {
    pub fn new(api: FakeApi, session: Session) -> Self {
        let api = Arc::new(api);
        let session = Arc::new(SessionProvider::new(
            MemoryTokenStore::new(session),
            Arc::clone(&api),
            Duration::from_secs(30),
        ));
        Self {
            api,
            feed: FakeFeed::default(),
            notifier: RecordingNotifier::new(),
            session,
        }
    }

    /// Mark attendance on the backend and push the matching event down `tx`.
    pub fn push(
        &self,
        tx: &mpsc::UnboundedSender<String>,
        schedule_id: &str,
        date: &str,
        status: &str,
    ) {
        self.api.record_mark(schedule_id, date, status);
        tx.send(event(STUDENT_ID, schedule_id, date, status)).unwrap();
    }

    pub fn start(&self, config: SyncConfig) -> SyncHandle {
        SyncController::new(
            Arc::clone(&self.api),
            Arc::clone(&self.session),
            self.feed.clone(),
            self.notifier.clone(),
            config,
        )
        .spawn()
    }
}

/// Fast config for tests running on paused time.
pub fn test_config() -> SyncConfig {
    SyncConfig {
        schedule_retry_delay_ms: 2000,
        notify_timeout_ms: 500,
        ..SyncConfig::default()
    }
}

/// Poll `condition` until it holds, letting paused time advance between polls.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}
