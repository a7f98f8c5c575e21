//! Typed REST client for the school backend.
//!
//! Every endpoint returns structured JSON that is decoded straight into the
//! models in `qrschool-models`.

use qrschool_auth::AuthApi;
use qrschool_config::ApiConfig;
use qrschool_core::SyncError;
use qrschool_models::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, ScheduleItem, StudentProfile,
    Subject, Teacher,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{RawAttendance, StudentApi};

pub const LOGIN_PATH: &str = "/auth/login/";
pub const REFRESH_PATH: &str = "/api/token/refresh/";
pub const PROFILE_PATH: &str = "/api/student/profile/";
pub const ATTENDANCE_PATH: &str = "/api/student/attendance/";
pub const SCHEDULE_PATH: &str = "/api/student/schedule/";
pub const SUBJECTS_PATH: &str = "/api/student/subjects/";
pub const TEACHERS_PATH: &str = "/api/student/teachers/";

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

fn transport(operation: &'static str) -> impl FnOnce(reqwest::Error) -> SyncError {
    move |err| {
        if err.is_decode() {
            SyncError::validation(format!("{operation}: {err}"))
        } else {
            SyncError::network(operation, err.status().map(|s| s.as_u16()), err.to_string())
        }
    }
}

impl ApiClient {
    /// Build a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Config`] if the base URL is not an http(s) URL or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::config(format!("HTTP client: {e}")))?;
        Self::with_http_client(config, http)
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    pub fn with_http_client(config: &ApiConfig, http: reqwest::Client) -> Result<Self, SyncError> {
        let base_url: Url = config
            .base_url
            .parse()
            .map_err(|e| SyncError::config(format!("QRSCHOOL_API_URL {:?}: {e}", config.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SyncError::config(format!(
                "QRSCHOOL_API_URL must be http or https, got {}",
                base_url.scheme()
            )));
        }
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` below the base URL, keeping any path prefix the base has.
    pub fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
            .parse()
            .map_err(|e| SyncError::config(format!("endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &'static str,
        token: &str,
    ) -> Result<T, SyncError> {
        let url = self.endpoint(path)?;
        debug!(%url, operation, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport(operation))?;
        let response = Self::ensure_success(response, operation).await?;
        response.json::<T>().await.map_err(transport(operation))
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        operation: &'static str,
        body: &B,
    ) -> Result<T, SyncError> {
        let url = self.endpoint(path)?;
        debug!(%url, operation, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport(operation))?;
        let response = Self::ensure_success(response, operation).await?;
        response.json::<T>().await.map_err(transport(operation))
    }

    /// Checks the HTTP status; returns the response on success or an error
    /// carrying the backend's `error`/`detail` message when it sent one.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, SyncError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::network(operation, Some(status), error_detail(&body)))
    }
}

/// Pull a human message out of an error body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "detail"]
                .iter()
                .find_map(|field| v.get(*field).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

impl StudentApi for ApiClient {
    #[instrument(skip(self, token))]
    async fn fetch_profile(&self, token: &str) -> Result<StudentProfile, SyncError> {
        self.get_json(PROFILE_PATH, "profile fetch", token).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_attendance(&self, token: &str) -> Result<RawAttendance, SyncError> {
        self.get_json(ATTENDANCE_PATH, "attendance fetch", token).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_schedule_items(&self, token: &str) -> Result<Vec<ScheduleItem>, SyncError> {
        self.get_json(SCHEDULE_PATH, "schedule fetch", token).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_subjects(&self, token: &str) -> Result<Vec<Subject>, SyncError> {
        self.get_json(SUBJECTS_PATH, "subjects fetch", token).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_teachers(&self, token: &str) -> Result<Vec<Teacher>, SyncError> {
        self.get_json(TEACHERS_PATH, "teachers fetch", token).await
    }
}

impl AuthApi for ApiClient {
    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, SyncError> {
        self.post_json(LOGIN_PATH, "login", request).await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<String, SyncError> {
        let body = RefreshRequest {
            refresh: refresh_token.to_string(),
        };
        let response: RefreshResponse = self.post_json(REFRESH_PATH, "token refresh", &body).await?;
        Ok(response.access)
    }
}
