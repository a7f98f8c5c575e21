//! Session provider.
//!
//! Hands out the current access token. At most one access token is current at
//! a time: the provider caches the stored session and replaces the cached copy
//! only after the token store accepted the new one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use qrschool_core::SyncError;
use qrschool_models::{LoginRequest, LoginResponse, Session};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::claims::is_expiring;
use crate::store::TokenStore;

/// Authentication endpoints of the backend.
pub trait AuthApi: Send + Sync + 'static {
    /// `POST /auth/login/`
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<LoginResponse, SyncError>> + Send;

    /// `POST /api/token/refresh/`, returning the new access token.
    fn refresh(&self, refresh_token: &str)
    -> impl Future<Output = Result<String, SyncError>> + Send;
}

pub struct SessionProvider<S, A> {
    store: S,
    auth: Arc<A>,
    leeway: Duration,
    cached: Mutex<Option<Session>>,
}

impl<S, A> SessionProvider<S, A>
where
    S: TokenStore,
    A: AuthApi,
{
    pub fn new(store: S, auth: Arc<A>, leeway: Duration) -> Self {
        Self {
            store,
            auth,
            leeway,
            cached: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return a usable access token, refreshing it first when it is absent or
    /// about to expire.
    ///
    /// # Errors
    ///
    /// [`SyncError::Auth`] when there is no refresh token or the refresh is
    /// rejected; the caller must send the user back to sign in.
    /// [`SyncError::Storage`] when the store cannot be read or written.
    #[instrument(skip(self))]
    pub async fn get_valid_token(&self) -> Result<String, SyncError> {
        let mut cached = self.cached.lock().await;
        let session = match cached.as_ref() {
            Some(session) => session.clone(),
            None => self.store.load().await?,
        };

        if let Some(access) = session.access_token() {
            if !is_expiring(access, self.leeway) {
                let token = access.to_string();
                *cached = Some(session);
                return Ok(token);
            }
            info!("Access token expired or expiring, refreshing");
        } else {
            info!("No access token stored, refreshing");
        }

        let (token, refreshed) = self.refresh_session(session).await?;
        *cached = Some(refreshed);
        Ok(token)
    }

    async fn refresh_session(&self, session: Session) -> Result<(String, Session), SyncError> {
        let Some(refresh_token) = session.refresh_token().map(str::to_owned) else {
            warn!("No refresh token available");
            return Err(SyncError::auth("no stored session, sign in required"));
        };

        let access = match self.auth.refresh(&refresh_token).await {
            Ok(access) if !access.is_empty() => access,
            Ok(_) => {
                warn!("Token refresh returned an empty access token");
                return Err(SyncError::auth("token refresh returned no access token"));
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return Err(SyncError::auth(format!("token refresh failed: {e}")));
            }
        };

        let refreshed = session.with_access_token(access.clone());
        self.store.save(&refreshed).await?;
        info!("Access token refreshed");
        Ok((access, refreshed))
    }

    /// Sign in and persist the returned tokens.
    #[instrument(skip(self, request), fields(username = %request.username, role = %request.role))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, SyncError> {
        request
            .validate()
            .map_err(|e| SyncError::validation(e.to_string()))?;

        let response = self.auth.login(&request).await.map_err(|e| match e.status() {
            Some(400) | Some(401) | Some(403) => SyncError::auth(format!("login rejected: {e}")),
            _ => e,
        })?;

        let session = Session::from_login(&response);
        self.store.save(&session).await?;
        *self.cached.lock().await = Some(session);
        info!(role = ?response.role, "Login successful, tokens stored");
        Ok(response)
    }

    /// Drop the session from the store and the cache.
    pub async fn logout(&self) -> Result<(), SyncError> {
        let mut cached = self.cached.lock().await;
        self.store.clear().await?;
        *cached = None;
        info!("Session cleared");
        Ok(())
    }
}
