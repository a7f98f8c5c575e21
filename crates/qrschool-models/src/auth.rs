//! Authentication models.
//!
//! Request/response DTOs for `POST /auth/login/` and `POST /api/token/refresh/`,
//! and the [`Session`] that the token store persists between runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Account type selected on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Parent,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Parent => "parent",
            Self::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "parent" => Ok(Self::Parent),
            "teacher" => Ok(Self::Teacher),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub role: Role,
}

/// Response from the login endpoint.
///
/// `role` is kept as the backend sent it; unknown roles still sign in.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Tokens persisted by the token store.
///
/// Either token may be missing: a fresh install has neither, an expired
/// session may only have the refresh token left.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Session {
    pub fn from_login(response: &LoginResponse) -> Self {
        Self {
            access_token: Some(response.access.clone()),
            refresh_token: Some(response.refresh.clone()),
            role: response.role.clone(),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Replace the access token, keeping the refresh token and role.
    #[must_use]
    pub fn with_access_token(mut self, access: impl Into<String>) -> Self {
        self.access_token = Some(access.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.access_token().is_none() && self.refresh_token().is_none()
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("has_access_token", &self.access_token().is_some())
            .field("has_refresh_token", &self.refresh_token().is_some())
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!(" parent ".parse::<Role>().unwrap(), Role::Parent);
        assert_eq!("TEACHER".parse::<Role>().unwrap(), Role::Teacher);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_login_request_serializes_role_lowercase() {
        let request = LoginRequest {
            username: "amina".into(),
            password: "secret".into(),
            role: Role::Student,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["role"], "student");
        assert_eq!(json["username"], "amina");
    }

    #[test]
    fn test_login_request_validation() {
        let empty = LoginRequest {
            username: String::new(),
            password: "secret".into(),
            role: Role::Parent,
        };
        assert!(empty.validate().is_err());

        let ok = LoginRequest {
            username: "amina".into(),
            password: "secret".into(),
            role: Role::Parent,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_session_from_login_and_debug_hides_tokens() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"access": "acc-123", "refresh": "ref-456", "role": "student"}"#,
        )
        .unwrap();
        let session = Session::from_login(&response);
        assert_eq!(session.access_token(), Some("acc-123"));
        assert_eq!(session.refresh_token(), Some("ref-456"));

        let debug = format!("{session:?}");
        assert!(!debug.contains("acc-123"));
        assert!(!debug.contains("ref-456"));
    }

    #[test]
    fn test_empty_tokens_count_as_absent() {
        let session = Session {
            access_token: Some(String::new()),
            refresh_token: None,
            role: None,
        };
        assert_eq!(session.access_token(), None);
        assert!(session.is_empty());
    }
}
