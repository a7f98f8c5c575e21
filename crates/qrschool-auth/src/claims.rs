//! Access token inspection.
//!
//! The backend issues signed JWT access tokens. The client does not hold the
//! signing key, so the signature is not checked here; the backend does that on
//! every request. The claims are only read to learn when the token expires.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Subset of the access token claims the client cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Expiration (Unix timestamp).
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at (Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Decode the claims of `token` without verifying its signature.
///
/// Returns `None` for tokens that are not JWTs.
pub fn inspect_access_token(token: &str) -> Option<AccessClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

/// Whether `token` expires within `leeway` from now.
///
/// Opaque tokens and tokens without an `exp` claim never count as expiring.
pub fn is_expiring(token: &str, leeway: Duration) -> bool {
    let Some(exp) = inspect_access_token(token).and_then(|c| c.exp) else {
        return false;
    };
    let leeway = i64::try_from(leeway.as_secs()).unwrap_or(i64::MAX);
    exp <= Utc::now().timestamp().saturating_add(leeway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_expiring_in(secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            exp: Some(now + secs),
            iat: Some(now),
            user_id: Some(serde_json::json!(42)),
            token_type: Some("access".into()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_inspect_reads_claims_without_the_key() {
        let token = token_expiring_in(3600);
        let claims = inspect_access_token(&token).unwrap();
        assert_eq!(claims.user_id, Some(serde_json::json!(42)));
        assert_eq!(claims.token_type.as_deref(), Some("access"));
    }

    #[test]
    fn test_opaque_token_is_not_inspectable() {
        assert_eq!(inspect_access_token("opaque-token"), None);
        assert!(!is_expiring("opaque-token", Duration::from_secs(30)));
    }

    #[test]
    fn test_fresh_token_is_not_expiring() {
        let token = token_expiring_in(3600);
        assert!(!is_expiring(&token, Duration::from_secs(30)));
    }

    #[test]
    fn test_expired_token_is_expiring() {
        let token = token_expiring_in(-60);
        assert!(is_expiring(&token, Duration::from_secs(0)));
    }

    #[test]
    fn test_token_inside_leeway_is_expiring() {
        let token = token_expiring_in(10);
        assert!(is_expiring(&token, Duration::from_secs(30)));
        assert!(!is_expiring(&token, Duration::from_secs(0)));
    }
}
