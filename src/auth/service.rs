use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::UserRole;

/// Token category carried inside the claims. `validate` accepts both; the
/// caller decides whether the category matters (the refresh endpoint does
/// not distinguish them, matching the original behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Decoded, verified payload of an authentication token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier
    pub sub: i64,
    pub username: String,
    pub role: UserRole,
    pub token_type: TokenKind,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
    /// Issued-at timestamp
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Issues and validates HS256-signed bearer tokens.
///
/// The signing secret is process-wide configuration; its non-emptiness is
/// enforced when the config loads, before any token is issued.
#[derive(Clone)]
pub struct AuthService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::seconds(900),
            refresh_ttl: Duration::days(7),
        }
    }

    pub fn from_config(security: &crate::config::SecurityConfig) -> Self {
        Self {
            secret: security.jwt_secret.clone(),
            access_ttl: Duration::seconds(security.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(security.refresh_token_ttl_secs),
        }
    }

    /// Seconds until a freshly issued access token expires.
    pub fn access_expires_in(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Issue a short-lived access token (15 minutes by default).
    pub fn issue_access(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
    ) -> Result<String, TokenError> {
        self.issue(user_id, username, role, TokenKind::Access, self.access_ttl)
    }

    /// Issue a long-lived refresh token (7 days by default).
    pub fn issue_refresh(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
    ) -> Result<String, TokenError> {
        self.issue(user_id, username, role, TokenKind::Refresh, self.refresh_ttl)
    }

    fn issue(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
        token_type: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            role,
            token_type,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Parse a token and verify its signature and expiration.
    ///
    /// Does not check the token category; inspect `Claims::token_type` when
    /// the distinction matters.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is a hard boundary; the default 60s leeway would accept
        // recently-expired tokens.
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("unit-test-secret")
    }

    #[test]
    fn access_token_round_trips() {
        let auth = service();
        let token = auth.issue_access(1, "irfan", UserRole::SuperAdmin).unwrap();

        let claims = auth.validate(&token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.username, "irfan");
        assert_eq!(claims.role, UserRole::SuperAdmin);
        assert_eq!(claims.token_type, TokenKind::Access);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn refresh_token_carries_its_category() {
        let auth = service();
        let token = auth.issue_refresh(2, "sisti", UserRole::User).unwrap();

        let claims = auth.validate(&token).unwrap();
        assert_eq!(claims.token_type, TokenKind::Refresh);
        // Refresh tokens live 7 days
        let remaining = claims.exp - claims.iat;
        assert_eq!(remaining, 7 * 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut auth = service();
        auth.access_ttl = Duration::seconds(-5);
        let token = auth.issue_access(1, "irfan", UserRole::User).unwrap();

        let err = auth.validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn token_near_expiry_is_still_valid() {
        let mut auth = service();
        // One second of life left; must still validate.
        auth.access_ttl = Duration::seconds(1);
        let token = auth.issue_access(1, "irfan", UserRole::User).unwrap();
        assert!(auth.validate(&token).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = AuthService::new("secret-a")
            .issue_access(1, "irfan", UserRole::User)
            .unwrap();

        let err = AuthService::new("secret-b").validate(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let auth = service();
        assert!(matches!(auth.validate("not-a-jwt"), Err(TokenError::Malformed)));
        assert!(matches!(auth.validate(""), Err(TokenError::Malformed)));
    }
}
