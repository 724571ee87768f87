//! Bearer tokens and the identity-provider seam.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Opaque credential sent as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        // Accept values copied straight out of an Authorization header.
        let token = token
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .unwrap_or(token);
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header value for this token.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Source of fresh bearer tokens, asked once per operation.
///
/// `None` means the user is signed out; callers fail with
/// [`Error::AuthRequired`] instead of sending an unauthenticated request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_token(&self) -> Option<BearerToken>;
}

/// Fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSource {
    token: Option<BearerToken>,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(BearerToken::new(token)),
        }
    }

    pub fn signed_out() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn get_token(&self) -> Option<BearerToken> {
        self.token.clone()
    }
}

/// Reads the token from an environment variable on every call, so a
/// refreshed value is picked up without restarting.
#[derive(Debug, Clone)]
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

#[async_trait]
impl TokenSource for EnvTokenSource {
    async fn get_token(&self) -> Option<BearerToken> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(BearerToken::new)
    }
}

/// Session claims carried by identity-provider JWTs.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// Email, when the provider's JWT template includes it
    pub email: Option<String>,
    /// Session id
    pub sid: Option<String>,
    /// Issuer
    pub iss: Option<String>,
    /// Issued at
    pub iat: Option<i64>,
    /// Expiration
    pub exp: Option<i64>,
}

/// Signed-in user as far as the client can tell from the token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionUser {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            expires_at: claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()),
        }
    }
}

/// Decode a JWT bearer token to see who it belongs to.
///
/// The signature is not checked here: the API server verifies every request.
/// Opaque (non-JWT) tokens yield [`Error::Config`].
pub fn inspect_token(token: &BearerToken) -> Result<SessionUser> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(b"unused");

    let token_data = decode::<SessionClaims>(token.as_str(), &key, &validation)
        .map_err(|e| Error::Config(format!("Token is not a readable JWT: {}", e)))?;

    Ok(token_data.claims.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bearer_prefix() {
        let token = BearerToken::new("Bearer abc.def");
        assert_eq!(token.as_str(), "abc.def");
        assert_eq!(token.header_value(), "Bearer abc.def");
        assert_eq!(format!("{:?}", token), "BearerToken(***)");
    }

    #[test]
    fn test_claims_to_user() {
        let claims = SessionClaims {
            sub: "user_2abc".to_string(),
            email: Some("creator@example.com".to_string()),
            sid: None,
            iss: None,
            iat: Some(0),
            exp: Some(100),
        };

        let user = SessionUser::from(claims);
        assert_eq!(user.user_id, "user_2abc");
        assert!(user.is_expired(Utc.timestamp_opt(200, 0).unwrap()));
        assert!(!user.is_expired(Utc.timestamp_opt(50, 0).unwrap()));
    }

    #[test]
    fn test_inspect_unsigned_jwt() {
        // {"alg":"RS256","typ":"JWT"} . {"sub":"user_1","exp":4102444800} . sig
        let token = BearerToken::new(
            "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1c2VyXzEiLCJleHAiOjQxMDI0NDQ4MDB9.c2ln",
        );
        let user = inspect_token(&token).unwrap();
        assert_eq!(user.user_id, "user_1");
        assert!(user.expires_at.is_some());
    }

    #[test]
    fn test_inspect_opaque_token() {
        let token = BearerToken::new("not-a-jwt");
        assert!(matches!(inspect_token(&token), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_static_source() {
        assert!(StaticTokenSource::signed_out().get_token().await.is_none());
        let token = StaticTokenSource::new("t1").get_token().await.unwrap();
        assert_eq!(token.as_str(), "t1");
    }
}
