//! Session identity: who is calling, as vouched for by the identity service.
//!
//! This crate never logs users in. It only asks an [`IdentityProvider`]
//! whether a session token presented with a request is valid, and if so,
//! which user it belongs to.

pub mod remote;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use remote::RemoteIdentityProvider;

/// Claims carried by identity-service session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, email: Option<String>, valid_for: Duration) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(valid_for)
            .ok_or(AuthError::InvalidExpiry)?;

        Ok(Self {
            sub,
            email,
            role: Some("authenticated".to_string()),
            aud: Some("authenticated".to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }

    /// Claims valid for `hours` from now
    pub fn for_hours(sub: Uuid, email: Option<String>, hours: i64) -> Result<Self, AuthError> {
        let valid_for = Duration::try_hours(hours).ok_or(AuthError::InvalidExpiry)?;
        Self::new(sub, email, valid_for)
    }
}

/// An authenticated caller. Threaded explicitly into every repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Token lifetime is out of range")]
    InvalidExpiry,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Identity service error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Answers "is this session token valid, and whose is it?"
///
/// `Ok(None)` means the token is not a valid session. `Err` is reserved for
/// failures of the provider itself (misconfiguration, unreachable service).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn identify(&self, token: &str) -> Result<Option<Identity>, AuthError>;
}

/// Verifies tokens locally with the identity service's shared signing secret.
pub struct JwtIdentityProvider {
    secret: String,
    audience: Option<String>,
}

impl JwtIdentityProvider {
    pub fn new(secret: impl Into<String>, audience: Option<String>) -> Self {
        Self {
            secret: secret.into(),
            audience,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud.as_str()]),
            None => validation.validate_aud = false,
        }
        validation
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn identify(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let key = DecodingKey::from_secret(self.secret.as_bytes());
        match decode::<Claims>(token, &key, &self.validation()) {
            Ok(data) => Ok(Some(data.claims.into())),
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                Ok(None)
            }
        }
    }
}

/// Sign claims the way the identity service does. Used by the `pocket token`
/// development command and by tests; the server itself never calls this.
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}
