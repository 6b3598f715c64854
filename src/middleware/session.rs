use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::Identity;
use crate::error::ApiError;

/// The caller's session as resolved by [`session_middleware`].
///
/// `Session(None)` means no valid session was presented. Handlers decide what
/// that means for them: lists answer with an empty collection, mutations call
/// [`Session::require`].
#[derive(Clone, Debug, Default)]
pub struct Session(pub Option<Identity>);

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    pub fn require(&self) -> Result<&Identity, ApiError> {
        self.0
            .as_ref()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Session>().cloned().unwrap_or_default())
    }
}

/// Resolve the session token on every request and attach a [`Session`].
///
/// Never rejects: a missing, invalid or unverifiable token yields an empty
/// session. Provider failures are logged.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = &state.config.security.session_cookie;

    let identity = match extract_token(request.headers(), cookie_name) {
        Some(token) => match state.identity.identify(&token).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Identity provider failed, treating request as anonymous: {}", e);
                None
            }
        },
        None => None,
    };

    request.extensions_mut().insert(Session(identity));
    next.run(request).await
}

/// Bearer token from the Authorization header, else the session cookie
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
