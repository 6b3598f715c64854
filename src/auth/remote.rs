use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use super::{AuthError, Identity, IdentityProvider};

/// Asks the identity service itself whether a token is valid
/// (`GET {auth_url}/user`), for deployments without a shared secret.
///
/// Every call is bounded by `timeout`; a service that stops answering yields
/// `AuthError::Http` and the request proceeds anonymously.
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    user_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    email: Option<String>,
    role: Option<String>,
}

impl RemoteIdentityProvider {
    pub fn new(auth_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            user_url: format!("{}/user", auth_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn identify(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let mut request = self.client.get(&self.user_url).bearer_auth(token);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => {
                let user: RemoteUser = response.json().await?;
                Ok(Some(Identity {
                    user_id: user.id,
                    email: user.email,
                    role: user.role,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            other => Err(AuthError::Upstream(format!(
                "unexpected status {} from {}",
                other, self.user_url
            ))),
        }
    }
}
