//! HTTP client for the resource endpoints, used by the `pocket` CLI and the
//! list presenter.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

use crate::error::ApiError;
use crate::models::{Reply, Resource};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server (or local validation) refused the request
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            ClientError::Api { field_errors, .. } => field_errors.as_ref(),
            _ => None,
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        ClientError::Api {
            status: err.status_code(),
            message: err.message().to_string(),
            field_errors: err.field_errors().cloned(),
        }
    }
}

/// Remote operations on one resource, as the caller's session sees them.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<R::Row>, ClientError>;

    /// The created row, when the resource replies with it
    async fn create(&self, fields: &R::Fields) -> Result<Option<R::Row>, ClientError>;

    async fn update(&self, id: i64, fields: &R::Fields) -> Result<(), ClientError>;

    async fn delete(&self, id: i64) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    field_errors: Option<HashMap<String, String>>,
}

/// reqwest-backed [`ResourceApi`] for every resource
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base.join(path)?;
        let request = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Turn any non-success response into [`ClientError::Api`]
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (message, field_errors) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.error, body.field_errors),
            Err(_) if status == StatusCode::UNAUTHORIZED => ("Unauthorized".to_string(), None),
            Err(_) => (
                status.canonical_reason().unwrap_or("Request failed").to_string(),
                None,
            ),
        };

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
            field_errors,
        })
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for HttpApi {
    async fn list(&self) -> Result<Vec<R::Row>, ClientError> {
        let response = self.request(Method::GET, R::PATH)?.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn create(&self, fields: &R::Fields) -> Result<Option<R::Row>, ClientError> {
        let response = self.request(Method::POST, R::PATH)?.json(fields).send().await?;
        let response = Self::check(response).await?;

        match R::REPLY {
            Reply::Row => Ok(Some(response.json().await?)),
            Reply::Ok => Ok(None),
        }
    }

    async fn update(&self, id: i64, fields: &R::Fields) -> Result<(), ClientError> {
        let path = format!("{}/{}", R::PATH, id);
        let response = self.request(Method::PATCH, &path)?.json(fields).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let path = format!("{}/{}", R::PATH, id);
        let response = self.request(Method::DELETE, &path)?.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
