#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use pocket_api::app::{router, AppState};
use pocket_api::auth::{sign_token, Claims, IdentityProvider, JwtIdentityProvider};
use pocket_api::config::{AppConfig, StoreBackend};
use pocket_api::database::{DatabaseError, MemoryStore, RawRow, RowStore, Scope, TableSpec};

pub const SECRET: &str = "integration-test-secret";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StoreBackend::Memory;
    config.api.enable_request_logging = false;
    config.api.max_request_size_bytes = 4 * 1024;
    config.security.jwt_secret = SECRET.to_string();
    config
}

pub fn test_state(config: AppConfig) -> AppState {
    let identity = Arc::new(JwtIdentityProvider::new(
        config.security.jwt_secret.clone(),
        config.security.jwt_audience.clone(),
    ));
    AppState::new(config, Arc::new(MemoryStore::new()), identity)
}

/// A router over an arbitrary store and identity provider
pub fn app_with(store: Arc<dyn RowStore>, identity: Arc<dyn IdentityProvider>) -> Router {
    router(AppState::new(test_config(), store, identity))
}

/// Fails every call the way an unreachable database would
pub struct FailingStore(pub &'static str);

#[async_trait]
impl RowStore for FailingStore {
    async fn select_all(&self, _: &TableSpec, _: Scope) -> Result<Vec<RawRow>, DatabaseError> {
        Err(DatabaseError::QueryError(self.0.to_string()))
    }

    async fn insert(&self, _: &TableSpec, _: Scope, _: &[String]) -> Result<RawRow, DatabaseError> {
        Err(DatabaseError::QueryError(self.0.to_string()))
    }

    async fn update(&self, _: &TableSpec, _: Scope, _: i64, _: &[String]) -> Result<Option<RawRow>, DatabaseError> {
        Err(DatabaseError::QueryError(self.0.to_string()))
    }

    async fn delete(&self, _: &TableSpec, _: Scope, _: i64) -> Result<bool, DatabaseError> {
        Err(DatabaseError::QueryError(self.0.to_string()))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::QueryError(self.0.to_string()))
    }
}

/// A router over a fresh in-memory store
pub fn app() -> Router {
    router(test_state(test_config()))
}

pub fn token_for(user: Uuid) -> String {
    let claims = Claims::for_hours(user, Some(format!("{}@example.com", user.simple())), 1).expect("claims");
    sign_token(&claims, SECRET).expect("sign test token")
}

/// One request through the router; the body is parsed as JSON (`Null` if empty)
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    dispatch(app, request).await
}

/// A request with a raw body and content type
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: &str,
    body: impl Into<Body>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    dispatch(app, builder.body(body.into())?).await
}

pub async fn dispatch(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
    };
    Ok((status, body))
}

pub struct TestServer {
    pub base_url: String,
}

/// Serve a fresh in-memory app on a free local port
pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let app = app();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let server = TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);

        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}
