mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use pocket_api::auth::{JwtIdentityProvider, RemoteIdentityProvider};
use pocket_api::database::MemoryStore;

const DOWN: &str = "connection refused by 10.0.0.5:5432";

fn failing_app() -> axum::Router {
    common::app_with(
        Arc::new(common::FailingStore(DOWN)),
        Arc::new(JwtIdentityProvider::new(common::SECRET, Some("authenticated".into()))),
    )
}

#[tokio::test]
async fn datastore_failure_is_500_with_its_message() -> Result<()> {
    let app = failing_app();
    let token = common::token_for(Uuid::new_v4());

    let requests = [
        (Method::GET, "/notes", None),
        (Method::POST, "/contacts", Some(json!({ "name": "Ann", "phone": "555" }))),
        (Method::PATCH, "/todos/1", Some(json!({ "title": "x" }))),
        (Method::DELETE, "/notes/1", None),
    ];
    for (method, uri, body) in requests {
        let (status, err) = common::send(&app, method.clone(), uri, Some(&token), body).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, uri);
        assert_eq!(err["error"], DOWN, "{} {}", method, uri);
        assert_eq!(err["code"], "INTERNAL_SERVER_ERROR");
    }
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_store() -> Result<()> {
    let (status, body) = common::send(&failing_app(), Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn silent_identity_service_leaves_requests_anonymous() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let identity = RemoteIdentityProvider::new(&format!("http://{}", addr), None, Duration::from_millis(200))?;
    let app = common::app_with(Arc::new(MemoryStore::new()), Arc::new(identity));

    let (status, body) = tokio::time::timeout(
        Duration::from_secs(5),
        common::send(&app, Method::GET, "/notes", Some("some-token"), None),
    )
    .await??;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!([]));

    let (status, _) = common::send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
