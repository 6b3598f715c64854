mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use uuid::Uuid;

use pocket_api::auth::{sign_token, Claims};

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let app = common::app();

    let (status, body) = common::send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = common::send(&app, Method::GET, "/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Pocket API");
    Ok(())
}

#[tokio::test]
async fn anonymous_lists_are_empty_and_unauthorized() -> Result<()> {
    let app = common::app();

    for path in ["/notes", "/contacts", "/todos"] {
        let (status, body) = common::send(&app, Method::GET, path, None, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(body, json!([]), "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn anonymous_mutations_are_rejected_before_validation() -> Result<()> {
    let app = common::app();

    // Invalid body and invalid id still answer 401, not 400
    let (status, body) = common::send(&app, Method::POST, "/notes", None, Some(json!({}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = common::send(&app, Method::PATCH, "/contacts/abc", None, Some(json!({}))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::send(&app, Method::DELETE, "/todos/1", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn forged_and_expired_tokens_are_anonymous() -> Result<()> {
    let app = common::app();
    let user = Uuid::new_v4();

    let forged = sign_token(&Claims::for_hours(user, None, 1)?, "not-the-secret")?;
    let (status, _) = common::send(&app, Method::GET, "/notes", Some(&forged), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = sign_token(&Claims::for_hours(user, None, -3)?, common::SECRET)?;
    let (status, _) = common::send(
        &app,
        Method::POST,
        "/notes",
        Some(&expired),
        Some(json!({ "title": "x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted() -> Result<()> {
    let app = common::app();
    let token = common::token_for(Uuid::new_v4());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/notes")
        .header(header::COOKIE, format!("theme=dark; sb-access-token={}", token))
        .body(Body::empty())?;
    let (status, body) = common::dispatch(&app, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn oversized_body_is_rejected() -> Result<()> {
    let app = common::app();
    let token = common::token_for(Uuid::new_v4());
    let title = "x".repeat(8 * 1024);

    let (status, body) = common::send(
        &app,
        Method::POST,
        "/notes",
        Some(&token),
        Some(json!({ "title": title })),
    )
    .await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    Ok(())
}
