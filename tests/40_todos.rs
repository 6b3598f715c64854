mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn todos_are_shared_between_sessions() -> Result<()> {
    let app = common::app();
    let alice = common::token_for(Uuid::new_v4());
    let bob = common::token_for(Uuid::new_v4());

    let (status, created) = common::send(
        &app,
        Method::POST,
        "/todos",
        Some(&alice),
        Some(json!({ "title": "Ship it" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["title"], "Ship it");
    assert!(created["created_at"].is_string());

    let (status, list) = common::send(&app, Method::GET, "/todos", Some(&bob), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([created.clone()]));

    let (status, updated) = common::send(
        &app,
        Method::PATCH,
        "/todos/1",
        Some(&bob),
        Some(json!({ "title": "Shipped" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Shipped");
    assert_eq!(updated["created_at"], created["created_at"]);
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_todo_is_not_found() -> Result<()> {
    let app = common::app();
    let token = common::token_for(Uuid::new_v4());
    common::send(&app, Method::POST, "/todos", Some(&token), Some(json!({ "title": "stay" }))).await?;

    let (status, _) = common::send(&app, Method::DELETE, "/todos/999", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = common::send(&app, Method::GET, "/todos", Some(&token), None).await?;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = common::send(&app, Method::DELETE, "/todos/1", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn fractional_ids_are_rejected() -> Result<()> {
    let app = common::app();
    let token = common::token_for(Uuid::new_v4());

    let (status, err) = common::send(
        &app,
        Method::PATCH,
        "/todos/1.5",
        Some(&token),
        Some(json!({ "title": "x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Bad id");
    Ok(())
}
