//! List/create/update/delete handlers shared by every [`Resource`].
//!
//! Each handler checks the session before touching the body or the id, so an
//! anonymous caller always gets 401 regardless of what they sent.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, Session};
use crate::models::{Reply, Resource};
use crate::validate::{parse_id, Payload};

/// GET /{resource}
pub async fn list<R: Resource>(State(state): State<AppState>, session: Session) -> Response {
    let Some(identity) = session.identity() else {
        return (StatusCode::UNAUTHORIZED, Json(json!([]))).into_response();
    };

    match state.repository::<R>().list(identity.user_id).await {
        Ok(rows) => ApiResponse::success(rows).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /{resource}
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    session: Session,
    payload: Payload,
) -> Result<Response, ApiError> {
    let identity = session.require()?;
    let fields = R::fields_from_payload(&payload)?;

    let row = state.repository::<R>().create(identity.user_id, &fields).await?;
    tracing::info!(resource = R::PATH, id = R::row_id(&row), "Created {}", R::SINGULAR);

    Ok(match R::REPLY {
        Reply::Row => ApiResponse::created(row).into_response(),
        Reply::Ok => ApiResponse::ok(StatusCode::CREATED).into_response(),
    })
}

/// PATCH /{resource}/:id
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Response, ApiError> {
    let identity = session.require()?;
    let id = parse_id(&id)?;
    let fields = R::fields_from_payload(&payload)?;

    let row = state.repository::<R>().update(identity.user_id, id, &fields).await?;

    Ok(match R::REPLY {
        Reply::Row => ApiResponse::success(row).into_response(),
        Reply::Ok => ApiResponse::ok(StatusCode::OK).into_response(),
    })
}

/// DELETE /{resource}/:id
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let identity = session.require()?;
    let id = parse_id(&id)?;

    state.repository::<R>().delete(identity.user_id, id).await?;
    tracing::info!(resource = R::PATH, id, "Deleted {}", R::SINGULAR);

    Ok(match R::REPLY {
        Reply::Row => ApiResponse::no_content().into_response(),
        Reply::Ok => ApiResponse::ok(StatusCode::OK).into_response(),
    })
}
