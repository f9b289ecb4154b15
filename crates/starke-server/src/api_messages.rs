//! Contact message handlers.

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use starke_inbox::{
    create_message, delete_message, get_message, list_messages, update_message, InboxError,
    Message, MessageDraft, MessageUpdate, Page, PageRequest,
};
use std::sync::Arc;

use crate::api::{lenient_json, record_id, run_blocking, ApiError};
use crate::AppState;

/// Raw `page` / `page_size` query values; parsed by [`PageRequest::parse`].
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    pub(crate) fn to_request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::parse(self.page.as_deref(), self.page_size.as_deref()).map_err(ApiError::from)
    }
}

/// Handler for `POST /api/messages`. Public.
pub async fn create_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new = lenient_json::<MessageDraft>(&body).into_new()?;

    let id = run_blocking(move || {
        state
            .storage
            .transaction(|tx| create_message(tx, &new))
            .map_err(ApiError::from)
    })
    .await?;

    tracing::info!(id, "stored contact message");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": id })),
    ))
}

/// Handler for `GET /api/messages`.
pub async fn list_messages_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Message>>, ApiError> {
    let page = query.to_request()?;

    let listing = run_blocking(move || {
        let conn = state.storage.acquire_connection().map_err(InboxError::from)?;
        list_messages(&conn, page).map_err(ApiError::from)
    })
    .await?;

    Ok(Json(listing))
}

/// Handler for `GET /api/messages/{id}`.
pub async fn get_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, ApiError> {
    let id = record_id(path)?;
    let message = run_blocking(move || {
        let conn = state.storage.acquire_connection().map_err(InboxError::from)?;
        get_message(&conn, id).map_err(ApiError::from)
    })
    .await?;

    Ok(Json(message))
}

/// Handler for `PUT /api/messages/{id}`. Only the fields present change.
pub async fn update_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<Message>, ApiError> {
    let id = record_id(path)?;
    let update: MessageUpdate = lenient_json(&body);

    let message = run_blocking(move || {
        state
            .storage
            .transaction(|tx| update_message(tx, id, update))
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(message))
}

/// Handler for `DELETE /api/messages/{id}`.
pub async fn delete_message_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = record_id(path)?;
    run_blocking(move || {
        state
            .storage
            .transaction(|tx| delete_message(tx, id))
            .map_err(ApiError::from)
    })
    .await?;

    tracing::info!(id, "deleted contact message");
    Ok(Json(json!({ "success": true })))
}
