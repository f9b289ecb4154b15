//! Budget request handlers.

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use starke_inbox::{
    create_budget, delete_budget, get_budget, list_budgets, update_budget, Budget, BudgetDraft,
    BudgetUpdate, InboxError, Page,
};
use std::sync::Arc;

use crate::api::{lenient_json, record_id, run_blocking, ApiError};
use crate::api_messages::PageQuery;
use crate::AppState;

/// Handler for `POST /api/budgets`. Public.
pub async fn create_budget_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new = lenient_json::<BudgetDraft>(&body).into_new()?;

    let id = run_blocking(move || {
        state
            .storage
            .transaction(|tx| create_budget(tx, &new))
            .map_err(ApiError::from)
    })
    .await?;

    tracing::info!(id, "stored budget request");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": id })),
    ))
}

/// Handler for `GET /api/budgets`.
pub async fn list_budgets_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Budget>>, ApiError> {
    let page = query.to_request()?;

    let listing = run_blocking(move || {
        let conn = state.storage.acquire_connection().map_err(InboxError::from)?;
        list_budgets(&conn, page).map_err(ApiError::from)
    })
    .await?;

    Ok(Json(listing))
}

/// Handler for `GET /api/budgets/{id}`.
pub async fn get_budget_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Budget>, ApiError> {
    let id = record_id(path)?;
    let budget = run_blocking(move || {
        let conn = state.storage.acquire_connection().map_err(InboxError::from)?;
        get_budget(&conn, id).map_err(ApiError::from)
    })
    .await?;

    Ok(Json(budget))
}

/// Handler for `PUT /api/budgets/{id}`.
pub async fn update_budget_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<Budget>, ApiError> {
    let id = record_id(path)?;
    let update: BudgetUpdate = lenient_json(&body);

    let budget = run_blocking(move || {
        state
            .storage
            .transaction(|tx| update_budget(tx, id, update))
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(budget))
}

/// Handler for `DELETE /api/budgets/{id}`.
pub async fn delete_budget_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = record_id(path)?;
    run_blocking(move || {
        state
            .storage
            .transaction(|tx| delete_budget(tx, id))
            .map_err(ApiError::from)
    })
    .await?;

    tracing::info!(id, "deleted budget request");
    Ok(Json(json!({ "success": true })))
}
