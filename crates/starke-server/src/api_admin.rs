//! Database administration handlers: status, backup, restore and schema
//! initialization.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::{run_blocking, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    /// Standard base64 of the raw database file.
    pub backup: Option<String>,
}

/// Handler for `GET /api/db-admin`.
pub async fn info_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let info = run_blocking(move || Ok(state.storage.describe_status())).await?;
    Ok(Json(json!({ "success": true, "info": info })))
}

/// Handler for `GET /api/db-admin/backup`.
///
/// `restorable` is false when the image exceeds the restore route's
/// `max_size`; the backup is still served so the data can be taken out.
pub async fn backup_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let max_size = state.max_backup_bytes;
    let image = run_blocking(move || {
        state.storage.create_backup().ok_or_else(|| {
            ApiError::NotFound("database file not found or unreadable".to_string())
        })
    })
    .await?;

    let restorable = image.len() <= max_size;
    if !restorable {
        tracing::warn!(
            bytes = image.len(),
            max_size,
            "database backup exceeds the restore size limit"
        );
    }

    tracing::info!(bytes = image.len(), "served database backup");
    Ok(Json(json!({
        "success": true,
        "backup": STANDARD.encode(&image),
        "size": image.len(),
        "max_size": max_size,
        "restorable": restorable,
        "message": "use POST /api/db-admin/restore to restore"
    })))
}

/// Handler for `POST /api/db-admin/restore`.
pub async fn restore_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!(
                "backup exceeds the restore limit of {} bytes",
                state.max_backup_bytes
            ))
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    let encoded = serde_json::from_slice::<RestoreRequest>(&body)
        .ok()
        .and_then(|request| request.backup)
        .ok_or_else(|| ApiError::BadRequest("field 'backup' (base64) is required".to_string()))?;

    let image = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::BadRequest(format!("backup is not valid base64: {}", e)))?;
    if image.len() > state.max_backup_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "backup exceeds the restore limit of {} bytes",
            state.max_backup_bytes
        )));
    }

    let restored = run_blocking(move || Ok(state.storage.restore_from_backup(&image))).await?;
    if !restored {
        return Err(ApiError::InternalServerError(
            "failed to restore database".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "database restored"
    })))
}

/// Handler for `POST /api/db-admin/init`.
pub async fn init_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let info = run_blocking(move || {
        state.storage.initialize_schema().map_err(|e| {
            tracing::error!(error = %e, "schema initialization failed");
            ApiError::InternalServerError(format!("failed to initialize database: {}", e))
        })?;
        Ok(state.storage.describe_status())
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "database initialized",
        "info": info
    })))
}
