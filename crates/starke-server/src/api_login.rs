//! Admin login and logout handlers.

use axum::{
    body::{Body, Bytes},
    extract::Extension,
    http::Request,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use starke_auth::AuthError;
use std::sync::Arc;

use crate::api::{lenient_json, run_blocking, ApiError};
use crate::middleware::bearer_token;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Handler for `POST /api/login`.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: LoginRequest = lenient_json(&body);

    let token = run_blocking(move || {
        state
            .auth
            .login(&request.email, &request.password)
            .map_err(|e| match e {
                AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
                _ => {
                    tracing::error!(error = %e, "failed to issue admin token");
                    ApiError::InternalServerError(e.to_string())
                }
            })
    })
    .await?;

    Ok(Json(json!({ "token": token })))
}

/// Handler for `POST /api/logout`.
///
/// Always succeeds; a missing or unknown token is not an error.
pub async fn logout_handler(req: Request<Body>) -> Result<Json<Value>, ApiError> {
    let token = bearer_token(&req);
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?;

    if let Some(token) = token {
        run_blocking(move || {
            state.auth.logout(&token).map_err(|e| {
                tracing::warn!(error = %e, "failed to revoke admin token");
                ApiError::InternalServerError(e.to_string())
            })
        })
        .await?;
    }

    Ok(Json(json!({ "success": true })))
}
