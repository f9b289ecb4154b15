use axum::{
    body::Body,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use starke_auth::Claims;
use std::sync::Arc;

use crate::api::ApiError;
use crate::AppState;

/// Verified admin session, stored in request extensions.
#[derive(Clone, Debug)]
pub struct AdminContext(pub Claims);

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid admin token.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Response {
    let Some(token) = bearer_token(&req) else {
        return ApiError::Unauthorized("missing bearer token".to_string()).into_response();
    };

    let Some(state) = req.extensions().get::<Arc<AppState>>().cloned() else {
        return ApiError::InternalServerError("application state missing".to_string())
            .into_response();
    };

    // The store check reads a file, so keep it off the runtime.
    let verified =
        tokio::task::spawn_blocking(move || state.auth.verify(&token)).await;

    match verified {
        Ok(Ok(claims)) => {
            req.extensions_mut().insert(AdminContext(claims));
            next.run(req).await
        }
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::Unauthorized(e.to_string()).into_response()
        }
        Err(e) => ApiError::InternalServerError(format!("task join error: {}", e)).into_response(),
    }
}
