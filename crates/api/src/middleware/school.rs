//! Tenant guard for `/schools/{school}/...` routes.

use std::collections::HashMap;

use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use scholaris_shared::Claims;
use uuid::Uuid;

use crate::error::ApiError;

/// Rejects requests whose `{school}` path segment differs from the
/// token's school. Must run after [`super::auth_middleware`].
pub async fn school_access(
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(claims) = request.extensions().get::<Claims>() else {
        return ApiError::unauthorized("Authentication required").into_response();
    };

    let Some(raw) = params.get("school") else {
        return next.run(request).await;
    };
    let Ok(school_id) = raw.parse::<Uuid>() else {
        return ApiError::not_found("School not found").into_response();
    };

    if school_id != claims.school_id() {
        tracing::warn!(
            user_id = %claims.user_id(),
            token_school = %claims.school_id(),
            requested_school = %school_id,
            "Cross-school access denied"
        );
        return ApiError::forbidden("Unauthorized access to this school.").into_response();
    }

    next.run(request).await
}
