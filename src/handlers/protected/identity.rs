// handlers/protected/identity.rs - GET /credentials

use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};

/// Role and username of the caller
pub async fn credentials_get(Extension(ValidatedUser(user)): Extension<ValidatedUser>) -> ApiResult {
    Ok(ApiResponse::ok()
        .with("role", user.role)
        .with("userName", user.username))
}
