use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::database::models::User;
use crate::error::ApiError;
use crate::routes::AppState;

/// The full user record behind a verified credential
#[derive(Clone, Debug)]
pub struct ValidatedUser(pub User);

/// Loads the user a credential is bound to. Runs after `jwt_auth_middleware`;
/// a credential whose user no longer exists is answered with 404.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Token is not available"))?;

    let user = state.auth.resolve_identity(auth_user.user_id).await.map_err(|e| {
        tracing::warn!("Credential for {} does not resolve to a user", auth_user.user_id);
        e
    })?;

    tracing::debug!("Request by '{}' ({})", user.username, user.role);
    request.extensions_mut().insert(ValidatedUser(user));

    Ok(next.run(request).await)
}
