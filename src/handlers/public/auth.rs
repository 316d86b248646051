// handlers/public/auth.rs - Signup, login and caretaker directory

use axum::extract::State;

use crate::api::forms::{SigninForm, SignupForm};
use crate::api::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;

/**
 * POST /signup - Create an account and receive a credential
 *
 * Body: `{username, email, telephone, password, role}` where role is
 * `family` or `caretaker`. Responds 201 `{success, token}`; 409 when the
 * email or username is already registered.
 */
pub async fn signup_post(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<SignupForm>,
) -> ApiResult {
    let signup = form.validate()?;
    let token = state.auth.signup(signup).await?;
    Ok(ApiResponse::created().with("token", token))
}

/**
 * POST /login - Exchange email and password for a credential
 *
 * Responds 200 `{success, token}`.
 */
pub async fn login_post(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<SigninForm>,
) -> ApiResult {
    let (email, password) = form.validate()?;
    let token = state.auth.signin(&email, &password).await?;
    Ok(ApiResponse::ok().with("token", token))
}

/// GET /getcaretakers - Public caretaker directory
pub async fn caretakers_get(State(state): State<AppState>) -> ApiResult {
    let caretakers = state.auth.list_caretakers().await?;
    Ok(ApiResponse::ok().with("caretakers", caretakers))
}
