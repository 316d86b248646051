// handlers/protected/requests.rs - Care request submission and status updates

use axum::{
    extract::{Path, State},
    Extension,
};
use uuid::Uuid;

use crate::api::forms::{CareRequestForm, StatusForm};
use crate::api::JsonBody;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::routes::AppState;

/**
 * POST /requests - Family member asks a caretaker to take on an elderly person
 *
 * Body: `{name, age, gender, number, address, conditions, history,
 * caretaker, family}`. The first request for a family username also creates
 * the elderly profile that later reads and appends operate on.
 */
pub async fn requests_post(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
    JsonBody(form): JsonBody<CareRequestForm>,
) -> ApiResult {
    let request = form.validate()?;
    state.requests.create(&user, request).await?;
    Ok(ApiResponse::ok().message("Request is created and sent to caretaker"))
}

/// GET /requests - Requests naming the caller as caretaker or family member
pub async fn requests_get(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
) -> ApiResult {
    let requests = state.requests.list_for(&user).await?;
    Ok(ApiResponse::ok().with("userRequest", requests))
}

/**
 * PUT /update-status/:requestId - Named caretaker accepts or declines
 *
 * Body: `{status}` with one of pending, accepted, declined. Accepting binds
 * the caretaker to the family's elderly profile.
 */
pub async fn status_put(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
    Path(request_id): Path<String>,
    JsonBody(form): JsonBody<StatusForm>,
) -> ApiResult {
    let status = form.validate()?;
    // Ids that cannot name a request are simply unknown
    let request_id = Uuid::parse_str(&request_id).map_err(|_| ApiError::not_found("Request not found"))?;

    let request = state.requests.update_status(request_id, status, &user.username).await?;
    Ok(ApiResponse::ok()
        .message("Request updated successfully")
        .with("request", request))
}
