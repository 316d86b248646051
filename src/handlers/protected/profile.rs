// handlers/protected/profile.rs - Elderly profile collections
//
// Reads resolve the caller's profile through the access guard and return an
// empty list when none is bound yet. Writes are append-only.

use axum::{extract::State, Extension};

use crate::api::forms::{ContactForm, MedicationForm, MetricForm, TaskForm};
use crate::api::JsonBody;
use crate::middleware::{ApiResponse, ApiResult, ValidatedUser};
use crate::routes::AppState;

/// POST /addtasks
pub async fn tasks_post(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
    JsonBody(form): JsonBody<TaskForm>,
) -> ApiResult {
    let task = form.validate()?;
    state.profiles.add_task(&user, task).await?;
    Ok(ApiResponse::ok().message("Tasks were updated successfully"))
}

/// GET /tasks
pub async fn tasks_get(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
) -> ApiResult {
    Ok(ApiResponse::ok().with("tasks", state.guard.tasks(&user).await?))
}

/// POST /addmedication
pub async fn medication_post(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
    JsonBody(form): JsonBody<MedicationForm>,
) -> ApiResult {
    let medication = form.validate()?;
    state.profiles.add_medication(&user, medication).await?;
    Ok(ApiResponse::ok().message("Medication list was updated successfully"))
}

/// GET /medication
pub async fn medication_get(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
) -> ApiResult {
    Ok(ApiResponse::ok().with("medication", state.guard.medications(&user).await?))
}

/// POST /addcontacts
pub async fn contacts_post(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
    JsonBody(form): JsonBody<ContactForm>,
) -> ApiResult {
    let contact = form.validate()?;
    state.profiles.add_contact(&user, contact).await?;
    Ok(ApiResponse::ok().message("Contacts were updated successfully"))
}

/// GET /chat - the profile's contact list
pub async fn contacts_get(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
) -> ApiResult {
    Ok(ApiResponse::ok().with("chat", state.guard.contacts(&user).await?))
}

/// POST /addmetrics - bound caretaker records vitals
pub async fn metrics_post(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
    JsonBody(form): JsonBody<MetricForm>,
) -> ApiResult {
    let reading = form.validate()?;
    let metric = state.profiles.add_metric(&user, reading).await?;
    Ok(ApiResponse::ok()
        .message("Metrics were updated successfully")
        .with("metric", metric))
}

/// GET /metrics
pub async fn metrics_get(
    State(state): State<AppState>,
    Extension(ValidatedUser(user)): Extension<ValidatedUser>,
) -> ApiResult {
    Ok(ApiResponse::ok().with("metrics", state.guard.metrics(&user).await?))
}
