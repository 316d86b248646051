use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Success envelope `{success: true, message?, <key>: data...}`
#[derive(Debug)]
pub struct ApiResponse {
    status_code: StatusCode,
    body: Map<String, Value>,
}

impl ApiResponse {
    /// Create a successful API response with default 200 status
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Create a 201 Created response
    pub fn created() -> Self {
        Self::with_status(StatusCode::CREATED)
    }

    pub fn with_status(status_code: StatusCode) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        Self { status_code, body }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.body.insert("message".to_string(), Value::String(message.into()));
        self
    }

    /// Attach a payload under `key`
    pub fn with<T: Serialize>(mut self, key: &str, data: T) -> Self {
        let value = serde_json::to_value(data).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize response field '{}': {}", key, e);
            Value::Null
        });
        self.body.insert(key.to_string(), value);
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(Value::Object(self.body))).into_response()
    }
}

pub type ApiResult = Result<ApiResponse, crate::error::ApiError>;
