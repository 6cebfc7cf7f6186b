use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::patch::{PatchError, SchemaViolation};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid patches: {} operation(s) failed", .0.len())]
    PatchRejected(Vec<PatchError>),

    #[error("Patched resume is invalid: {} violation(s)", .0.len())]
    SchemaRejected(Vec<SchemaViolation>),

    /// Transport, empty, malformed or off-contract output from the text generator.
    #[error("AI editing failed: {0}")]
    AiEditingFailed(String),

    #[error("Compilation failed")]
    Compilation { logs: String, errors: Vec<String> },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON body extractor whose rejections surface as `AppError::Validation`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details): (StatusCode, &str, String, Option<Value>) =
            match &self {
                AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
                AppError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
                }
                AppError::PatchRejected(errors) => (
                    StatusCode::BAD_REQUEST,
                    "PATCH_INVALID",
                    "Invalid patches".to_string(),
                    Some(json!(errors)),
                ),
                AppError::SchemaRejected(violations) => (
                    StatusCode::BAD_REQUEST,
                    "SCHEMA_INVALID",
                    "Patched resume is invalid".to_string(),
                    Some(json!(violations)),
                ),
                AppError::AiEditingFailed(detail) => {
                    tracing::error!("AI editing failed: {detail}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "AI_EDITING_FAILED",
                        "AI editing failed".to_string(),
                        None,
                    )
                }
                AppError::Compilation { logs, errors } => {
                    tracing::warn!("Compilation failed with {} error line(s)", errors.len());
                    let body = Json(json!({
                        "error": {
                            "code": "COMPILATION_FAILED",
                            "message": "Compilation failed"
                        },
                        "logs": logs,
                        "errors": errors
                    }));
                    return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
                }
                AppError::Internal(e) => {
                    tracing::error!("Internal error: {e:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                    )
                }
            };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
