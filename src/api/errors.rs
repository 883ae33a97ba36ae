use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{CommandError, ValidationError};

/// Handler error rendered as `{"error": "..."}`.
///
/// Anything converted with `?` becomes a 500 unless it is recognised:
/// extractor rejections keep their own status, rejected input maps to 422 and
/// an unavailable engine to 503.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow::anyhow!(message.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.error, "Request failed");
        }
        let body = Json(json!({ "error": self.error.to_string() }));
        (self.status, body).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        let error = e.into();
        if let Some((status, text)) = rejection(&error) {
            return Self {
                status,
                error: anyhow::anyhow!(text),
            };
        }
        let status = status_for(&error);
        Self { status, error }
    }
}

/// Extractor rejections keep axum's status and body text.
fn rejection(error: &anyhow::Error) -> Option<(StatusCode, String)> {
    if let Some(r) = error.downcast_ref::<JsonRejection>() {
        return Some((r.status(), r.body_text()));
    }
    if let Some(r) = error.downcast_ref::<QueryRejection>() {
        return Some((r.status(), r.body_text()));
    }
    if let Some(r) = error.downcast_ref::<PathRejection>() {
        return Some((r.status(), r.body_text()));
    }
    None
}

fn status_for(error: &anyhow::Error) -> StatusCode {
    if error.is::<ValidationError>() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    match error.downcast_ref::<CommandError>() {
        Some(CommandError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(CommandError::EngineStopped | CommandError::Timeout(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
