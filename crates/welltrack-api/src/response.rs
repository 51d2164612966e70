//! JSON envelope and error-to-status mapping shared by all handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use welltrack_generator::GeneratorError;
use welltrack_state::StateError;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub(crate) fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

pub(crate) fn state_error(err: &StateError) -> Response {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_rejected_input() {
        StatusCode::BAD_REQUEST
    } else {
        error!(%err, "store operation failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    error_response(&err.to_string(), status)
}

pub(crate) fn generator_error(err: &GeneratorError) -> Response {
    match err {
        GeneratorError::State(inner) => state_error(inner),
        _ => error_response(&err.to_string(), StatusCode::BAD_REQUEST),
    }
}
