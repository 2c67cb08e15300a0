//! HTTP error response mapping.
//!
//! | code | category | status |
//! |------|----------|--------|
//! | 1 | `json parse error` | 400 |
//! | 2 | `index out of range` | 404 |
//! | 3 | `validation error` | 400 |
//! | 4 | `unsupported` | 409 |
//! | 5 | `hardware error` | 500 |

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use lightsrv_domain::error::LightsrvError;

#[derive(Serialize)]
struct ErrorDetail {
    code: u8,
    category: &'static str,
    message: String,
}

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Maps [`LightsrvError`] and extractor rejections to an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    Domain(LightsrvError),
    /// The request body is not the expected JSON document.
    Body(JsonRejection),
    /// The channel index in the path is not a number.
    Path(PathRejection),
}

impl From<LightsrvError> for ApiError {
    fn from(err: LightsrvError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::Body(err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        Self::Path(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, u8, &'static str, String) {
        match self {
            Self::Body(err) => (StatusCode::BAD_REQUEST, 1, "json parse error", err.body_text()),
            Self::Path(err) => (StatusCode::NOT_FOUND, 2, "index out of range", err.body_text()),
            Self::Domain(LightsrvError::IndexOutOfRange(err)) => {
                (StatusCode::NOT_FOUND, 2, "index out of range", err.to_string())
            }
            Self::Domain(LightsrvError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, 3, "validation error", err.to_string())
            }
            Self::Domain(err @ LightsrvError::AutomationUnsupported) => {
                (StatusCode::CONFLICT, 4, "unsupported", err.to_string())
            }
            Self::Domain(LightsrvError::Hardware(err)) => {
                tracing::error!(error = %err, "hardware error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    5,
                    "hardware error",
                    "internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, category, message) = self.parts();
        if status.is_client_error() {
            tracing::debug!(code, category, %message, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code,
                category,
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
