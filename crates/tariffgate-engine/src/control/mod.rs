//! Control API: rule management and retained-flow introspection over HTTP.
//!
//! Errors render as `{"code": ..., "msg": ...}` using the stable core codes.

pub mod retained;
pub mod rules;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use tariffgate_core::error::{ErrorCode, TariffError};

/// Wrapper turning core errors into HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub TariffError);

impl From<TariffError> for ApiError {
    fn from(e: TariffError) -> Self {
        Self(e)
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRule | ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::DuplicateFlow => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let body = json!({ "code": code.as_str(), "msg": self.0.to_string() });
        (status_for(code), Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
