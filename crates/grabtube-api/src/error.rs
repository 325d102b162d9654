//! API error types.
//!
//! Taxonomy: input errors are 400 and never retried; upstream failures are
//! 500 with a `details` hint rewritten for the user; nothing is retried
//! automatically beyond the extractor's fixed persona sequence.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{error}: {details}")]
    Upstream { error: String, details: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn upstream(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Upstream {
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::BadRequest(error) => ErrorResponse {
                error,
                details: None,
            },
            ApiError::Upstream { error, details } => ErrorResponse {
                error,
                details: Some(details),
            },
            ApiError::Internal(error) => {
                tracing::error!("Internal error: {}", error);
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Rewrite a raw upstream failure into user-facing guidance for the known
/// failure substrings; anything unrecognized passes through unchanged.
pub fn rewrite_upstream_error(message: &str, has_cookies: bool) -> String {
    if message.contains("429") {
        "YouTube is rate limiting requests from this server. Please try again later.".to_string()
    } else if message.contains("Sign in") {
        if has_cookies {
            "YouTube rejected the provided cookies. They may be expired or invalid.".to_string()
        } else {
            "YouTube requires sign-in for this video. Please configure the YOUTUBE_COOKIES \
             environment variable."
                .to_string()
        }
    } else if message.contains("formats") {
        if has_cookies {
            "No playable formats found even with cookies. The server IP might be blocked."
                .to_string()
        } else {
            "No playable formats found. Please configure the YOUTUBE_COOKIES environment variable."
                .to_string()
        }
    } else {
        message.to_string()
    }
}
