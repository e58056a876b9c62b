use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            400 | 422 => Self::Validation,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// Error document a foods backend may return alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: ErrorCode,
    #[serde(default, alias = "error")]
    pub message: String,
}

#[derive(Debug, Error)]
#[error("backend returned {status} ({code:?}): {message}")]
pub struct ApiException {
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    /// Builds an exception from a status and the raw response body. A body
    /// that parses as [`ApiError`] contributes its code and message; anything
    /// else is kept verbatim as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiError>(body) {
            Ok(api_error) if !api_error.message.is_empty() => Self {
                status,
                code: match api_error.code {
                    ErrorCode::Unknown => ErrorCode::from_status(status),
                    code => code,
                },
                message: api_error.message,
            },
            _ => Self {
                status,
                code: ErrorCode::from_status(status),
                message: body.trim().to_string(),
            },
        }
    }
}
