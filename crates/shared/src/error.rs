use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::validation::ErrorNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Transport,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 | 410 => Self::NotFound,
            409 | 412 => Self::Conflict,
            _ => Self::Internal,
        }
    }
}

/// Error body as sent by the backend on a rejected request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Value,
}

/// A rejected backend call. `errors` mirrors the draft shape and may be empty.
#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message}")]
pub struct BackendError {
    pub status: Option<u16>,
    pub code: ErrorCode,
    pub message: String,
    pub errors: ErrorNode,
}

impl BackendError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: None,
            code,
            message: message.into(),
            errors: ErrorNode::empty(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    pub fn with_errors(mut self, errors: ErrorNode) -> Self {
        self.errors = errors;
        self
    }

    pub fn from_body(status: u16, body: ApiErrorBody) -> Self {
        Self {
            status: Some(status),
            code: ErrorCode::from_status(status),
            message: body
                .message
                .unwrap_or_else(|| format!("request failed with status {status}")),
            errors: ErrorNode::from_response_errors(body.errors),
        }
    }
}
