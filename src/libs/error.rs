//! Error taxonomy shared by the RPC handlers, the transports and the
//! mutation layer.
//!
//! `RpcError` is serialised as `{"code": "NOT_FOUND", "message": "..."}` so the
//! same value survives the HTTP boundary unchanged.

use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type RpcResult<T> = Result<T, RpcError>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcError {
    /// Missing or invalid credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The id does not resolve under the caller's ownership.
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique field already exists (category names).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// Network failure or timeout between client and server.
    #[error("transport error: {0}")]
    Transport(String),
}

impl RpcError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        RpcError::NotFound(what.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::NotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RpcError::Unauthorized(_))
    }

    /// Failures the user may retry; ownership and validation errors are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Internal(_) | RpcError::Transport(_))
    }

    pub fn status(&self) -> u16 {
        match self {
            RpcError::Unauthorized(_) => 401,
            RpcError::NotFound(_) => 404,
            RpcError::Conflict(_) => 409,
            RpcError::BadRequest(_) => 400,
            RpcError::Internal(_) => 500,
            RpcError::Transport(_) => 502,
        }
    }

    /// Rebuilds an error from an HTTP status when the body carried no
    /// structured error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            body.trim().to_string()
        };
        match status {
            401 | 403 => RpcError::Unauthorized(message),
            404 => RpcError::NotFound(message),
            409 => RpcError::Conflict(message),
            400 | 422 => RpcError::BadRequest(message),
            500..=599 => RpcError::Internal(message),
            _ => RpcError::Transport(message),
        }
    }
}

impl From<rusqlite::Error> for RpcError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation => RpcError::Conflict(err.to_string()),
            _ => RpcError::Internal(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RpcError::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            RpcError::Internal(format!("malformed response: {}", err))
        } else {
            RpcError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_code_and_message() {
        let json = serde_json::to_value(RpcError::NotFound("todo 7".into())).unwrap();
        assert_eq!(json, serde_json::json!({"code": "NOT_FOUND", "message": "todo 7"}));

        let back: RpcError = serde_json::from_value(json).unwrap();
        assert!(back.is_not_found());
    }

    #[test]
    fn status_mapping_is_symmetric() {
        for err in [
            RpcError::Unauthorized("x".into()),
            RpcError::NotFound("x".into()),
            RpcError::Conflict("x".into()),
            RpcError::BadRequest("x".into()),
            RpcError::Internal("x".into()),
        ] {
            let rebuilt = RpcError::from_status(err.status(), "x");
            assert_eq!(rebuilt, err);
        }
    }

    #[test]
    fn only_infrastructure_failures_are_retryable() {
        assert!(RpcError::Transport("down".into()).is_retryable());
        assert!(!RpcError::NotFound("gone".into()).is_retryable());
        assert!(!RpcError::Unauthorized("who".into()).is_retryable());
    }
}
