//!
//! # Error Handling
//!
//! `AppError` is the single failure type returned by services and handlers. Each
//! variant maps to a stable machine-readable `kind` and an HTTP status through
//! `actix_web::error::ResponseError`, so handlers can simply use `?`.
//!
//! Store failures arrive as `StoreError` and are folded in here: unique violations
//! become `Conflict`, dangling references become validation issues, and everything
//! else becomes a generic `Unavailable` whose detail is logged, never returned.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::password::PasswordError;
use crate::store::StoreError;

pub const VALIDATION_FAILED: &str = "Validation failed.";
const UNAVAILABLE: &str = "Service temporarily unavailable.";

/// One offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range input (HTTP 400).
    #[error("{message}")]
    Validation {
        message: String,
        issues: Vec<FieldIssue>,
    },
    /// Uniqueness violation (HTTP 409).
    #[error("{0}")]
    Conflict(String),
    /// Bad credentials or a missing/invalid/expired token (HTTP 401).
    #[error("{0}")]
    Unauthorized(String),
    /// Referenced entity absent (HTTP 404).
    #[error("{0}")]
    NotFound(String),
    /// Store or downstream failure (HTTP 500).
    #[error("{0}")]
    Unavailable(String),
}

impl AppError {
    /// Validation failure for a single field.
    pub fn invalid_field(path: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            message: VALIDATION_FAILED.to_string(),
            issues: vec![FieldIssue::new(path, message)],
        }
    }

    /// Generic `Unavailable`; `detail` goes to the log only.
    pub fn unavailable(detail: impl std::fmt::Display) -> Self {
        log::error!("downstream failure: {}", detail);
        AppError::Unavailable(UNAVAILABLE.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Unavailable(_) => "unavailable",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { message, issues } => json!({
                "kind": self.kind(),
                "message": message,
                "issues": issues,
            }),
            other => json!({
                "kind": other.kind(),
                "message": other.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Flattens field errors into sorted `FieldIssue`s.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut issues: Vec<FieldIssue> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", err.code));
                    FieldIssue::new(field, message)
                })
            })
            .collect();
        issues.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));

        AppError::Validation {
            message: VALIDATION_FAILED.to_string(),
            issues,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::MissingReference(field) => {
                AppError::invalid_field(field, "Referenced user does not exist.")
            }
            StoreError::Unavailable(detail) => AppError::unavailable(detail),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(error: PasswordError) -> AppError {
        match error {
            PasswordError::TooLong => {
                AppError::invalid_field("password", "Password must be 72 bytes or fewer.")
            }
            other => AppError::unavailable(other),
        }
    }
}
