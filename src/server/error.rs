//! Errors returned by the JSON API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::settings::SettingsError;

/// Field name -> validation messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// A validation failure on a single field
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::from_fields(errors)
    }

    /// A validation failure; the first message becomes the summary
    pub fn from_fields(errors: FieldErrors) -> Self {
        let mut messages = errors.values().flatten();
        let message = match (messages.next(), messages.count()) {
            (Some(first), 0) => first.clone(),
            (Some(first), more) => format!(
                "{} (and {} more error{})",
                first,
                more,
                if more == 1 { "" } else { "s" }
            ),
            (None, _) => "The given data was invalid.".to_string(),
        };
        Self::Validation { message, errors }
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::NotFound(key) => AppError::NotFound(format!("Setting {} not found", key)),
            SettingsError::Conflict(key) => {
                AppError::invalid("key", format!("The key {} has already been taken.", key))
            }
            SettingsError::InvalidValue(msg) => AppError::invalid("value", msg),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            AppError::Validation { message, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": message, "errors": errors })),
            )
                .into_response(),
            AppError::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
