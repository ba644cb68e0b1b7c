//! Settings: key/value rows that toggle sections of the site

mod model;
mod repository;

pub use model::{NewSetting, Setting, SettingChanges, SettingValue};
pub use repository::SettingRepository;

use thiserror::Error;

/// Setting persistence errors
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("setting not found: {0}")]
    NotFound(String),

    #[error("setting key already exists: {0}")]
    Conflict(String),

    #[error("invalid setting value: {0}")]
    InvalidValue(String),

    #[error("invalid timestamp in settings table: {0}")]
    InvalidTimestamp(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Poisoned(String),
}
