//! JSON settings API

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use super::error::{AppError, FieldErrors};
use super::SharedState;
use crate::repository::Repository;
use crate::settings::{SettingChanges, SettingValue};

/// GET /api/settings
pub async fn index(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let settings = state.settings.all()?;
    Ok(Json(json!({ "data": settings })))
}

/// PATCH /api/settings with `{"key": ..., "value": ...}`
pub async fn update(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::invalid("body", rejection.body_text()))?;
    let (key, value) = validate_update(&body)?;

    let setting = state
        .settings
        .find_by_key(&key)?
        .ok_or_else(|| AppError::invalid("key", "The selected key is invalid."))?;
    let updated = state
        .settings
        .update(SettingChanges::value(value), &setting)?;

    tracing::info!("Setting {} updated to {}", updated.key, updated.value);
    Ok(Json(json!({ "data": updated })))
}

/// Check the request shape, collecting every field error
fn validate_update(body: &Value) -> Result<(String, SettingValue), AppError> {
    let Some(fields) = body.as_object() else {
        return Err(AppError::invalid("body", "The request body must be a JSON object."));
    };

    let mut errors = FieldErrors::new();

    let key = match fields.get("key") {
        Some(Value::String(k)) if !k.trim().is_empty() => Some(k.trim().to_string()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            errors
                .entry("key".into())
                .or_default()
                .push("The key field is required.".into());
            None
        }
        Some(_) => {
            errors
                .entry("key".into())
                .or_default()
                .push("The key must be a string.".into());
            None
        }
    };

    let value = match fields.get("value") {
        None => {
            errors
                .entry("value".into())
                .or_default()
                .push("The value field is required.".into());
            None
        }
        Some(raw) => match SettingValue::try_from(raw.clone()) {
            Ok(v) => Some(v),
            Err(_) => {
                errors
                    .entry("value".into())
                    .or_default()
                    .push("The value must be a boolean, number or string.".into());
                None
            }
        },
    };

    match (key, value) {
        (Some(key), Some(value)) if errors.is_empty() => Ok((key, value)),
        _ => Err(AppError::from_fields(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_scalar() {
        let (key, value) =
            validate_update(&json!({"key": "show_contact_section", "value": true})).unwrap();
        assert_eq!(key, "show_contact_section");
        assert_eq!(value, SettingValue::Bool(true));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        match validate_update(&json!({"key": "", "value": [1]})) {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("key"));
                assert!(errors.contains_key("value"));
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_validate_rejects_null_and_non_objects() {
        assert!(validate_update(&json!({"key": "a", "value": null})).is_err());
        assert!(validate_update(&json!({"key": "a"})).is_err());
        assert!(validate_update(&json!(["key", "value"])).is_err());
    }
}
