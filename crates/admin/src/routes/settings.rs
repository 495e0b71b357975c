//! Store settings.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use patra_core::{Email, Phone};

use super::activity;
use crate::db::SettingsRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{KNOWN_SETTING_KEYS, NewActivity, Setting};
use crate::state::AppState;

/// Body of `PUT /api/settings/{key}`.
#[derive(Debug, Deserialize)]
pub struct SettingRequest {
    pub value: Value,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(index))
        .route("/settings/{key}", put(update))
}

/// GET /api/settings
#[instrument(skip(state, _admin))]
async fn index(State(state): State<AppState>, _admin: RequireAdmin) -> Result<Json<Vec<Setting>>> {
    Ok(Json(SettingsRepository::new(state.pool()).all().await?))
}

/// PUT /api/settings/{key}
#[instrument(skip(state, admin, body))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin, _): RequireAdmin,
    Path(key): Path<String>,
    Json(body): Json<SettingRequest>,
) -> Result<Json<Setting>> {
    let value = normalize_setting(&key, body.value)?;
    let setting = SettingsRepository::new(state.pool())
        .upsert(&key, &value, admin.id)
        .await?;

    activity::record(
        &state,
        NewActivity {
            actor_id: admin.id,
            action: "update",
            entity_type: "setting",
            entity_id: None,
            details: json!({ "key": key, "value": value }),
        },
    )
    .await;

    Ok(Json(setting))
}

/// Check a setting value. Every known setting is a string; email and phone
/// are stored in canonical form.
fn normalize_setting(key: &str, value: Value) -> Result<Value> {
    if !KNOWN_SETTING_KEYS.contains(&key) {
        return Err(AppError::NotFound(format!("Unknown setting: {key}")));
    }
    let Value::String(text) = value else {
        return Err(AppError::Validation(format!("{key} must be a string")));
    };
    let text = text.trim();

    let normalized = match key {
        "store_email" => Email::parse(text)
            .map_err(|e| AppError::Validation(e.to_string()))?
            .into_inner(),
        "store_phone" => Phone::parse(text)
            .map_err(|e| AppError::Validation(e.to_string()))?
            .into_inner(),
        _ if text.is_empty() => {
            return Err(AppError::Validation(format!("{key} cannot be empty")));
        }
        _ => text.to_owned(),
    };
    Ok(Value::String(normalized))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            normalize_setting("theme", json!("dark")),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_values_must_be_strings() {
        assert!(matches!(
            normalize_setting("store_name", json!(42)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            normalize_setting("store_name", json!("   ")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_store_name_trimmed() {
        assert_eq!(
            normalize_setting("store_name", json!("  Shivpuriya Patra Bhandar ")).unwrap(),
            json!("Shivpuriya Patra Bhandar")
        );
    }

    #[test]
    fn test_store_email_canonical() {
        assert_eq!(
            normalize_setting("store_email", json!(" Orders@Patra.IN ")).unwrap(),
            json!("orders@patra.in")
        );
        assert!(normalize_setting("store_email", json!("not-an-email")).is_err());
    }
}
