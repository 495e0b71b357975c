//! Account: profile and saved addresses.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use patra_core::{AddressId, Phone};

use crate::db::addresses::AddressRepository;
use crate::db::profiles::{FieldChange, ProfileRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressInput, Profile};
use crate::state::AppState;

/// Body of `PUT /api/account/profile`.
///
/// A missing or `null` field is left as it is; an empty string clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

fn field_change(value: Option<&str>) -> FieldChange<&str> {
    match value.map(str::trim) {
        None => FieldChange::Keep,
        Some("") => FieldChange::Clear,
        Some(v) => FieldChange::Set(v),
    }
}

/// GET /api/account/profile
#[instrument(skip(state, user))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    ProfileRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_owned()))
}

/// PUT /api/account/profile
#[instrument(skip(state, user))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    let full_name = field_change(body.full_name.as_deref());
    let phone = field_change(body.phone.as_deref())
        .try_map(Phone::parse)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let profile = ProfileRepository::new(state.pool())
        .update_contact(user.id, full_name, phone.as_ref())
        .await?;
    Ok(Json(profile))
}

/// GET /api/account/addresses
#[instrument(skip(state, user))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(AddressRepository::new(state.pool()).list(user.id).await?))
}

/// POST /api/account/addresses
#[instrument(skip(state, user, body))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    validate(&body)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// PUT /api/account/addresses/{id}
#[instrument(skip(state, user, body))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(body): Json<AddressInput>,
) -> Result<Json<Address>> {
    validate(&body)?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &body)
        .await?;
    Ok(Json(address))
}

/// POST /api/account/addresses/{id}/default
#[instrument(skip(state, user))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/account/addresses/{id}
#[instrument(skip(state, user))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate(input: &AddressInput) -> Result<()> {
    input
        .snapshot()
        .map(|_| ())
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_change_from_request() {
        assert_eq!(field_change(None), FieldChange::Keep);
        assert_eq!(field_change(Some("   ")), FieldChange::Clear);
        assert_eq!(field_change(Some(" Asha Verma ")), FieldChange::Set("Asha Verma"));
    }

    #[test]
    fn test_missing_fields_deserialize_as_keep() {
        let body: UpdateProfileRequest =
            serde_json::from_str(r#"{"full_name": "Asha"}"#).unwrap();
        assert_eq!(field_change(body.full_name.as_deref()), FieldChange::Set("Asha"));
        assert_eq!(field_change(body.phone.as_deref()), FieldChange::Keep);
    }
}
