//! Profile routes
//!
//! CRUD surface for profiles. Create and update accept multipart form
//! data (text fields plus an optional image file) and run through the
//! upsert coordinator; warnings from degraded steps come back in the
//! response `meta`.

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{ApiResponse, Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::domain::{ImageUpload, ProfileForm};
use crate::error::{ApiError, ApiResult};
use crate::services::coordinator::{ProfileRepo, UpsertOutcome};

/// POST /profiles
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_form(multipart).await?;

    tracing::info!(name = %form.name, has_image = form.image.is_some(), "Creating profile");

    let outcome = state.coordinator.create(form).await?;

    Ok(Created(outcome_response(outcome)))
}

/// GET /profiles
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let profiles = state.store.list().await?;

    Ok(DataResponse::new(profiles))
}

/// GET /profiles/:profile_id
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .store
        .fetch(profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {profile_id} not found")))?;

    Ok(DataResponse::new(profile))
}

/// PUT /profiles/:profile_id
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_form(multipart).await?;

    tracing::info!(profile_id = %profile_id, has_image = form.image.is_some(), "Updating profile");

    let outcome = state.coordinator.update(profile_id, form).await?;

    Ok(outcome_response(outcome))
}

/// DELETE /profiles/:profile_id
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!(profile_id = %profile_id, "Deleting profile");

    state.coordinator.delete(profile_id).await?;

    Ok(NoContent)
}

fn outcome_response(outcome: UpsertOutcome) -> ApiResponse<crate::domain::Profile> {
    if outcome.warnings.is_empty() {
        ApiResponse::new(outcome.profile)
    } else {
        ApiResponse::with_meta(outcome.profile, json!({ "warnings": outcome.warnings }))
    }
}

/// Parse the multipart body into a profile form. Unknown parts are
/// ignored; normalization and validation happen in the coordinator.
async fn read_form(mut multipart: Multipart) -> Result<ProfileForm, ApiError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "name" => {
                form.name = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid 'name' field: {e}")))?;
            }
            "greeting" => {
                form.greeting = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Invalid 'greeting' field: {e}"))
                })?);
            }
            "bio" => {
                form.bio = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Invalid 'bio' field: {e}")))?,
                );
            }
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid image upload: {e}")))?;

                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}
