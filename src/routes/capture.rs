//! Capture device lease endpoints.
//!
//! The capture device admits one session at a time. Activation stores the
//! RAII session guard in application state; release (or replacement at
//! shutdown) drops the guard, which frees the device.

use axum::{extract::Path, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Serialize)]
pub struct CaptureSessionResponse {
    pub session_id: Uuid,
    pub opened_at: DateTime<Utc>,
}

/// POST /capture
pub async fn activate_capture(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let mut active = state
        .active_capture
        .lock()
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("capture state poisoned")))?;

    if active.is_some() {
        return Err(ApiError::Conflict(
            "Capture device is already in use".to_string(),
        ));
    }

    let session = state.capture.try_activate().ok_or_else(|| {
        ApiError::Conflict("Capture device is already in use".to_string())
    })?;

    let response = CaptureSessionResponse {
        session_id: session.id(),
        opened_at: session.opened_at(),
    };

    *active = Some(session);

    Ok(Created(DataResponse::new(response)))
}

/// DELETE /capture/:session_id
///
/// Idempotent: releasing an unknown or already-released session succeeds.
pub async fn release_capture(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut active = state
        .active_capture
        .lock()
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("capture state poisoned")))?;

    if active.as_ref().is_some_and(|s| s.id() == session_id) {
        // Dropping the guard releases the device
        *active = None;
    }

    Ok(NoContent)
}
