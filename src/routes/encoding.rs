//! Face encoding gateway endpoint.
//!
//! Relays an image URL to the external face-recognition provider and
//! returns the normalized encoding vector. Failure conditions map to
//! distinct status codes so callers can give condition-specific guidance.

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Deserialize)]
pub struct GenerateEncodingRequest {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Serialize)]
pub struct GenerateEncodingResponse {
    pub encoding: Vec<f64>,
}

/// POST /generate-face-encoding
pub async fn generate_face_encoding(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateEncodingRequest>,
) -> ApiResult<impl IntoResponse> {
    // Reject before any outbound call is made
    let image_url = require_image_url(req)?;

    let encoding = state.encoder.encode(&image_url).await?;

    tracing::debug!(len = encoding.len(), "Face encoding generated");

    Ok(Json(GenerateEncodingResponse { encoding }))
}

fn require_image_url(req: GenerateEncodingRequest) -> Result<String, ApiError> {
    req.image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image URL is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_url_is_rejected_before_any_call() {
        let err = require_image_url(GenerateEncodingRequest { image_url: None }).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn blank_image_url_is_rejected_before_any_call() {
        let err = require_image_url(GenerateEncodingRequest {
            image_url: Some("   ".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn present_image_url_passes_through() {
        let url = require_image_url(GenerateEncodingRequest {
            image_url: Some("https://blob.test/a.jpg".to_string()),
        })
        .unwrap();
        assert_eq!(url, "https://blob.test/a.jpg");
    }
}
