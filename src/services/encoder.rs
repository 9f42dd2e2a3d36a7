//! Face encoding provider client.
//!
//! Thin relay to the external face-recognition service: forwards an image
//! URL as a JSON POST, bounds the wait time, and normalizes the provider's
//! uneven response shapes into a plain numeric vector.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Failure conditions of an encoding attempt.
///
/// The two face-count conditions are provider-reported and relayed, not
/// computed locally; they carry different user guidance downstream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("no face detected in image")]
    NoFaceDetected,

    #[error("multiple faces detected in image")]
    MultipleFacesDetected,

    #[error("face encoding provider error: {message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("face encoding request timed out")]
    Timeout,

    #[error("face encoding service is not configured")]
    Configuration,

    #[error("invalid encoding payload: {0}")]
    InvalidPayload(String),
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    #[serde(rename = "imageUrl")]
    image_url: &'a str,
}

#[derive(Deserialize)]
struct EncodeResponse {
    encoding: Value,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    detail: Option<String>,
}

/// Client for the face encoding provider.
#[derive(Clone)]
pub struct EncodingClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl EncodingClient {
    /// Create a new provider client. A missing base URL is allowed here;
    /// `encode` reports it as a configuration error per request.
    pub fn new(
        base_url: Option<&str>,
        api_key: Option<&str>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        match base_url {
            Some(url) => tracing::info!(base_url = url, "Face encoding client initialized"),
            None => tracing::warn!("FACE_API_URL is not set - encoding requests will fail"),
        }

        Ok(Self {
            client,
            base_url: base_url.map(|s| s.trim_end_matches('/').to_string()),
            api_key: api_key.map(str::to_string),
            timeout: Duration::from_secs(timeout_seconds),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Request a face encoding for a publicly dereferenceable image URL.
    ///
    /// The timeout is a hard bound; reqwest aborts the in-flight request
    /// when it fires, so no call outlives the caller.
    pub async fn encode(&self, image_url: &str) -> Result<Vec<f64>, EncodingError> {
        let base = self.base_url.as_deref().ok_or(EncodingError::Configuration)?;
        let url = format!("{base}/generate-encoding");

        tracing::debug!(url = %url, "Requesting face encoding");

        let mut req = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&EncodeRequest { image_url });

        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!("Face encoding request timed out");
                EncodingError::Timeout
            } else {
                tracing::error!(error = %e, "Face encoding request failed");
                EncodingError::Provider {
                    status: None,
                    message: format!("Face recognition service unavailable: {e}"),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|b| b.detail);
            return Err(classify_failure(status.as_u16(), detail));
        }

        let body: EncodeResponse = response.json().await.map_err(|e| {
            EncodingError::InvalidPayload(format!("undecodable response body: {e}"))
        })?;

        normalize_encoding(body.encoding)
    }

    /// Provider liveness probe, used by the health endpoint.
    pub async fn health_check(&self) -> Result<()> {
        let base = self
            .base_url
            .as_deref()
            .context("face encoding service not configured")?;

        self.client
            .get(format!("{base}/health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Face encoding service health check failed")?
            .error_for_status()
            .context("Face encoding service unhealthy")?;

        Ok(())
    }
}

impl crate::services::coordinator::FaceEncoder for EncodingClient {
    async fn encode(&self, image_url: &str) -> Result<Vec<f64>, EncodingError> {
        EncodingClient::encode(self, image_url).await
    }
}

/// Map a provider error response to a distinct failure condition,
/// surfacing the provider's detail message when present and preserving
/// its status code otherwise.
fn classify_failure(status: u16, detail: Option<String>) -> EncodingError {
    if let Some(detail) = &detail {
        let lower = detail.to_lowercase();
        if lower.contains("no face") {
            return EncodingError::NoFaceDetected;
        }
        if lower.contains("multiple face") {
            return EncodingError::MultipleFacesDetected;
        }
    }

    EncodingError::Provider {
        status: Some(status),
        message: detail
            .unwrap_or_else(|| format!("Face recognition service error: {status}")),
    }
}

/// Coerce the provider's encoding payload into a numeric vector.
///
/// The provider is not consistent about its response shape: the encoding
/// arrives either as a native JSON array or as a JSON-encoded string of
/// one. Both are accepted transparently.
fn normalize_encoding(value: Value) -> Result<Vec<f64>, EncodingError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    EncodingError::InvalidPayload(format!("non-numeric element: {v}"))
                })
            })
            .collect(),
        Value::String(s) => serde_json::from_str::<Vec<f64>>(&s).map_err(|e| {
            EncodingError::InvalidPayload(format!("string-encoded array did not parse: {e}"))
        }),
        other => Err(EncodingError::InvalidPayload(format!(
            "expected array or string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_native_array() {
        let out = normalize_encoding(json!([1.0, 2.5, -3.0])).unwrap();
        assert_eq!(out, vec![1.0, 2.5, -3.0]);
    }

    #[test]
    fn normalizes_string_encoded_array() {
        let out = normalize_encoding(json!("[1,2,3]")).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_non_numeric_elements() {
        let err = normalize_encoding(json!([1.0, "x"])).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPayload(_)));
    }

    #[test]
    fn rejects_unparseable_string() {
        let err = normalize_encoding(json!("not an array")).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPayload(_)));
    }

    #[test]
    fn rejects_other_shapes() {
        let err = normalize_encoding(json!({"a": 1})).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPayload(_)));
    }

    #[test]
    fn classifies_no_face_detail() {
        let err = classify_failure(422, Some("No face detected in the image".to_string()));
        assert_eq!(err, EncodingError::NoFaceDetected);
    }

    #[test]
    fn classifies_multiple_faces_detail() {
        let err = classify_failure(400, Some("Multiple faces detected".to_string()));
        assert_eq!(err, EncodingError::MultipleFacesDetected);
    }

    #[test]
    fn preserves_provider_status_and_detail() {
        let err = classify_failure(503, Some("model is loading".to_string()));
        assert_eq!(
            err,
            EncodingError::Provider {
                status: Some(503),
                message: "model is loading".to_string(),
            }
        );
    }

    #[test]
    fn generic_message_when_detail_absent() {
        let err = classify_failure(500, None);
        assert_eq!(
            err,
            EncodingError::Provider {
                status: Some(500),
                message: "Face recognition service error: 500".to_string(),
            }
        );
    }
}
