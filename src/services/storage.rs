//! Supabase storage client for profile images.
//!
//! Stores image bytes under a collision-resistant key and returns the
//! public object URL. The caller's filename contributes only its
//! extension; the key itself is a random token.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::ImageUpload;
use crate::services::coordinator::ImageStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("object store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for the Supabase storage REST API.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, bucket = bucket, "Storage client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            service_key: service_key.to_string(),
        })
    }

    /// Public URL for a stored object key, stable once issued.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }
}

impl ImageStore for SupabaseStorage {
    /// Upload image bytes and return the public URL of the stored object.
    async fn upload(&self, image: &ImageUpload) -> Result<String, StorageError> {
        let key = object_key(image.file_name.as_deref());
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);

        tracing::debug!(key = %key, size = image.bytes.len(), "Uploading profile image");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(
                "Content-Type",
                image
                    .content_type
                    .as_deref()
                    .unwrap_or("application/octet-stream"),
            )
            .body(image.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, message = %message, "Image upload rejected");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(&key))
    }

    /// Remove a stored object. Removing a missing object is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Generate a collision-resistant object key: a random UUID plus the
/// sanitized extension of the original filename.
pub fn object_key(file_name: Option<&str>) -> String {
    let token = Uuid::new_v4();

    let ext = file_name
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase());

    match ext {
        Some(ext) => format!("{token}.{ext}"),
        None => token.to_string(),
    }
}

/// Derive the object key from a public URL (its last path segment),
/// used when deleting the blob alongside a profile.
pub fn object_key_from_url(image_url: &str) -> Option<String> {
    let parsed = url::Url::parse(image_url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_unique_for_identical_names() {
        let a = object_key(Some("photo.jpg"));
        let b = object_key(Some("photo.jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn object_key_keeps_sanitized_extension() {
        let key = object_key(Some("My Photo.JPG"));
        assert!(key.ends_with(".jpg"));

        let key = object_key(Some("archive.tar.gz"));
        assert!(key.ends_with(".gz"));
    }

    #[test]
    fn object_key_ignores_missing_or_bad_extension() {
        assert!(!object_key(Some("noextension")).contains('.'));
        assert!(!object_key(None).contains('.'));
        // path separators and other junk never leak into the key
        assert!(!object_key(Some("evil/../../x.j pg")).contains('/'));
    }

    #[test]
    fn object_key_from_public_url() {
        let url = "https://proj.supabase.co/storage/v1/object/public/profile_images/abc123.png";
        assert_eq!(object_key_from_url(url), Some("abc123.png".to_string()));
    }

    #[test]
    fn object_key_from_invalid_url() {
        assert_eq!(object_key_from_url("not a url"), None);
    }
}
