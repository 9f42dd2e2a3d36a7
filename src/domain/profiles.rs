//! Profile domain types
//!
//! The profile entity stored in the profiles table, plus the form-input
//! DTO accepted by the create/edit endpoints. The entity shape is
//! canonical; form input is a strict subset with explicit defaulting for
//! omitted optional fields.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Profile entity
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub greeting: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub face_encoding: Option<Vec<f64>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field set accepted by the store for insert/update.
///
/// `id` and `created_at` are write-once and owned by the store;
/// `face_encoding` is only ever produced by the encoding gateway.
#[derive(Debug, Clone)]
pub struct ProfileFields {
    pub name: String,
    pub greeting: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub face_encoding: Option<Vec<f64>>,
}

/// An image file submitted alongside the form fields.
///
/// The payload is `Bytes` so handing it to the uploader never copies the
/// buffer.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Parsed multipart form input for create/edit.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub name: String,
    pub greeting: Option<String>,
    pub bio: Option<String>,
    pub image: Option<ImageUpload>,
}

impl ProfileForm {
    /// Apply the defaulting rules: trim text fields and collapse
    /// whitespace-only optional fields to `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.greeting = self.greeting.and_then(non_blank);
        self.bio = self.bio.and_then(non_blank);
        // An empty file part means no file was selected
        if self.image.as_ref().is_some_and(|i| i.bytes.is_empty()) {
            self.image = None;
        }
        self
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_blank_optionals() {
        let form = ProfileForm {
            name: "  Ada  ".to_string(),
            greeting: Some("   ".to_string()),
            bio: Some(" Engineer ".to_string()),
            image: None,
        }
        .normalized();

        assert_eq!(form.name, "Ada");
        assert_eq!(form.greeting, None);
        assert_eq!(form.bio, Some("Engineer".to_string()));
    }

    #[test]
    fn normalization_drops_empty_image_part() {
        let form = ProfileForm {
            name: "Ada".to_string(),
            greeting: None,
            bio: None,
            image: Some(ImageUpload {
                file_name: Some("photo.jpg".to_string()),
                content_type: None,
                bytes: Bytes::new(),
            }),
        }
        .normalized();

        assert!(form.image.is_none());
    }
}
