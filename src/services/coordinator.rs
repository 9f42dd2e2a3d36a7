//! Profile upsert orchestration.
//!
//! Sequences upload -> encode -> persist for create and edit, applies the
//! configured failure policies, and collects user-facing warnings for the
//! steps that degraded instead of failing. Each step runs at most once
//! per operation; there are no retries.

use thiserror::Error;
use uuid::Uuid;

use crate::config::FailurePolicy;
use crate::domain::{ImageUpload, Profile, ProfileFields, ProfileForm};
use crate::services::encoder::EncodingError;
use crate::services::storage::{self, StorageError};
use crate::services::store::StoreError;

/// Persistence seam consumed by the coordinator.
pub trait ProfileRepo {
    async fn insert(&self, fields: ProfileFields) -> Result<Profile, StoreError>;
    async fn fetch(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn update(&self, id: Uuid, fields: ProfileFields) -> Result<Profile, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Blob storage seam.
pub trait ImageStore {
    async fn upload(&self, image: &ImageUpload) -> Result<String, StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Encoding gateway seam.
pub trait FaceEncoder {
    async fn encode(&self, image_url: &str) -> Result<Vec<f64>, EncodingError>;
}

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("{0}")]
    Validation(String),

    #[error("profile {0} not found")]
    NotFound(Uuid),

    #[error("image upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("face encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Non-blocking notification attached to an operation that degraded.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Warning {
    pub title: String,
    pub detail: String,
}

impl Warning {
    fn new(title: &str, detail: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            detail: detail.into(),
        }
    }
}

/// Result of a completed create/update: the persisted profile plus any
/// warnings from steps that degraded under the lenient policy.
#[derive(Debug)]
pub struct UpsertOutcome {
    pub profile: Profile,
    pub warnings: Vec<Warning>,
}

pub struct Coordinator<R, S, E> {
    repo: R,
    images: S,
    encoder: E,
    upload_policy: FailurePolicy,
    encoding_policy: FailurePolicy,
}

impl<R, S, E> Coordinator<R, S, E>
where
    R: ProfileRepo,
    S: ImageStore,
    E: FaceEncoder,
{
    pub fn new(
        repo: R,
        images: S,
        encoder: E,
        upload_policy: FailurePolicy,
        encoding_policy: FailurePolicy,
    ) -> Self {
        Self {
            repo,
            images,
            encoder,
            upload_policy,
            encoding_policy,
        }
    }

    /// Create a new profile. Without an image both `image_url` and
    /// `face_encoding` stay null and no remote call is made.
    pub async fn create(&self, form: ProfileForm) -> Result<UpsertOutcome, UpsertError> {
        let form = form.normalized();
        validate(&form)?;

        let mut warnings = Vec::new();
        let (image_url, face_encoding) = match &form.image {
            Some(image) => self.ingest_image(image, (None, None), &mut warnings).await?,
            None => (None, None),
        };

        let profile = self
            .repo
            .insert(ProfileFields {
                name: form.name,
                greeting: form.greeting,
                bio: form.bio,
                image_url,
                face_encoding,
            })
            .await?;

        Ok(UpsertOutcome { profile, warnings })
    }

    /// Update an existing profile (full-row write). Without a new image
    /// the existing `image_url` and `face_encoding` pass through
    /// untouched; neither the uploader nor the encoder is called.
    pub async fn update(&self, id: Uuid, form: ProfileForm) -> Result<UpsertOutcome, UpsertError> {
        let form = form.normalized();
        validate(&form)?;

        let existing = self
            .repo
            .fetch(id)
            .await?
            .ok_or(UpsertError::NotFound(id))?;

        let mut warnings = Vec::new();
        let (image_url, face_encoding) = match &form.image {
            Some(image) => {
                self.ingest_image(
                    image,
                    (existing.image_url, existing.face_encoding),
                    &mut warnings,
                )
                .await?
            }
            None => (existing.image_url, existing.face_encoding),
        };

        let profile = self
            .repo
            .update(
                id,
                ProfileFields {
                    name: form.name,
                    greeting: form.greeting,
                    bio: form.bio,
                    image_url,
                    face_encoding,
                },
            )
            .await?;

        Ok(UpsertOutcome { profile, warnings })
    }

    /// Delete a profile, removing its image blob best-effort first.
    /// Blob removal failure never blocks the row delete; deleting a
    /// missing id is a no-op.
    pub async fn delete(&self, id: Uuid) -> Result<(), UpsertError> {
        let Some(profile) = self.repo.fetch(id).await? else {
            return Ok(());
        };

        if let Some(key) = profile
            .image_url
            .as_deref()
            .and_then(storage::object_key_from_url)
        {
            if let Err(e) = self.images.remove(&key).await {
                tracing::warn!(profile_id = %id, key = %key, error = %e,
                    "Failed to remove profile image, deleting row anyway");
            }
        }

        self.repo.delete(id).await?;

        Ok(())
    }

    /// Upload the new image and encode it, applying the configured
    /// policies. Returns the `(image_url, face_encoding)` pair to
    /// persist; `fallback` carries the previous pair for the lenient
    /// upload-failure path.
    async fn ingest_image(
        &self,
        image: &ImageUpload,
        fallback: (Option<String>, Option<Vec<f64>>),
        warnings: &mut Vec<Warning>,
    ) -> Result<(Option<String>, Option<Vec<f64>>), UpsertError> {
        let url = match self.images.upload(image).await {
            Ok(url) => url,
            Err(e) if self.upload_policy.is_strict() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Image upload failed, continuing without image change");
                warnings.push(Warning::new(
                    "Image Upload Failed",
                    "There was a problem uploading the image. The profile was saved without \
                     an image change.",
                ));
                // Image unchanged, so the previous encoding still matches it.
                return Ok(fallback);
            }
        };

        match self.encoder.encode(&url).await {
            Ok(encoding) => Ok((Some(url), Some(encoding))),
            Err(e) if self.encoding_policy.is_strict() => Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Face encoding failed, persisting without encoding");
                warnings.push(encoding_warning(&e));
                // The image was replaced; a stale encoding must not
                // outlive it.
                Ok((Some(url), None))
            }
        }
    }
}

fn validate(form: &ProfileForm) -> Result<(), UpsertError> {
    if form.name.is_empty() {
        return Err(UpsertError::Validation("Name is required".to_string()));
    }
    Ok(())
}

/// Condition-specific guidance for a degraded encoding step.
fn encoding_warning(err: &EncodingError) -> Warning {
    match err {
        EncodingError::NoFaceDetected => Warning::new(
            "No Face Detected",
            "We couldn't find a face in the image. The profile was saved without a face \
             encoding; upload a clear photo of a single face to add one.",
        ),
        EncodingError::MultipleFacesDetected => Warning::new(
            "Multiple Faces Detected",
            "The image contains more than one face. The profile was saved without a face \
             encoding; upload a photo with exactly one face to add one.",
        ),
        EncodingError::Timeout => Warning::new(
            "Face Encoding Timed Out",
            "The face recognition service took too long to respond. The profile was saved \
             without a face encoding.",
        ),
        _ => Warning::new(
            "Face Encoding Unavailable",
            "The face recognition service could not process the image. The profile was \
             saved without a face encoding.",
        ),
    }
}
