//! Profile persistence over PostgreSQL.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Profile, ProfileFields};
use crate::services::coordinator::ProfileRepo;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    greeting: Option<String>,
    bio: Option<String>,
    image_url: Option<String>,
    face_encoding: Option<Vec<f64>>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            greeting: row.greeting,
            bio: row.bio,
            image_url: row.image_url,
            face_encoding: row.face_encoding,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const RETURNING: &str =
    "RETURNING id, name, greeting, bio, image_url, face_encoding, created_at, updated_at";

/// Postgres-backed profile store. `id` and `created_at` are generated by
/// the database at insert and never written afterwards.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All profiles, newest first.
    pub async fn list(&self) -> Result<Vec<Profile>, StoreError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, greeting, bio, image_url, face_encoding, created_at, updated_at
            FROM profiles
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }
}

impl ProfileRepo for PgProfileStore {
    async fn insert(&self, fields: ProfileFields) -> Result<Profile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (name, greeting, bio, image_url, face_encoding)
            VALUES ($1, $2, $3, $4, $5)
            {RETURNING}
            "#
        ))
        .bind(&fields.name)
        .bind(&fields.greeting)
        .bind(&fields.bio)
        .bind(&fields.image_url)
        .bind(&fields.face_encoding)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(profile_id = %row.id, "Profile created");

        Ok(row.into())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, greeting, bio, image_url, face_encoding, created_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn update(&self, id: Uuid, fields: ProfileFields) -> Result<Profile, StoreError> {
        // Full-row update; profiles are small and edits always carry the
        // complete field set.
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles SET
                name = $2,
                greeting = $3,
                bio = $4,
                image_url = $5,
                face_encoding = $6,
                updated_at = now()
            WHERE id = $1
            {RETURNING}
            "#
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.greeting)
        .bind(&fields.bio)
        .bind(&fields.image_url)
        .bind(&fields.face_encoding)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        tracing::info!(profile_id = %id, "Profile updated");

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        // Idempotent: deleting a missing id is a no-op.
        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(profile_id = %id, "Profile deleted");

        Ok(())
    }
}
