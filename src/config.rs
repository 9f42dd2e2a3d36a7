use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

/// Failure policy for the non-fatal steps of the upsert pipeline.
///
/// `Strict` aborts the whole operation when the step fails; `Lenient`
/// degrades (no image change / no encoding) and attaches a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Strict,
    Lenient,
}

impl FailurePolicy {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "strict" => Self::Strict,
            _ => Self::Lenient,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Supabase storage (profile images)
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub storage_bucket: String,

    // Face encoding provider
    pub face_api_url: Option<String>,
    pub face_api_key: Option<String>,
    pub face_api_timeout_seconds: u64,

    // Upsert pipeline policies
    pub upload_failure_policy: FailurePolicy,
    pub encoding_failure_policy: FailurePolicy,

    // Upload limits
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Supabase storage
        let supabase_url = env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?;
        let supabase_service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .context("SUPABASE_SERVICE_ROLE_KEY must be set")?;
        let storage_bucket =
            env::var("STORAGE_BUCKET").unwrap_or_else(|_| "profile_images".to_string());

        // Face encoding provider. Absence is not a boot failure: the
        // gateway reports a configuration error per request instead.
        let face_api_url = env::var("FACE_API_URL").ok().filter(|s| !s.is_empty());
        let face_api_key = env::var("FACE_API_KEY").ok().filter(|s| !s.is_empty());
        let face_api_timeout_seconds = env::var("FACE_API_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30); // provider face detection is unbounded in the worst case

        // Pipeline policies
        let upload_failure_policy = FailurePolicy::from_str(
            &env::var("UPLOAD_FAILURE_POLICY").unwrap_or_else(|_| "lenient".to_string()),
        );
        let encoding_failure_policy = FailurePolicy::from_str(
            &env::var("ENCODING_FAILURE_POLICY").unwrap_or_else(|_| "lenient".to_string()),
        );

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024);

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            cors_allow_origins,
            supabase_url,
            supabase_service_role_key,
            storage_bucket,
            face_api_url,
            face_api_key,
            face_api_timeout_seconds,
            upload_failure_policy,
            encoding_failure_policy,
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(Environment::from_str("prod"), Environment::Prod);
        assert_eq!(Environment::from_str("Production"), Environment::Prod);
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert_eq!(Environment::from_str("dev"), Environment::Dev);
        assert_eq!(Environment::from_str("anything"), Environment::Dev);
    }

    #[test]
    fn failure_policy_parsing_defaults_to_lenient() {
        assert_eq!(FailurePolicy::from_str("strict"), FailurePolicy::Strict);
        assert_eq!(FailurePolicy::from_str(" STRICT "), FailurePolicy::Strict);
        assert_eq!(FailurePolicy::from_str("lenient"), FailurePolicy::Lenient);
        assert_eq!(FailurePolicy::from_str("bogus"), FailurePolicy::Lenient);
    }
}
