pub mod capture;
pub mod encoding;
pub mod health;
pub mod profiles;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Profiles
        .route("/profiles", post(profiles::create_profile))
        .route("/profiles", get(profiles::list_profiles))
        .route("/profiles/:profile_id", get(profiles::get_profile))
        .route("/profiles/:profile_id", put(profiles::update_profile))
        .route("/profiles/:profile_id", delete(profiles::delete_profile))
        // Face encoding gateway
        .route(
            "/generate-face-encoding",
            post(encoding::generate_face_encoding),
        )
        // Capture device lease
        .route("/capture", post(capture::activate_capture))
        .route("/capture/:session_id", delete(capture::release_capture))
}
