use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Settings;
use crate::middleware::request_id_layer;
use crate::routes;
use crate::services::{
    CaptureDevice, CaptureSession, Coordinator, EncodingClient, PgProfileStore, SupabaseStorage,
};

/// Shared application state
pub struct AppState {
    pub db: PgPool,
    pub settings: Settings,
    pub store: PgProfileStore,
    pub encoder: EncodingClient,
    pub coordinator: Coordinator<PgProfileStore, SupabaseStorage, EncodingClient>,
    pub capture: CaptureDevice,
    /// The currently active capture session, if any. The guard inside
    /// releases the device whenever it is dropped - explicit release,
    /// replacement, or state teardown.
    pub active_capture: Mutex<Option<CaptureSession>>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        settings: Settings,
        store: PgProfileStore,
        encoder: EncodingClient,
        coordinator: Coordinator<PgProfileStore, SupabaseStorage, EncodingClient>,
        capture: CaptureDevice,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            settings,
            store,
            encoder,
            coordinator,
            capture,
            active_capture: Mutex::new(None),
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Use DEBUG for spans to reduce overhead at INFO level
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();

    let max_upload_bytes = state.settings.max_upload_bytes;

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        // Multipart bodies carry image uploads; replace axum's default
        // body limit with the configured one
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // In dev mode, use longer preflight cache to reduce OPTIONS requests
    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .allow_credentials(true)
        .max_age(max_age)
}
