mod api;
mod app;
mod config;
mod db;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;

use services::{CaptureDevice, Coordinator, EncodingClient, PgProfileStore, SupabaseStorage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting facedeck backend"
    );

    // Create database pool and apply migrations
    let pool = db::create_pool(&settings).await?;
    sqlx::migrate!().run(&pool).await?;

    // Storage client for profile images
    let storage = SupabaseStorage::new(
        &settings.supabase_url,
        &settings.supabase_service_role_key,
        &settings.storage_bucket,
    )?;

    // Face encoding provider client
    let encoder = EncodingClient::new(
        settings.face_api_url.as_deref(),
        settings.face_api_key.as_deref(),
        settings.face_api_timeout_seconds,
    )?;

    // Optionally check provider health (non-blocking)
    if encoder.is_configured() {
        tokio::spawn({
            let encoder = encoder.clone();
            async move {
                match encoder.health_check().await {
                    Ok(()) => tracing::info!("Face encoding service is healthy"),
                    Err(e) => tracing::warn!(error = %e,
                        "Face encoding service health check failed - will retry on first request"),
                }
            }
        });
    }

    let store = PgProfileStore::new(pool.clone());
    let coordinator = Coordinator::new(
        store.clone(),
        storage,
        encoder.clone(),
        settings.upload_failure_policy,
        settings.encoding_failure_policy,
    );
    let capture = CaptureDevice::new();

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), store, encoder, coordinator, capture);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
