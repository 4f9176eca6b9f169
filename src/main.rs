use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pitchbook::config::AppConfig;
use pitchbook::db;
use pitchbook::handlers;
use pitchbook::services::notifications::LogNotifier;
use pitchbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier: Box::new(LogNotifier),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/pitches/:id/slots",
            get(handlers::availability::get_slots),
        )
        .route(
            "/api/pitches/:id/settings",
            post(handlers::pitches::update_settings),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/:id/status",
            post(handlers::bookings::update_status),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/:id/cancel-request",
            post(handlers::bookings::request_cancellation),
        )
        .route(
            "/api/bookings/:id/modify",
            post(handlers::bookings::modify_booking),
        )
        .route(
            "/api/bookings/:id/modification/approve",
            post(handlers::bookings::approve_modification),
        )
        .route(
            "/api/bookings/:id/modification/reject",
            post(handlers::bookings::reject_modification),
        )
        .route(
            "/api/complexes/:id/bookings",
            get(handlers::complexes::get_bookings),
        )
        .route(
            "/api/complexes/:id/stats",
            get(handlers::complexes::get_statistics),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
