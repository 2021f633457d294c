use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sharebox::config::AppConfig;
use sharebox::db;
use sharebox::handlers;
use sharebox::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        database = %config.database_url,
        default_page_size = config.default_page_size,
        max_page_size = config.max_page_size,
        "loaded configuration"
    );

    let conn = db::init_db(&config.database_url)?;
    let addr = format!("0.0.0.0:{}", config.port);

    let state = Arc::new(AppState::new(conn, config));

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
