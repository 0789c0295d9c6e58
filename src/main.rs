use anyhow::Context;
use dotenvy::dotenv;
use movies_backend::config::settings::AppConfig;
use movies_backend::infrastructure::db::pool;
use movies_backend::modules::movie::repository::PgMovieRepository;
use movies_backend::state::AppState;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("Missing required environment variable")?;

    let db = pool::connect_to_db(&config.database_url).await?;
    pool::run_migrations(&db).await?;

    let state = AppState::new(config, Arc::new(PgMovieRepository::new(db)));
    state.photos.ensure_dir().await?;
    info!("Storing photos in {}", state.photos.dir().display());

    let port = state.config.server_port;
    let app = movies_backend::app::create_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
