use retainer_ranking_backend::{config::AppConfig, handlers, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,retainer_ranking_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    tracing::info!(
        universalis = %config.universalis_base_url,
        data_dir = %config.data_dir.display(),
        batch_size = config.fetch.batch_size,
        max_concurrent = config.fetch.max_concurrent,
        max_retries = config.fetch.max_retries,
        "Loaded configuration"
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::from_config(config)?;

    let app = handlers::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
