//! One-shot ranking export
//!
//! Runs the same calculation as GET /api/ranking and prints the JSON response
//! to stdout. Parameters come from the environment:
//!
//! * `RANKING_DAYS`, `RANKING_MIN_SALES`, `RANKING_TOP`, `RANKING_WORLD_ID`
//! * `RANKING_RETAINER_CHECK` - "true" to keep only retainer items
//! * `RANKING_SORT` - value | price | sales
//! * `RANKING_LANG` - ja | en

use dotenvy::dotenv;
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use retainer_ranking_backend::config::AppConfig;
use retainer_ranking_backend::models::ranking::RankingQuery;
use retainer_ranking_backend::services::ranking_pipeline::run_ranking;
use retainer_ranking_backend::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenv().ok();

    let query = RankingQuery {
        days: env::var("RANKING_DAYS").ok(),
        min_sales: env::var("RANKING_MIN_SALES").ok(),
        top: env::var("RANKING_TOP").ok(),
        world_id: env::var("RANKING_WORLD_ID").ok(),
        retainer_check: env::var("RANKING_RETAINER_CHECK").ok(),
        sort: env::var("RANKING_SORT").ok(),
        lang: env::var("RANKING_LANG").ok(),
    };

    let config = AppConfig::from_env();
    let params = query.resolve(config.default_world_id);
    let state = AppState::from_config(config)?;

    let response = run_ranking(&state, &params).await?;

    tracing::info!(
        "Snapshot complete: {} returned of {} matched ({} items not fetched)",
        response.metadata.returned,
        response.metadata.total_matched,
        response.metadata.total_not_fetched
    );

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
