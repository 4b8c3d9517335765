use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod ranking;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ranking::health))
        .route("/api/ranking", get(ranking::get_ranking))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
