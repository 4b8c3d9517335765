use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    models::ranking::{ErrorResponse, RankingQuery, RankingResponse},
    services::ranking_pipeline::run_ranking,
    AppState,
};

/// Handler for GET /api/ranking
/// Ranks marketable items by recent sales on one world
pub async fn get_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<RankingResponse>, (StatusCode, Json<ErrorResponse>)> {
    let params = query.resolve(state.config.default_world_id);

    match run_ranking(&state, &params).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Ranking failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}

pub async fn health() -> &'static str {
    "Retainer ranking backend is running"
}
