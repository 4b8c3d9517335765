use chrono::Utc;

use crate::models::{
    history::ItemId,
    item::{NameMap, RequirementMap},
    ranking::{RankingMetadata, RankingParameters, RankingResponse},
};
use crate::services::{
    batch_fetcher::{fetch_all_histories, FetchOutcome},
    ranking::rank_items,
};
use crate::AppState;

/// Load master data and the catalog, fetch histories, rank.
///
/// Failing to load the catalog or either master file fails the whole request;
/// failed history batches only reduce what gets ranked.
pub async fn run_ranking(
    state: &AppState,
    params: &RankingParameters,
) -> Result<RankingResponse, Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!(
        days = params.days,
        min_sales_per_day = params.min_sales_per_day,
        top_n = params.top_n,
        world_id = params.world_id,
        restrict_to_required = params.restrict_to_required,
        sort_metric = ?params.sort_metric,
        "Starting ranking calculation"
    );

    let catalog = async {
        state.universalis.fetch_marketable_ids().await.map_err(
            |e| -> Box<dyn std::error::Error + Send + Sync> {
                format!("Failed to fetch marketable item ids: {}", e).into()
            },
        )
    };

    let (requirements, names, marketable_ids) = tokio::try_join!(
        state.master_data.load_requirements(),
        state.master_data.load_item_names(),
        catalog,
    )?;

    tracing::info!(
        "Loaded: {} retainer items, {} item names, {} marketable items",
        requirements.len(),
        names.len(),
        marketable_ids.len()
    );

    let max_items = state.config.max_items;
    let target_ids = &marketable_ids[..marketable_ids.len().min(max_items)];

    let outcome = fetch_all_histories(
        &state.universalis,
        target_ids,
        params.world_id,
        &state.config.fetch,
    )
    .await;

    let response = build_response(
        target_ids,
        outcome,
        &requirements,
        &names,
        params,
        max_items,
        Utc::now().timestamp(),
    );

    tracing::info!(
        "Returning top {} items ({} matched)",
        response.metadata.returned,
        response.metadata.total_matched
    );

    Ok(response)
}

/// Rank a finished fetch and attach the request counts
pub fn build_response(
    target_ids: &[ItemId],
    outcome: FetchOutcome,
    requirements: &RequirementMap,
    names: &NameMap,
    params: &RankingParameters,
    max_items: usize,
    now: i64,
) -> RankingResponse {
    let ranked = rank_items(&outcome.histories, requirements, names, params, now);

    let metadata = RankingMetadata {
        total_evaluated: target_ids.len(),
        total_fetched: outcome.histories.len(),
        total_not_fetched: outcome.failed_ids.len(),
        batches_failed: outcome.batches_failed,
        total_matched: ranked.total_matched,
        returned: ranked.records.len(),
        max_items,
        parameters: params.clone(),
    };

    RankingResponse {
        success: true,
        data: ranked.records,
        metadata,
    }
}
