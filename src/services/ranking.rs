use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;

use crate::models::{
    history::HistoryMap,
    item::{resolve_item_name, NameMap, RequirementMap},
    ranking::{RankingParameters, RankingRecord, SortMetric},
};
use crate::services::sales_stats::{aggregate, filter_recent, SalesSummary};

/// Result of ranking one HistoryMap
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOutcome {
    /// Sorted and truncated to `top_n`
    pub records: Vec<RankingRecord>,
    /// Items that passed every filter, before truncation
    pub total_matched: usize,
}

pub fn meets_min_sales(summary: &SalesSummary, min_total_sales: u64) -> bool {
    summary.total_qty >= min_total_sales
}

/// With the restriction enabled, items without a retainer requirement are dropped
pub fn passes_requirement_gate(required_qty: u32, restrict_to_required: bool) -> bool {
    !restrict_to_required || required_qty > 0
}

/// Quantity used for valuation. Unrequired items are valued as a single unit.
pub fn effective_quantity(required_qty: u32) -> u32 {
    if required_qty > 0 { required_qty } else { 1 }
}

/// `round(avg_price * quantity)`, halves rounded away from zero
/// Saturates at `i64::MAX`.
pub fn estimate_value(avg_price: Decimal, quantity: u32) -> i64 {
    avg_price
        .checked_mul(Decimal::from(quantity))
        .and_then(|value| {
            value
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .unwrap_or(i64::MAX)
}

/// Ranks every item present in `histories`.
///
/// Items missing from `histories` were not fetched and are never ranked.
/// Ties keep ascending item id order.
pub fn rank_items(
    histories: &HistoryMap,
    requirements: &RequirementMap,
    names: &NameMap,
    params: &RankingParameters,
    now: i64,
) -> RankingOutcome {
    let min_total_sales = params.min_total_sales();
    let mut matched = Vec::new();

    for (&item_id, history) in histories {
        let recent = filter_recent(&history.entries, params.days, now);
        let Some(summary) = aggregate(&recent) else {
            tracing::warn!("Skipping item {}: sales totals out of range", item_id);
            continue;
        };

        if !meets_min_sales(&summary, min_total_sales) {
            continue;
        }

        let required_qty = requirements.get(&item_id).copied().unwrap_or(0);
        if !passes_requirement_gate(required_qty, params.restrict_to_required) {
            continue;
        }

        let estimated_value = estimate_value(summary.avg_price, effective_quantity(required_qty));

        matched.push(RankingRecord {
            item_id,
            item_name: resolve_item_name(names, item_id, params.language),
            required_qty,
            avg_price: summary.avg_price.to_f64().unwrap_or(0.0),
            total_qty: summary.total_qty,
            total_sale_value: summary.total_sale_value.to_f64().unwrap_or(0.0),
            trade_count: summary.trade_count,
            estimated_value,
        });
    }

    let total_matched = matched.len();

    sort_records(&mut matched, params.sort_metric);
    matched.truncate(params.top_n);

    tracing::debug!(
        "Ranked {} of {} fetched items, returning {}",
        total_matched,
        histories.len(),
        matched.len()
    );

    RankingOutcome {
        records: matched,
        total_matched,
    }
}

/// Stable descending sort on the selected metric
pub fn sort_records(records: &mut [RankingRecord], metric: SortMetric) {
    records.sort_by(|a, b| compare_desc(a, b, metric));
}

fn compare_desc(a: &RankingRecord, b: &RankingRecord, metric: SortMetric) -> Ordering {
    match metric {
        SortMetric::EstimatedValue => b.estimated_value.cmp(&a.estimated_value),
        SortMetric::AvgPrice => b.avg_price.total_cmp(&a.avg_price),
        SortMetric::TotalQty => b.total_qty.cmp(&a.total_qty),
    }
}
