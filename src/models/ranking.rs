use serde::{Deserialize, Serialize};

use crate::models::{
    history::{ItemId, WorldId},
    item::NameLanguage,
};

pub const DEFAULT_DAYS: u32 = 5;
pub const DEFAULT_MIN_SALES_PER_DAY: u32 = 10;
pub const DEFAULT_TOP_N: usize = 30;

/// Query parameters for GET /api/ranking
///
/// Everything is taken as a raw string so that a missing or unparsable value
/// falls back to its default instead of rejecting the request. Negative
/// counts are clamped to zero rather than replaced by the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingQuery {
    pub days: Option<String>,
    #[serde(rename = "minSales")]
    pub min_sales: Option<String>,
    pub top: Option<String>,
    #[serde(rename = "worldId")]
    pub world_id: Option<String>,
    pub retainer_check: Option<String>, // "true" restricts to retainer items
    pub sort: Option<String>,           // value | price | sales
    pub lang: Option<String>,           // ja | en
}

/// Ranking sort key. Always descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortMetric {
    #[default]
    EstimatedValue,
    AvgPrice,
    TotalQty,
}

impl SortMetric {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "estimatedvalue" | "estimated_value" | "value" => Some(SortMetric::EstimatedValue),
            "avgprice" | "avg_price" | "price" => Some(SortMetric::AvgPrice),
            "totalqty" | "total_qty" | "sales" => Some(SortMetric::TotalQty),
            _ => None,
        }
    }
}

/// Resolved ranking options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingParameters {
    pub days: u32,
    pub min_sales_per_day: u32,
    pub top_n: usize,
    pub world_id: WorldId,
    pub restrict_to_required: bool,
    pub sort_metric: SortMetric,
    pub language: NameLanguage,
}

impl RankingParameters {
    pub fn with_world(world_id: WorldId) -> Self {
        Self {
            days: DEFAULT_DAYS,
            min_sales_per_day: DEFAULT_MIN_SALES_PER_DAY,
            top_n: DEFAULT_TOP_N,
            world_id,
            restrict_to_required: false,
            sort_metric: SortMetric::default(),
            language: NameLanguage::default(),
        }
    }

    /// Total quantity an item must have sold inside the window
    pub fn min_total_sales(&self) -> u64 {
        u64::from(self.min_sales_per_day) * u64::from(self.days)
    }
}

impl RankingQuery {
    /// Applies defaults for anything missing or unparsable
    pub fn resolve(&self, default_world_id: WorldId) -> RankingParameters {
        let defaults = RankingParameters::with_world(default_world_id);

        RankingParameters {
            days: parse_count_or(self.days.as_deref(), defaults.days, u32::MAX),
            min_sales_per_day: parse_count_or(
                self.min_sales.as_deref(),
                defaults.min_sales_per_day,
                u32::MAX,
            ),
            top_n: parse_count_or(self.top.as_deref(), defaults.top_n, usize::MAX),
            world_id: parse_or(self.world_id.as_deref(), defaults.world_id),
            restrict_to_required: self.retainer_check.as_deref() == Some("true"),
            sort_metric: self
                .sort
                .as_deref()
                .and_then(SortMetric::from_str)
                .unwrap_or(defaults.sort_metric),
            language: self
                .lang
                .as_deref()
                .and_then(NameLanguage::from_str)
                .unwrap_or(defaults.language),
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<&str>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Signed parse for counts: negatives become 0, values past `max` saturate
fn parse_count_or<T: TryFrom<u64>>(value: Option<&str>, default: T, max: T) -> T {
    match value.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(n) => T::try_from(n.max(0).unsigned_abs()).unwrap_or(max),
        None => default,
    }
}

/// One ranked item
///
/// `avg_price` and `total_sale_value` are unrounded; only `estimated_value`
/// is rounded to a whole number (halves away from zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub item_id: ItemId,
    pub item_name: String,
    pub required_qty: u32,
    pub avg_price: f64,
    pub total_qty: u64,
    pub total_sale_value: f64,
    pub trade_count: usize,
    pub estimated_value: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingMetadata {
    pub total_evaluated: usize,
    pub total_fetched: usize,
    pub total_not_fetched: usize,
    pub batches_failed: usize,
    pub total_matched: usize,
    pub returned: usize,
    pub max_items: usize,
    pub parameters: RankingParameters,
}

/// Response structure for GET /api/ranking
#[derive(Debug, Clone, Serialize)]
pub struct RankingResponse {
    pub success: bool,
    pub data: Vec<RankingRecord>,
    pub metadata: RankingMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
