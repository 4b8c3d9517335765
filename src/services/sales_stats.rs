use rust_decimal::Decimal;

use crate::models::history::HistoryEntry;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Aggregated sales over a set of trades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesSummary {
    pub total_qty: u64,
    pub total_sale_value: Decimal,
    /// Volume-weighted average unit price, zero when nothing sold
    pub avg_price: Decimal,
    pub trade_count: usize,
}

/// Keep only trades newer than `now - window_days` days.
///
/// Input order is not assumed; retained entries keep their relative order.
pub fn filter_recent(entries: &[HistoryEntry], window_days: u32, now: i64) -> Vec<HistoryEntry> {
    let threshold = now - i64::from(window_days) * SECONDS_PER_DAY;
    entries
        .iter()
        .filter(|entry| entry.timestamp > threshold)
        .copied()
        .collect()
}

/// Totals and volume-weighted average over `entries`.
///
/// `None` when the quantity or sale value sum leaves the representable range.
pub fn aggregate(entries: &[HistoryEntry]) -> Option<SalesSummary> {
    let mut total_qty = 0u64;
    let mut total_sale_value = Decimal::ZERO;

    for entry in entries {
        total_qty = total_qty.checked_add(entry.quantity)?;
        let trade_value = Decimal::from(entry.quantity).checked_mul(entry.price_per_unit)?;
        total_sale_value = total_sale_value.checked_add(trade_value)?;
    }

    let avg_price = if total_qty > 0 {
        total_sale_value.checked_div(Decimal::from(total_qty))?
    } else {
        Decimal::ZERO
    };

    Some(SalesSummary {
        total_qty,
        total_sale_value,
        avg_price,
        trade_count: entries.len(),
    })
}
