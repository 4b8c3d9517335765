use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::time::{sleep, Duration};

use crate::models::history::{HistoryMap, ItemId, WorldId};

/// Anything that can return the trade history for a batch of items
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history_batch(
        &self,
        item_ids: &[ItemId],
        world_id: WorldId,
    ) -> Result<HistoryMap, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Item ids per request
    pub batch_size: usize,
    /// Requests in flight per window
    pub max_concurrent: usize,
    /// Pause between windows, for the upstream rate limit
    pub window_delay: Duration,
    /// Extra attempts for a failed batch. 0 = no retry.
    pub max_retries: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_concurrent: 8,
            window_delay: Duration::from_millis(100),
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub histories: HistoryMap,
    pub batches_total: usize,
    pub batches_failed: usize,
    /// Ids from failed batches, in input order. These were not evaluated.
    pub failed_ids: Vec<ItemId>,
}

/// Split ids into consecutive batches of `batch_size` (last one may be shorter)
pub fn partition(item_ids: &[ItemId], batch_size: usize) -> Vec<Vec<ItemId>> {
    item_ids
        .chunks(batch_size.max(1))
        .map(<[ItemId]>::to_vec)
        .collect()
}

/// Fetch history for every id, `max_concurrent` batches at a time.
///
/// Each window is joined in full before the next starts, so at most
/// `max_concurrent` requests are ever outstanding. A failed batch is logged
/// and skipped; it never aborts its siblings or later windows.
pub async fn fetch_all_histories<S>(
    source: &S,
    item_ids: &[ItemId],
    world_id: WorldId,
    settings: &FetchSettings,
) -> FetchOutcome
where
    S: HistorySource + ?Sized,
{
    let batches = partition(item_ids, settings.batch_size);
    let window_size = settings.max_concurrent.max(1);
    let window_count = batches.len().div_ceil(window_size);

    tracing::info!(
        "Fetching history for {} items in {} batches ({} windows of up to {}) on world {}",
        item_ids.len(),
        batches.len(),
        window_count,
        window_size,
        world_id
    );

    let mut outcome = FetchOutcome {
        batches_total: batches.len(),
        ..Default::default()
    };

    for (window_idx, window) in batches.chunks(window_size).enumerate() {
        tracing::debug!(
            "Window {}/{}: {} batches",
            window_idx + 1,
            window_count,
            window.len()
        );

        let requests = window.iter().enumerate().map(|(offset, batch)| {
            let batch_no = window_idx * window_size + offset + 1;
            fetch_batch(source, batch, world_id, settings.max_retries, batch_no)
        });

        let results = join_all(requests).await;

        for (batch, result) in window.iter().zip(results) {
            match result {
                Some(histories) => outcome.histories.extend(histories),
                None => {
                    outcome.batches_failed += 1;
                    outcome.failed_ids.extend_from_slice(batch);
                }
            }
        }

        if window_idx + 1 < window_count {
            sleep(settings.window_delay).await;
        }
    }

    tracing::info!(
        "Fetched history for {} items | batches: {} ok, {} failed ({} items not fetched)",
        outcome.histories.len(),
        outcome.batches_total - outcome.batches_failed,
        outcome.batches_failed,
        outcome.failed_ids.len()
    );

    outcome
}

/// One batch, retried up to `max_retries` times. `None` when every attempt failed.
async fn fetch_batch<S>(
    source: &S,
    batch: &[ItemId],
    world_id: WorldId,
    max_retries: u32,
    batch_no: usize,
) -> Option<HistoryMap>
where
    S: HistorySource + ?Sized,
{
    for attempt in 0..=max_retries {
        match source.fetch_history_batch(batch, world_id).await {
            Ok(histories) => return Some(histories),
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch history batch {} ({} items, attempt {}/{}): {}",
                    batch_no,
                    batch.len(),
                    attempt + 1,
                    max_retries + 1,
                    e
                );
            }
        }
    }

    None
}
