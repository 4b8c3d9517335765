use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::models::history::{HistoryMap, HistoryResponse, ItemId, WorldId};
use crate::services::batch_fetcher::HistorySource;

pub const DEFAULT_BASE_URL: &str = "https://universalis.app/api/v2";

const MARKETABLE_CACHE_KEY: &str = "marketable";

/// Upper bound on cached trade entries across all history batches
const HISTORY_CACHE_MAX_ENTRIES: u64 = 2_000_000;

#[derive(Debug, thiserror::Error)]
pub enum UniversalisError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Universalis API error {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the Universalis market board API
#[derive(Clone)]
pub struct UniversalisService {
    client: Client,
    base_url: String,
    entries_to_return: u32,
    marketable_cache: Arc<Cache<String, Vec<ItemId>>>,
    history_cache: Arc<Cache<String, HistoryMap>>,
}

impl UniversalisService {
    pub fn new(
        base_url: String,
        request_timeout: Duration,
        entries_to_return: u32,
    ) -> Result<Self, UniversalisError> {
        let marketable_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(3600)) // 1 hour TTL
            .build();

        let history_cache = Cache::builder()
            .max_capacity(HISTORY_CACHE_MAX_ENTRIES)
            .weigher(|_key: &String, histories: &HistoryMap| history_weight(histories))
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            entries_to_return,
            marketable_cache: Arc::new(marketable_cache),
            history_cache: Arc::new(history_cache),
        })
    }

    /// Fetch the ids of every item tradeable on the market board
    pub async fn fetch_marketable_ids(&self) -> Result<Vec<ItemId>, UniversalisError> {
        if let Some(cached) = self.marketable_cache.get(MARKETABLE_CACHE_KEY).await {
            tracing::debug!("Cache hit for marketable ids ({} items)", cached.len());
            return Ok(cached);
        }

        tracing::info!("Fetching marketable item ids from Universalis");

        let url = format!("{}/marketable", self.base_url);
        let body = self.get_body(&url, &[]).await?;

        let ids: Vec<Option<ItemId>> = serde_json::from_str(&body)?;
        let ids: Vec<ItemId> = ids.into_iter().flatten().collect();

        tracing::info!("Fetched {} marketable item ids", ids.len());

        self.marketable_cache
            .insert(MARKETABLE_CACHE_KEY.to_string(), ids.clone())
            .await;

        Ok(ids)
    }

    /// Fetch trade history for a batch of items on one world
    pub async fn fetch_history(
        &self,
        item_ids: &[ItemId],
        world_id: WorldId,
    ) -> Result<HistoryMap, UniversalisError> {
        let ids = item_ids
            .iter()
            .map(ItemId::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let cache_key = format!("{}_{}_{}", world_id, self.entries_to_return, ids);

        if let Some(cached) = self.history_cache.get(&cache_key).await {
            tracing::debug!("Cache hit for history batch of {} items", item_ids.len());
            return Ok(cached);
        }

        let url = format!("{}/history/{}/{}", self.base_url, world_id, ids);
        let entries = self.entries_to_return.to_string();
        let body = self
            .get_body(&url, &[("entriesToReturn", entries.as_str())])
            .await?;

        let response: HistoryResponse = serde_json::from_str(&body)?;
        let histories = response.into_history_map();

        tracing::debug!(
            "Fetched history for {}/{} items on world {}",
            histories.len(),
            item_ids.len(),
            world_id
        );

        self.history_cache.insert(cache_key, histories.clone()).await;

        Ok(histories)
    }

    async fn get_body(&self, url: &str, query: &[(&str, &str)]) -> Result<String, UniversalisError> {
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UniversalisError::Status { status, body });
        }

        Ok(response.text().await?)
    }
}

/// Cache weight of a history batch: one per trade entry, at least one per item
fn history_weight(histories: &HistoryMap) -> u32 {
    let weight: usize = histories
        .values()
        .map(|history| history.entries.len().max(1))
        .sum();
    u32::try_from(weight.max(1)).unwrap_or(u32::MAX)
}

#[async_trait]
impl HistorySource for UniversalisService {
    async fn fetch_history_batch(
        &self,
        item_ids: &[ItemId],
        world_id: WorldId,
    ) -> Result<HistoryMap, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.fetch_history(item_ids, world_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::batch_fetcher::{fetch_all_histories, FetchSettings};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> UniversalisService {
        UniversalisService::new(server.uri(), Duration::from_secs(5), 500).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_marketable_ids_drops_nulls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/marketable"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[2, null, 3, 5]"))
            .expect(1)
            .mount(&server)
            .await;

        let service = service(&server);

        assert_eq!(service.fetch_marketable_ids().await.unwrap(), vec![2, 3, 5]);
        // Second call is served from cache
        assert_eq!(service.fetch_marketable_ids().await.unwrap(), vec![2, 3, 5]);
    }

    #[tokio::test]
    async fn test_fetch_marketable_ids_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/marketable"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = service(&server).fetch_marketable_ids().await.unwrap_err();

        match err {
            UniversalisError::Status { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_history_multi() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/48/1,2"))
            .and(query_param("entriesToReturn", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"items": {
                    "1": {"entries": [{"pricePerUnit": 100, "quantity": 10, "timestamp": 1700000000}]},
                    "2": {"entries": []}
                }}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let service = service(&server);
        let histories = service.fetch_history(&[1, 2], 48).await.unwrap();

        assert_eq!(histories.len(), 2);
        assert_eq!(histories[&1].entries[0].quantity, 10);

        // Cached for the same batch
        let again = service.fetch_history(&[1, 2], 48).await.unwrap();
        assert_eq!(again, histories);
    }

    #[tokio::test]
    async fn test_fetch_history_single_item_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/45/9"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"itemID": 9, "entries": [{"pricePerUnit": 7, "quantity": 1, "timestamp": 1}]}"#,
            ))
            .mount(&server)
            .await;

        let histories = service(&server).fetch_history(&[9], 45).await.unwrap();

        assert_eq!(histories.keys().copied().collect::<Vec<_>>(), vec![9]);
    }

    #[tokio::test]
    async fn test_fetch_history_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/48/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = service(&server).fetch_history(&[1], 48).await.unwrap_err();

        assert!(matches!(err, UniversalisError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_history_error_object_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/48/1,2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error": "rate limited"}"#))
            .mount(&server)
            .await;

        let service = service(&server);
        let err = service.fetch_history(&[1, 2], 48).await.unwrap_err();
        assert!(matches!(err, UniversalisError::Decode(_)));

        let settings = FetchSettings {
            batch_size: 2,
            max_concurrent: 1,
            window_delay: Duration::from_millis(1),
            max_retries: 0,
        };
        let outcome = fetch_all_histories(&service, &[1, 2], 48, &settings).await;

        assert!(outcome.histories.is_empty());
        assert_eq!(outcome.failed_ids, vec![1, 2]);
    }

    #[test]
    fn test_history_weight_counts_entries() {
        use crate::models::history::{HistoryEntry, ItemHistory};

        let entry = HistoryEntry {
            timestamp: 1,
            quantity: 1,
            price_per_unit: rust_decimal::Decimal::ONE,
        };
        let mut histories = HistoryMap::new();
        histories.insert(1, ItemHistory { entries: vec![entry; 500] });
        histories.insert(2, ItemHistory::default());

        assert_eq!(history_weight(&histories), 501);
        assert_eq!(history_weight(&HistoryMap::new()), 1);
    }

    #[tokio::test]
    async fn test_fetch_history_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/48/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let service = UniversalisService::new(server.uri(), Duration::from_millis(50), 500).unwrap();
        let err = service.fetch_history(&[1], 48).await.unwrap_err();

        assert!(matches!(err, UniversalisError::Transport(_)));
    }

    #[tokio::test]
    async fn test_batch_fetch_against_server_isolates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/48/1,2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"items": {"1": {"entries": []}, "2": {"entries": []}}}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history/48/3,4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history/48/5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"itemID": 5, "entries": []}"#,
            ))
            .mount(&server)
            .await;

        let settings = FetchSettings {
            batch_size: 2,
            max_concurrent: 2,
            window_delay: Duration::from_millis(1),
            max_retries: 0,
        };
        let outcome = fetch_all_histories(&service(&server), &[1, 2, 3, 4, 5], 48, &settings).await;

        assert_eq!(outcome.histories.keys().copied().collect::<Vec<_>>(), vec![1, 2, 5]);
        assert_eq!(outcome.failed_ids, vec![3, 4]);
        assert_eq!(outcome.batches_failed, 1);
    }
}
