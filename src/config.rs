//! Runtime configuration
//!
//! Every value comes from the environment (optionally via `.env`) and falls
//! back to a default when missing or unparsable.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::history::WorldId;
use crate::services::{batch_fetcher::FetchSettings, universalis::DEFAULT_BASE_URL};

const ENV_BIND_ADDR: &str = "BIND_ADDR";
const ENV_UNIVERSALIS_BASE_URL: &str = "UNIVERSALIS_BASE_URL";
const ENV_DATA_DIR: &str = "DATA_DIR";
const ENV_DEFAULT_WORLD_ID: &str = "DEFAULT_WORLD_ID";
const ENV_BATCH_SIZE: &str = "FETCH_BATCH_SIZE";
const ENV_MAX_CONCURRENT: &str = "FETCH_MAX_CONCURRENT";
const ENV_WINDOW_DELAY_MS: &str = "FETCH_WINDOW_DELAY_MS";
const ENV_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
const ENV_MAX_RETRIES: &str = "FETCH_MAX_RETRIES";
const ENV_HISTORY_ENTRIES: &str = "HISTORY_ENTRIES";
const ENV_MAX_ITEMS: &str = "RANKING_MAX_ITEMS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATA_DIR: &str = "public/data";
/// Ixion
const DEFAULT_WORLD: WorldId = 48;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HISTORY_ENTRIES: u32 = 500;
const DEFAULT_MAX_ITEMS: usize = 300_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub universalis_base_url: String,
    pub data_dir: PathBuf,
    /// World used when a request does not name one
    pub default_world_id: WorldId,
    pub fetch: FetchSettings,
    pub request_timeout: Duration,
    pub history_entries: u32,
    /// Upper bound on catalog ids considered per ranking
    pub max_items: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let fetch_defaults = FetchSettings::default();

        Self {
            bind_addr: lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            universalis_base_url: lookup(ENV_UNIVERSALIS_BASE_URL)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            data_dir: lookup(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            default_world_id: parsed(ENV_DEFAULT_WORLD_ID)
                .and_then(|v| WorldId::try_from(v).ok())
                .unwrap_or(DEFAULT_WORLD),
            fetch: FetchSettings {
                batch_size: parsed(ENV_BATCH_SIZE)
                    .map(|v| v as usize)
                    .unwrap_or(fetch_defaults.batch_size),
                max_concurrent: parsed(ENV_MAX_CONCURRENT)
                    .map(|v| v as usize)
                    .unwrap_or(fetch_defaults.max_concurrent),
                window_delay: parsed(ENV_WINDOW_DELAY_MS)
                    .map(Duration::from_millis)
                    .unwrap_or(fetch_defaults.window_delay),
                max_retries: parsed(ENV_MAX_RETRIES)
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(fetch_defaults.max_retries),
            },
            request_timeout: Duration::from_secs(
                parsed(ENV_TIMEOUT_SECS).unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            history_entries: parsed(ENV_HISTORY_ENTRIES)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_HISTORY_ENTRIES),
            max_items: parsed(ENV_MAX_ITEMS)
                .map(|v| v as usize)
                .unwrap_or(DEFAULT_MAX_ITEMS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.universalis_base_url, "https://universalis.app/api/v2");
        assert_eq!(config.data_dir, PathBuf::from("public/data"));
        assert_eq!(config.default_world_id, 48);
        assert_eq!(config.fetch, FetchSettings::default());
        assert_eq!(config.fetch.batch_size, 100);
        assert_eq!(config.fetch.max_concurrent, 8);
        assert_eq!(config.fetch.window_delay, Duration::from_millis(100));
        assert_eq!(config.fetch.max_retries, 0);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.history_entries, 500);
        assert_eq!(config.max_items, 300_000);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BATCH_SIZE, "50"),
            (ENV_MAX_CONCURRENT, "4"),
            (ENV_WINDOW_DELAY_MS, "250"),
            (ENV_MAX_RETRIES, "2"),
            (ENV_DEFAULT_WORLD_ID, "forty-five"),
            (ENV_DATA_DIR, "/srv/data"),
        ]);

        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.fetch.batch_size, 50);
        assert_eq!(config.fetch.max_concurrent, 4);
        assert_eq!(config.fetch.window_delay, Duration::from_millis(250));
        assert_eq!(config.fetch.max_retries, 2);
        assert_eq!(config.default_world_id, 48);
        assert_eq!(config.data_dir, PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_env_var_names() {
        assert_eq!(ENV_BATCH_SIZE, "FETCH_BATCH_SIZE");
        assert_eq!(ENV_MAX_CONCURRENT, "FETCH_MAX_CONCURRENT");
        assert_eq!(ENV_WINDOW_DELAY_MS, "FETCH_WINDOW_DELAY_MS");
        assert_eq!(ENV_MAX_ITEMS, "RANKING_MAX_ITEMS");
    }
}
