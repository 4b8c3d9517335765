use std::path::Path;
use std::time::Duration;

use retainer_ranking_backend::config::AppConfig;
use retainer_ranking_backend::services::batch_fetcher::FetchSettings;
use retainer_ranking_backend::AppState;

/// Venture table with quantities for items 1 (5) and 3 (2)
pub const VENTURES_CSV: &str = "\
key,0,1,2,3,4,5
#,Item,Quantity[0],Quantity[1],Quantity[2],Quantity[3],Quantity[4]
int32,Item,uint16,uint16,uint16,uint16,uint16
1,1,1,1,1,5,5
2,3,1,1,1,2,2
";

pub const ITEM_NAMES_JSON: &str = r#"{
    "1": {"ja": "鉄鉱", "en": "Iron Ore"},
    "2": {"ja": "銅鉱", "en": "Copper Ore"}
}"#;

/// Write both master data files into `dir`
pub fn write_master_data(dir: &Path) {
    std::fs::write(dir.join("RetainerTaskNormal.csv"), VENTURES_CSV).unwrap();
    std::fs::write(dir.join("item_id.json"), ITEM_NAMES_JSON).unwrap();
}

/// App state pointing at a mock Universalis and a local data dir
pub fn test_state(base_url: &str, data_dir: &Path) -> AppState {
    let config = AppConfig {
        universalis_base_url: base_url.to_string(),
        data_dir: data_dir.to_path_buf(),
        fetch: FetchSettings {
            batch_size: 2,
            max_concurrent: 2,
            window_delay: Duration::from_millis(1),
            max_retries: 0,
        },
        request_timeout: Duration::from_secs(5),
        ..AppConfig::default()
    };

    AppState::from_config(config).expect("Failed to build test state")
}
