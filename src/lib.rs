// src/lib.rs

use std::sync::Arc;

use config::AppConfig;
use services::{
    master_data::MasterDataService,
    universalis::{UniversalisError, UniversalisService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub universalis: UniversalisService,
    pub master_data: MasterDataService,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self, UniversalisError> {
        let universalis = UniversalisService::new(
            config.universalis_base_url.clone(),
            config.request_timeout,
            config.history_entries,
        )?;
        let master_data = MasterDataService::new(config.data_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            universalis,
            master_data,
        })
    }
}

pub mod config;

pub mod services {
    pub mod universalis;
    pub mod batch_fetcher;
    pub mod sales_stats;
    pub mod ranking;
    pub mod master_data;
    pub mod ranking_pipeline;
}

pub mod models;
pub mod handlers;
