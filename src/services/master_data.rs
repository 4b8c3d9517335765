use std::collections::HashMap;
use std::path::PathBuf;

use crate::models::{
    history::ItemId,
    item::{ItemNames, NameMap, RequirementMap},
};

pub const REQUIREMENTS_FILE: &str = "RetainerTaskNormal.csv";
pub const ITEM_NAMES_FILE: &str = "item_id.json";

/// Rows before the data in the venture table: key row, `#` header row, type row
const REQUIREMENT_PREAMBLE_ROWS: usize = 3;
const REQUIREMENT_ITEM_COLUMN: usize = 1;
const REQUIREMENT_QUANTITY_COLUMN: usize = 5;

/// Loads the static item master files (venture quantities and item names)
#[derive(Debug, Clone)]
pub struct MasterDataService {
    data_dir: PathBuf,
}

impl MasterDataService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Item id -> retainer venture quantity
    pub async fn load_requirements(
        &self,
    ) -> Result<RequirementMap, Box<dyn std::error::Error + Send + Sync>> {
        let path = self.data_dir.join(REQUIREMENTS_FILE);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        let requirements = parse_requirements_csv(&text)?;

        tracing::info!(
            "Loaded {} retainer items from {}",
            requirements.len(),
            path.display()
        );

        Ok(requirements)
    }

    /// Item id -> localized names
    pub async fn load_item_names(&self) -> Result<NameMap, Box<dyn std::error::Error + Send + Sync>> {
        let path = self.data_dir.join(ITEM_NAMES_FILE);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        let names = parse_item_names_json(&text)?;

        tracing::info!("Loaded {} item names from {}", names.len(), path.display());

        Ok(names)
    }
}

/// Parse the venture table. Rows with a missing or non-positive quantity are skipped.
pub fn parse_requirements_csv(
    text: &str,
) -> Result<RequirementMap, Box<dyn std::error::Error + Send + Sync>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut requirements = RequirementMap::new();
    let mut skipped = 0usize;

    for record in reader.records().skip(REQUIREMENT_PREAMBLE_ROWS) {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let item_id = record
            .get(REQUIREMENT_ITEM_COLUMN)
            .and_then(|v| v.trim().parse::<ItemId>().ok());
        let quantity = record
            .get(REQUIREMENT_QUANTITY_COLUMN)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&q| q > 0)
            .and_then(|q| u32::try_from(q).ok());

        match (item_id, quantity) {
            (Some(item_id), Some(quantity)) => {
                requirements.insert(item_id, quantity);
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} venture rows without an item quantity", skipped);
    }

    Ok(requirements)
}

/// Parse the item name master: `{"<id>": {"ja": "...", "en": "..."}}`
pub fn parse_item_names_json(text: &str) -> Result<NameMap, Box<dyn std::error::Error + Send + Sync>> {
    let raw: HashMap<String, ItemNames> = serde_json::from_str(text)?;

    let names = raw
        .into_iter()
        .filter_map(|(key, names)| key.trim().parse::<ItemId>().ok().map(|id| (id, names)))
        .collect();

    Ok(names)
}
