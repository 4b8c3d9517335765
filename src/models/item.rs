use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::history::ItemId;

/// Localized display names from the item master
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemNames {
    #[serde(default)]
    pub ja: Option<String>,
    #[serde(default)]
    pub en: Option<String>,
}

/// Which localized name to show in rankings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameLanguage {
    #[default]
    Ja,
    En,
}

impl NameLanguage {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ja" => Some(NameLanguage::Ja),
            "en" => Some(NameLanguage::En),
            _ => None,
        }
    }
}

impl ItemNames {
    pub fn get(&self, language: NameLanguage) -> Option<&str> {
        let name = match language {
            NameLanguage::Ja => self.ja.as_deref(),
            NameLanguage::En => self.en.as_deref(),
        };
        name.filter(|n| !n.is_empty())
    }
}

/// Item id -> retainer venture quantity. Absent means no requirement (0).
pub type RequirementMap = HashMap<ItemId, u32>;

/// Item id -> localized names
pub type NameMap = HashMap<ItemId, ItemNames>;

/// Display name for an item, falling back to `ID:<n>`
pub fn resolve_item_name(names: &NameMap, item_id: ItemId, language: NameLanguage) -> String {
    names
        .get(&item_id)
        .and_then(|n| n.get(language))
        .map(str::to_string)
        .unwrap_or_else(|| format!("ID:{}", item_id))
}
