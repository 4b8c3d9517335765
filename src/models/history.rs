use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Market-board item identifier
pub type ItemId = u32;

/// World (server) selector passed to the history endpoint
pub type WorldId = u32;

/// One completed trade as reported by Universalis
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: i64, // Unix seconds
    pub quantity: u64,
    pub price_per_unit: Decimal,
}

/// Trade history for a single item. Entries are not guaranteed to be sorted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemHistory {
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

/// Item id -> history, only for items whose batch was fetched successfully.
/// Ordered by id so downstream iteration is deterministic.
pub type HistoryMap = BTreeMap<ItemId, ItemHistory>;

/// Body of GET /history/{world}/{ids}
///
/// Universalis answers a multi-id request with an `items` object keyed by the
/// stringified id, but a single-id request with the item itself. The shape is
/// picked from the top-level keys; a body with neither `itemID` nor `items`
/// is an error.
#[derive(Debug)]
pub enum HistoryResponse {
    Single {
        item_id: ItemId,
        entries: Vec<HistoryEntry>,
    },
    Multi {
        items: BTreeMap<String, ItemHistory>,
    },
}

#[derive(Deserialize)]
struct SingleItemBody {
    #[serde(rename = "itemID")]
    item_id: ItemId,
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

#[derive(Deserialize)]
struct MultiItemBody {
    items: BTreeMap<String, ItemHistory>,
}

impl<'de> Deserialize<'de> for HistoryResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let body = Map::<String, Value>::deserialize(deserializer)?;

        if body.contains_key("itemID") {
            let single: SingleItemBody =
                serde_json::from_value(Value::Object(body)).map_err(de::Error::custom)?;
            Ok(HistoryResponse::Single {
                item_id: single.item_id,
                entries: single.entries,
            })
        } else if body.contains_key("items") {
            let multi: MultiItemBody =
                serde_json::from_value(Value::Object(body)).map_err(de::Error::custom)?;
            Ok(HistoryResponse::Multi { items: multi.items })
        } else {
            Err(de::Error::custom(
                "history body has neither `itemID` nor `items`",
            ))
        }
    }
}

impl HistoryResponse {
    /// Converts the wire shape into a `HistoryMap`, skipping keys that are not item ids
    pub fn into_history_map(self) -> HistoryMap {
        match self {
            HistoryResponse::Single { item_id, entries } => {
                let mut map = HistoryMap::new();
                map.insert(item_id, ItemHistory { entries });
                map
            }
            HistoryResponse::Multi { items } => items
                .into_iter()
                .filter_map(|(key, history)| match key.trim().parse::<ItemId>() {
                    Ok(item_id) => Some((item_id, history)),
                    Err(_) => {
                        tracing::warn!("Skipping history with non-numeric item key '{}'", key);
                        None
                    }
                })
                .collect(),
        }
    }
}
