use crate::errors::{DispatchError, DispatchResult};
use rand::Rng;
use schema::WeightedItem;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_count() -> u32 {
    1
}

/// A deserialized item payload, ready to hand to the host inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: String,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Host-specific data components, passed through untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub components: Map<String, Value>,
}

impl ItemStack {
    /// Parse a JSON item payload such as `{"id":"cobblemon:poke_ball","count":3}`.
    pub fn parse(payload: &str) -> DispatchResult<Self> {
        let stack: ItemStack = serde_json::from_str(payload)
            .map_err(|err| DispatchError::MalformedItem(err.to_string()))?;

        if stack.id.trim().is_empty() {
            return Err(DispatchError::MalformedItem("item id is empty".to_string()));
        }
        if stack.count == 0 {
            return Err(DispatchError::MalformedItem(format!(
                "item '{}' has a count of zero",
                stack.id
            )));
        }
        Ok(stack)
    }
}

/// Choose one payload variant with probability proportional to its weight.
/// Returns None when there is nothing with positive weight to choose from.
pub fn pick_weighted<'a, R: Rng + ?Sized>(
    items: &'a [WeightedItem],
    rng: &mut R,
) -> Option<&'a WeightedItem> {
    let total: u64 = items.iter().map(|item| u64::from(item.weight)).sum();
    if total == 0 {
        return None;
    }

    let target = rng.random_range(1..=total);
    let mut cumulative = 0u64;
    for item in items {
        cumulative += u64::from(item.weight);
        if target <= cumulative {
            return Some(item);
        }
    }
    None
}
