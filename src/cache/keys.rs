//! Cache key derivation.
//!
//! Every key lives under the `menu:` namespace so bulk invalidation is a
//! single prefix delete. Filtered-view keys are derived from a canonical
//! rendering of the filter spec: sorted object keys, sorted + deduplicated
//! multi-select sets, inactive dimensions omitted. Two requests describing
//! the same logical filter therefore share one cache entry regardless of
//! parameter order or string-vs-array encoding.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::filter::FilterSpec;

pub const MENU_NAMESPACE: &str = "menu:";
pub const FULL_MENU_KEY: &str = "menu:full";
pub const FILTER_OPTIONS_KEY: &str = "menu:filter-options";

/// Derive the cache key for a filtered view of the menu.
pub fn filtered_menu_key(spec: &FilterSpec) -> String {
    let canonical = canonical_json(spec);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("menu:filtered:{}", hex::encode(hasher.finalize()))
}

fn canonical_json(spec: &FilterSpec) -> String {
    let mut map = BTreeMap::new();

    if let Some(level) = spec.spice_level {
        map.insert("spiceLevel", Value::from(level));
    }
    if let Some(range) = &spec.calorie_range {
        map.insert("calorieRange", Value::from(range.clone()));
    }
    insert_set(&mut map, "categories", &spec.categories);
    insert_set(&mut map, "dishTypes", &spec.dish_types);
    insert_set(&mut map, "allergens", &spec.allergens);

    // BTreeMap iteration order makes the rendering key-sorted.
    let object: serde_json::Map<String, Value> = map
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Value::Object(object).to_string()
}

fn insert_set(map: &mut BTreeMap<&'static str, Value>, key: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    let mut sorted: Vec<String> = values.to_vec();
    sorted.sort();
    sorted.dedup();
    map.insert(key, Value::from(sorted));
}
