//! Typed decoding of store snapshots.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Decode every child of an object snapshot, in the store's key order.
///
/// Children that fail to decode are skipped with a warning so one damaged
/// entry cannot hide the rest.
pub fn children<T: DeserializeOwned>(value: Option<Value>, path: &str) -> Vec<(String, T)> {
    let Some(Value::Object(map)) = value else {
        return Vec::new();
    };
    map.into_iter()
        .filter_map(|(key, child)| match serde_json::from_value::<T>(child) {
            Ok(item) => Some((key, item)),
            Err(e) => {
                warn!(path = %path, key = %key, error = %e, "Skipping malformed entry");
                None
            }
        })
        .collect()
}
