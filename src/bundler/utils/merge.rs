//! Recursive merge of JSON trees.
//!
//! Used to lay user DMG overrides over the built-in layout:
//! - Objects: merged key by key, recursively
//! - Arrays: replaced (overlay wins entirely)
//! - Scalars and `null`: replaced (overlay wins)

use serde_json::Value;

/// Deep merge `overlay` into `base`, last writer wins per leaf key.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
