//! JSON tree merging used for configuration defaults and per-call overrides

use serde_json::{Map, Value};

/// Recursively merge `overlay` into `base`
///
/// Objects are merged key by key; any other overlay value (including arrays)
/// replaces the base value. `null` in the overlay leaves the base untouched.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Replace values in `target` for every key that also appears in `overrides`
///
/// Keys only present in `overrides` are ignored.
pub fn override_existing(target: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in target.iter_mut() {
        if let Some(replacement) = overrides.get(key) {
            *value = replacement.clone();
        }
    }
}

/// Shallow-extend `target` with every entry of `source`, `source` winning
pub fn extend(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}
