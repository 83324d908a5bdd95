use serde::Serialize;
use serde_json::Value;

/// Serialize a value to JSON with object keys sorted recursively.
///
/// Used wherever a serialized value doubles as a lookup key (cache keys in
/// particular): two structurally equal values always produce the same
/// string, independent of field or map iteration order.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    Ok(sort_keys(value).to_string())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = serde_json::Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": {"d": 2, "c": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": {"c": 3, "d": 2}, "b": 1}"#).unwrap();
        assert_eq!(
            to_canonical_string(&a).unwrap(),
            to_canonical_string(&b).unwrap()
        );
    }

    #[test]
    fn arrays_keep_element_order() {
        let value: Value = serde_json::from_str(r#"{"items": [3, 1, 2]}"#).unwrap();
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            r#"{"items":[3,1,2]}"#
        );
    }
}
