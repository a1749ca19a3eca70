//! Lenient field decoding for backend payloads: `null` or an unexpected
//! shape falls back to the default instead of failing the whole response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Any value -> `T`, `T::default()` when it does not fit
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Strings as is, numbers and booleans as text, anything else empty
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value).unwrap_or_default())
}

/// Like [`string`], but `None` for null, empty or non-scalar values
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value).filter(|s| !s.is_empty()))
}

/// Array elements that decode; `null` or a non-array gives an empty list
pub fn vec_skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "string")]
        name: String,
        #[serde(default, deserialize_with = "opt_string")]
        code: Option<String>,
        #[serde(default, deserialize_with = "or_default")]
        counts: HashMap<String, Value>,
        #[serde(default, deserialize_with = "vec_skip_invalid")]
        days: Vec<u8>,
    }

    #[test]
    fn test_null_and_wrong_shapes_fall_back() {
        let sample: Sample =
            serde_json::from_str(r#"{"name":null,"code":null,"counts":[],"days":null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.code, None);
        assert!(sample.counts.is_empty());
        assert!(sample.days.is_empty());
    }

    #[test]
    fn test_scalars_and_partial_arrays() {
        let sample: Sample =
            serde_json::from_str(r#"{"name":42,"code":"","days":[5,"x",6]}"#).unwrap();
        assert_eq!(sample.name, "42");
        assert_eq!(sample.code, None);
        assert_eq!(sample.days, vec![5, 6]);
    }
}
