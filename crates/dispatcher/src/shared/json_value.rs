//! Coercions for loosely typed backend JSON.

use serde_json::Value;

/// Falsy: null, false, 0, NaN, ""
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric value of a scalar; None when not a finite number
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Non-negative count; anything unparsable counts as 0
pub fn as_count(value: &Value) -> u32 {
    as_number(value)
        .filter(|n| *n > 0.0)
        .map(|n| n as u32)
        .unwrap_or(0)
}

/// First truthy value among candidates converted to a positive integer
pub fn first_positive(candidates: &[Option<&Value>]) -> Option<u32> {
    let value = candidates.iter().flatten().find(|v| is_truthy(v))?;
    as_number(value).filter(|n| *n >= 1.0).map(|n| n as u32)
}

/// `true`, `"true"|"1"|"yes"` (any case), `1`
pub fn parse_boolean(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

/// String form for string-only transports: objects and arrays as JSON
pub fn to_metadata_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_counts() {
        assert_eq!(as_count(&json!(2)), 2);
        assert_eq!(as_count(&json!("3")), 3);
        assert_eq!(as_count(&json!("x")), 0);
        assert_eq!(as_count(&json!(null)), 0);
        assert_eq!(as_count(&json!(-1)), 0);
    }

    #[test]
    fn test_first_positive() {
        let zero = json!(0);
        let four = json!("4");
        assert_eq!(first_positive(&[Some(&zero), Some(&four)]), Some(4));
        assert_eq!(first_positive(&[None, Some(&zero)]), None);
        let junk = json!("abc");
        assert_eq!(first_positive(&[Some(&junk), Some(&four)]), None);
    }

    #[test]
    fn test_parse_boolean() {
        assert!(parse_boolean(Some(&json!(true))));
        assert!(parse_boolean(Some(&json!(" YES "))));
        assert!(parse_boolean(Some(&json!("1"))));
        assert!(parse_boolean(Some(&json!(1))));
        assert!(!parse_boolean(Some(&json!("no"))));
        assert!(!parse_boolean(Some(&json!(2))));
        assert!(!parse_boolean(None));
    }

    #[test]
    fn test_metadata_string() {
        assert_eq!(to_metadata_string(&json!("a")).as_deref(), Some("a"));
        assert_eq!(to_metadata_string(&json!(12)).as_deref(), Some("12"));
        assert_eq!(to_metadata_string(&json!(true)).as_deref(), Some("true"));
        assert_eq!(
            to_metadata_string(&json!({"k": [1, 2]})).as_deref(),
            Some(r#"{"k":[1,2]}"#)
        );
        assert_eq!(to_metadata_string(&json!(null)), None);
    }
}
