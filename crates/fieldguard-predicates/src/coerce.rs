//! Loose string coercion of JSON values.

use serde_json::{Number, Value};

/// Coerce a possibly-absent value into the string the checks operate on.
///
/// - absent and `null` become `""`
/// - numbers print without a trailing `.0` when integral
/// - arrays join their coerced elements with `,` (nested arrays flatten)
/// - objects become `"[object Object]"`
pub fn to_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_text(n),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| to_text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Loose truthiness: absent, `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_are_empty() {
        assert_eq!(to_text(None), "");
        assert_eq!(to_text(Some(&Value::Null)), "");
    }

    #[test]
    fn numbers_drop_integral_fraction() {
        assert_eq!(to_text(Some(&json!(42))), "42");
        assert_eq!(to_text(Some(&json!(-7))), "-7");
        assert_eq!(to_text(Some(&json!(3.0))), "3");
        assert_eq!(to_text(Some(&json!(2.5))), "2.5");
    }

    #[test]
    fn composite_values() {
        assert_eq!(to_text(Some(&json!(["a", 1, null, ["b", "c"]]))), "a,1,,b,c");
        assert_eq!(to_text(Some(&json!({"k": "v"}))), "[object Object]");
        assert_eq!(to_text(Some(&json!(false))), "false");
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!(0.5))));
    }
}
