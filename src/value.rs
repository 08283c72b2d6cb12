use serde_json::Value;

/// The canonical string form of a scalar schema value (spec §4.5):
/// booleans lower-case, integers/floats in standard decimal, strings
/// verbatim, null as the empty string.
///
/// Calling this on a sequence or mapping is a shape error the caller must
/// guard against — it never panics, but a sequence or mapping renders as its
/// JSON form, which is almost certainly not what the template author wanted.
pub fn canonical_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Type-coerced equality between a resolved scalar value and a `[[select]]`
/// literal (spec §4.5): booleans compare against `bool(select)`, integers
/// against `int(select)`, floats against `float(select)` (exact `==`; see
/// spec §9's warning about float equality fragility), strings verbatim. Any
/// coercion failure is "do not compile", not an error.
pub fn matches_select(value: &Value, select: &str) -> bool {
    match value {
        Value::Bool(b) => select.parse::<bool>().map(|s| s == *b).unwrap_or(false),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                select.parse::<i64>().map(|s| s == i).unwrap_or(false)
            } else if let Some(f) = n.as_f64() {
                select.parse::<f64>().map(|s| s == f).unwrap_or(false)
            } else {
                false
            }
        }
        Value::String(s) => select == s,
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}
