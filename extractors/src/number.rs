use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.\-]+").unwrap());

// Longest leading float literal, the way a lenient float parser reads it
static FLOAT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)").unwrap());

/// Converts a loosely formatted amount (`"$1,234.56"`, `"1,234.56CR"`) into a float.
///
/// JSON numbers are returned as-is. Anything else is stringified, stripped of
/// every character other than digits, `.` and `-`, then read as a float
/// prefix. `CR`/`DR` markers are dropped along with the other letters, they do
/// not change the sign.
pub fn normalize_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Null => None,
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => normalize_number_str(s),
        other => normalize_number_str(&other.to_string()),
    }
}

pub fn normalize_number_str(raw: &str) -> Option<f64> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");
    let prefix = FLOAT_PREFIX.find(&cleaned)?;
    prefix
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}
