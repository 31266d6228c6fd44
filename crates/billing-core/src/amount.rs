//! Tolerant extraction of monetary amounts from loosely typed invoice fields.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::Invoice;

/// Amount-like invoice fields, probed in order.
pub const AMOUNT_FIELDS: &[&str] = &["amount", "total", "amount_due"];

/// First signed decimal numeral. ASCII digits only, so every match parses.
fn numeral_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").expect("regex is valid"))
}

/// Read a numeric amount out of any JSON value.
///
/// * `None` / `null` → `0.0`
/// * JSON number     → its value
/// * JSON string     → first numeral found, or `0.0`
/// * anything else   → first numeral in its JSON text, or `0.0`
///
/// Never fails: malformed input contributes nothing.
pub fn parse_amount(value: Option<&Value>) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_amount_str(s),
        Some(other) => parse_amount_str(&other.to_string()),
    }
}

/// Extract the first numeral from free text such as `"$19.99 USD"`.
pub fn parse_amount_str(s: &str) -> f64 {
    numeral_regex()
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// The amount billed on `invoice`.
///
/// The first of [`AMOUNT_FIELDS`] holding a meaningful value wins; `null`,
/// `""`, `0`, `false`, `[]` and `{}` count as "not set" and fall through to
/// the next candidate.
pub fn invoice_amount(invoice: &Invoice) -> f64 {
    let value = AMOUNT_FIELDS
        .iter()
        .filter_map(|&name| invoice.field(name))
        .find(|v| is_set(v));
    parse_amount(value)
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
