use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{BillingError, Result};
use crate::models::{Invoice, MonthKey};

/// Explicit `YYYY-MM` billing period field.
pub const PERIOD_FIELD: &str = "invoice_period";

/// Date fields consulted, in order, when no explicit period is present.
pub const DATE_FIELDS: &[&str] = &["created_at", "date", "invoice_date"];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a loosely formatted date such as `"2024-01-15"`,
/// `"2024-01-15T10:30:00Z"` or `"2024-01-15 10:30:00"`.
///
/// Anything after the first time separator is ignored. Returns `None` on any
/// parse failure.
pub fn to_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// [`to_date`] over a JSON value; non-strings never parse.
pub fn to_date_value(value: Option<&Value>) -> Option<NaiveDate> {
    value.and_then(Value::as_str).and_then(to_date)
}

/// Parse a `YYYY-MM` period into the first day of that month.
pub fn parse_period(s: &str) -> Option<NaiveDate> {
    s.parse::<MonthKey>().ok().and_then(|k| k.first_day())
}

/// Strict parser for command-line dates: `YYYY-MM-DD` and nothing else.
pub fn parse_cli_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| BillingError::InvalidDate(s.to_string()))
}

/// Resolve the date an invoice is billed under.
///
/// An explicit [`PERIOD_FIELD`] wins when it parses; otherwise the first of
/// [`DATE_FIELDS`] that parses is used. `None` means the invoice cannot be
/// placed in any month.
pub fn invoice_period(invoice: &Invoice) -> Option<NaiveDate> {
    if let Some(period) = invoice
        .field(PERIOD_FIELD)
        .and_then(Value::as_str)
        .and_then(parse_period)
    {
        return Some(period);
    }

    DATE_FIELDS
        .iter()
        .find_map(|&name| to_date_value(invoice.field(name)))
}

// ── Month helpers ─────────────────────────────────────────────────────────────

pub fn month_key(date: NaiveDate) -> MonthKey {
    MonthKey::from_date(date)
}

/// `"January 2024"` style label for the month containing `date`.
pub fn month_label(date: NaiveDate) -> String {
    month_key(date).label()
}

/// Inclusive, gap-free list of months from `start`'s month through `end`'s.
///
/// Empty when `end` falls in an earlier month than `start`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<MonthKey> {
    let last = MonthKey::from_date(end);
    let mut current = MonthKey::from_date(start);
    let mut out = Vec::new();
    while current <= last {
        out.push(current);
        current = current.next();
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn keys(v: Vec<MonthKey>) -> Vec<String> {
        v.into_iter().map(|k| k.to_string()).collect()
    }

    fn invoice(v: Value) -> Invoice {
        serde_json::from_value(v).unwrap()
    }

    // ── to_date ───────────────────────────────────────────────────────────────

    #[test]
    fn test_to_date_plain() {
        assert_eq!(to_date("2024-01-15"), Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_to_date_truncates_time() {
        assert_eq!(to_date("2024-01-15T10:30:00Z"), Some(date(2024, 1, 15)));
        assert_eq!(to_date("2024-01-15 10:30:00"), Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_to_date_failures() {
        assert_eq!(to_date(""), None);
        assert_eq!(to_date("   "), None);
        assert_eq!(to_date("15/01/2024"), None);
        assert_eq!(to_date("2024-02-30"), None);
        assert_eq!(to_date("2024-01"), None);
    }

    #[test]
    fn test_to_date_value_non_string() {
        assert_eq!(to_date_value(Some(&json!(20240115))), None);
        assert_eq!(to_date_value(None), None);
        assert_eq!(
            to_date_value(Some(&json!("2024-03-01T00:00:00Z"))),
            Some(date(2024, 3, 1))
        );
    }

    // ── parse_cli_date ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_cli_date_strict() {
        assert_eq!(parse_cli_date("2024-01-01").unwrap(), date(2024, 1, 1));
        assert!(matches!(
            parse_cli_date("2024-01-01T00:00:00"),
            Err(BillingError::InvalidDate(_))
        ));
        assert!(parse_cli_date("01/01/2024").is_err());
    }

    // ── invoice_period ────────────────────────────────────────────────────────

    #[test]
    fn test_invoice_period_explicit_field_wins() {
        let inv = invoice(json!({
            "invoice_period": "2024-02",
            "created_at": "2024-03-01T00:00:00Z"
        }));
        assert_eq!(invoice_period(&inv), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_invoice_period_bad_period_falls_back() {
        let inv = invoice(json!({
            "invoice_period": "February",
            "created_at": "2024-03-05T00:00:00Z"
        }));
        assert_eq!(invoice_period(&inv), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_invoice_period_fallback_order() {
        let inv = invoice(json!({
            "created_at": "not a date",
            "date": "2023-12-24",
            "invoice_date": "2024-01-10"
        }));
        assert_eq!(invoice_period(&inv), Some(date(2023, 12, 24)));
    }

    #[test]
    fn test_invoice_period_unresolvable() {
        let inv = invoice(json!({"amount": "5.00", "created_at": null}));
        assert_eq!(invoice_period(&inv), None);
    }

    // ── months_between ────────────────────────────────────────────────────────

    #[test]
    fn test_months_between_single_month() {
        let months = months_between(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(keys(months), vec!["2024-01"]);
    }

    #[test]
    fn test_months_between_year_boundary() {
        let months = months_between(date(2023, 11, 15), date(2024, 2, 3));
        assert_eq!(keys(months), vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn test_months_between_multi_year() {
        let months = months_between(date(2022, 1, 1), date(2024, 12, 31));
        assert_eq!(months.len(), 36);
        assert_eq!(months[0].to_string(), "2022-01");
        assert_eq!(months[35].to_string(), "2024-12");
    }

    #[test]
    fn test_months_between_inverted_is_empty() {
        assert!(months_between(date(2024, 3, 1), date(2024, 1, 1)).is_empty());
    }

    // ── labels ────────────────────────────────────────────────────────────────

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(date(2024, 12, 9)), "December 2024");
        assert_eq!(month_key(date(2024, 12, 9)).to_string(), "2024-12");
    }
}
