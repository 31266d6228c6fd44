use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{BillingError, Result};

/// Source label attached to a quote when no provider answered.
pub const FALLBACK_SOURCE: &str = "fallback";

/// Rate used when every provider fails and none was configured.
pub const DEFAULT_FALLBACK_RATE: f64 = 5.0;

// ── Invoice ───────────────────────────────────────────────────────────────────

/// One invoice record as returned by the billing API.
///
/// The provider does not guarantee a schema, so the record is kept as a raw
/// field mapping and every read is an optional lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Invoice {
    fields: Map<String, Value>,
}

impl Invoice {
    /// Look up a field, treating JSON `null` the same as a missing key.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }
}

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// A calendar month, displayed as `YYYY-MM`.
///
/// Ordering is chronological, so sorted collections of keys follow the
/// calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month; December rolls over into January.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Human label such as `"January 2024"`, always derived from the key.
    pub fn label(&self) -> String {
        match self.first_day() {
            Some(d) => d.format("%B %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = BillingError;

    /// Parse a strict `YYYY-MM` string.
    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| BillingError::InvalidDate(s.to_string()))
    }
}

// ── MonthBucket ───────────────────────────────────────────────────────────────

/// Total billed within one month of the requested range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    #[serde(serialize_with = "serialize_display")]
    pub key: MonthKey,
    pub label: String,
    pub total: f64,
}

impl MonthBucket {
    pub fn new(key: MonthKey, total: f64) -> Self {
        Self {
            key,
            label: key.label(),
            total,
        }
    }
}

fn serialize_display<S: serde::Serializer>(
    key: &MonthKey,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

// ── RateQuote ─────────────────────────────────────────────────────────────────

/// A USD→target-currency conversion factor and the provider it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    rate: f64,
    source: String,
}

impl RateQuote {
    /// Build a quote, rejecting rates that are not finite and strictly positive.
    pub fn new(rate: f64, source: impl Into<String>) -> Option<Self> {
        if rate.is_finite() && rate > 0.0 {
            Some(Self {
                rate,
                source: source.into(),
            })
        } else {
            None
        }
    }

    /// The quote used when every provider failed.
    ///
    /// A non-positive `rate` is replaced by `1.0`.
    pub fn fallback(rate: f64) -> Self {
        Self::new(rate, FALLBACK_SOURCE).unwrap_or(Self {
            rate: 1.0,
            source: FALLBACK_SOURCE.to_string(),
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == FALLBACK_SOURCE
    }

    /// Convert a USD amount into the target currency.
    pub fn convert(&self, usd: f64) -> f64 {
        usd * self.rate
    }
}

// ── DateRange ─────────────────────────────────────────────────────────────────

/// Inclusive report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns [`BillingError::InvertedRange`] when `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(BillingError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every month touched by the range, in calendar order.
    pub fn months(&self) -> Vec<MonthKey> {
        crate::dates::months_between(self.start, self.end)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
