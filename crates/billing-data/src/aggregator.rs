//! Monthly aggregation of invoice amounts over a requested date range.

use std::collections::BTreeMap;

use billing_core::amount::invoice_amount;
use billing_core::dates::{invoice_period, month_key};
use billing_core::models::{DateRange, Invoice, MonthBucket, MonthKey};
use tracing::debug;

// ── MonthlySeries ─────────────────────────────────────────────────────────────

/// Per-month totals for every month of a range, in calendar order.
#[derive(Debug, Clone, Default)]
pub struct MonthlySeries {
    /// One bucket per month of the range; months without invoices hold `0.0`.
    pub buckets: Vec<MonthBucket>,
    /// Invoices that landed in a bucket.
    pub matched: usize,
    /// Invoices with no resolvable period.
    pub skipped_undated: usize,
    /// Invoices whose period lies outside the range.
    pub skipped_out_of_range: usize,
}

impl MonthlySeries {
    /// Sum of all bucket totals.
    pub fn total(&self) -> f64 {
        MonthlyAggregator::calculate_total(&self.buckets)
    }

    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.label.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.total).collect()
    }
}

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that buckets invoices by billing month.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    /// Bucket `invoices` into the months of `range`.
    ///
    /// Each invoice contributes to at most one month: the one its first
    /// resolvable period falls in. Invoices without a period, or outside the
    /// range, are counted and dropped.
    pub fn aggregate(range: &DateRange, invoices: &[Invoice]) -> MonthlySeries {
        let months = range.months();
        let mut totals: BTreeMap<MonthKey, f64> = months.iter().map(|&m| (m, 0.0)).collect();
        let mut series = MonthlySeries::default();

        for invoice in invoices {
            let Some(period) = invoice_period(invoice) else {
                series.skipped_undated += 1;
                continue;
            };
            let Some(total) = totals.get_mut(&month_key(period)) else {
                series.skipped_out_of_range += 1;
                continue;
            };
            *total += invoice_amount(invoice);
            series.matched += 1;
        }

        series.buckets = months
            .into_iter()
            .map(|m| MonthBucket::new(m, totals.get(&m).copied().unwrap_or(0.0)))
            .collect();

        debug!(
            months = series.buckets.len(),
            matched = series.matched,
            undated = series.skipped_undated,
            out_of_range = series.skipped_out_of_range,
            "aggregated invoices"
        );

        series
    }

    /// Sum up the totals of `buckets`.
    pub fn calculate_total(buckets: &[MonthBucket]) -> f64 {
        buckets.iter().map(|b| b.total).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
