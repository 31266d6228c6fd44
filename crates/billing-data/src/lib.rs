//! Data acquisition and aggregation for the billing report.
//!
//! Talks to the billing API (balance and paginated invoices), resolves the
//! exchange rate from public providers and buckets invoices by month.

pub mod aggregator;
pub mod client;
pub mod rates;

pub use billing_core as core;
