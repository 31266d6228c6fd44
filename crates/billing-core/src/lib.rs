//! Core types and tolerant parsers for the billing report.
//!
//! Holds the invoice/month/rate models, the amount and date normalizers,
//! CLI settings and the shared error type.

pub mod amount;
pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{BillingError, Result};
