use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::dates::parse_cli_date;
use crate::error::{BillingError, Result};
use crate::models::{DateRange, DEFAULT_FALLBACK_RATE};

/// Environment variable holding the billing API bearer token.
pub const TOKEN_ENV: &str = "DIGITALOCEAN_TOKEN";

/// Default billing API origin.
pub const DEFAULT_API_BASE: &str = "https://api.digitalocean.com";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly billing report with local-currency conversion
#[derive(Parser, Debug, Clone)]
#[command(
    name = "billing-report",
    about = "Monthly billing report with local-currency conversion",
    version
)]
pub struct Settings {
    /// First day of the report (YYYY-MM-DD)
    #[arg(long, value_parser = parse_cli_date)]
    pub start: NaiveDate,

    /// Last day of the report, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_cli_date)]
    pub end: NaiveDate,

    /// Billing API bearer token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Billing API base URL
    #[arg(long, env = "BILLING_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Target currency for the converted totals (ISO 4217 code)
    #[arg(long, default_value = "BRL", value_parser = parse_currency)]
    pub currency: String,

    /// Report file to write (overwritten if it exists)
    #[arg(long, default_value = "billing_report.html")]
    pub output: PathBuf,

    /// Timeout in seconds for each billing API request (1-300)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=300))]
    pub request_timeout: u64,

    /// Timeout in seconds for each exchange-rate provider (1-120)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=120))]
    pub fx_timeout: u64,

    /// Rate used when no exchange-rate provider answers
    #[arg(long, default_value_t = DEFAULT_FALLBACK_RATE, value_parser = parse_positive_rate)]
    pub fallback_rate: f64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply derived overrides.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`load`](Self::load) but over an explicit argument list.
    pub fn try_load_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// `--debug` overrides the log level.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The validated report window.
    pub fn date_range(&self) -> Result<DateRange> {
        DateRange::new(self.start, self.end)
    }

    /// The bearer token, or [`BillingError::MissingCredential`].
    pub fn bearer_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BillingError::MissingCredential(TOKEN_ENV.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn fx_timeout(&self) -> Duration {
        Duration::from_secs(self.fx_timeout)
    }
}

// ── Value parsers ──────────────────────────────────────────────────────────────

/// Accept a three-letter currency code in any case and upper-case it.
pub fn parse_currency(s: &str) -> Result<String> {
    let code = s.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(BillingError::Config(format!(
            "currency must be a three-letter code, got \"{}\"",
            s
        )))
    }
}

/// Accept a finite, strictly positive rate.
pub fn parse_positive_rate(s: &str) -> Result<f64> {
    match s.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(BillingError::Config(format!(
            "fallback rate must be a positive number, got \"{}\"",
            s
        ))),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
