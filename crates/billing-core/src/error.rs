use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the billing report pipeline.
#[derive(Error, Debug)]
pub enum BillingError {
    /// The bearer credential was not supplied.
    #[error("Missing credential: set {0} in the environment or a .env file")]
    MissingCredential(String),

    /// A date argument did not match `YYYY-MM-DD`.
    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// The requested range ends before it starts.
    #[error("End date {end} must not be before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// The billing API answered with a non-success status.
    #[error("Billing API request to {endpoint} failed with HTTP {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A pagination link pointed back at a page that was already fetched.
    #[error("Pagination loop detected: {0} was already fetched")]
    PaginationLoop(String),

    /// A request could not be sent or its body could not be read.
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A rate provider could not produce a usable quote.
    #[error("Rate provider {provider} failed: {reason}")]
    RateProvider { provider: String, reason: String },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BillingError {
    /// Wrap a transport error together with the URL it was raised for.
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    /// Build a provider failure from any displayable reason.
    pub fn rate_provider(provider: &str, reason: impl std::fmt::Display) -> Self {
        Self::RateProvider {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the billing crates.
pub type Result<T> = std::result::Result<T, BillingError>;
