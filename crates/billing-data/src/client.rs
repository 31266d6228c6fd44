//! Billing API client: balance snapshot and exhaustive invoice pagination.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use billing_core::error::{BillingError, Result};
use billing_core::models::Invoice;

pub const BALANCE_PATH: &str = "/v2/customers/my/balance";
pub const INVOICES_PATH: &str = "/v2/customers/my/invoices";

/// Records requested per invoice page.
pub const PAGE_SIZE: u32 = 200;

/// Error bodies are cut to this many characters before being reported.
const MAX_ERROR_BODY: usize = 500;

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct InvoicePage {
    #[serde(default)]
    invoices: Option<Vec<Invoice>>,
    #[serde(default)]
    links: Option<PageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    #[serde(default)]
    pages: Option<PageRefs>,
}

#[derive(Debug, Default, Deserialize)]
struct PageRefs {
    #[serde(default)]
    next: Option<String>,
}

impl InvoicePage {
    fn next_link(&self) -> Option<String> {
        self.links
            .as_ref()
            .and_then(|l| l.pages.as_ref())
            .and_then(|p| p.next.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

// ── BillingClient ─────────────────────────────────────────────────────────────

/// Authenticated client for the customer billing endpoints.
pub struct BillingClient {
    http: Client,
    base_url: String,
    token: String,
}

impl BillingClient {
    /// Build a client for `base_url` authenticating with a static bearer token.
    ///
    /// `timeout` bounds every individual request.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BillingError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Fetch the account balance as an opaque JSON document.
    pub async fn fetch_balance(&self) -> Result<Value> {
        let url = format!("{}{}", self.base_url, BALANCE_PATH);
        let balance = self.get_json(&url).await?;
        debug!("fetched account balance");
        Ok(balance)
    }

    /// Fetch every invoice, following `links.pages.next` until it disappears.
    ///
    /// Any failed page aborts the whole fetch; no partial list is returned.
    /// A `next` link that points at a page already fetched is reported as
    /// [`BillingError::PaginationLoop`].
    pub async fn fetch_all_invoices(&self) -> Result<Vec<Invoice>> {
        let mut next = Some(self.first_invoice_page_url());
        let mut fetched: HashSet<String> = HashSet::new();
        let mut invoices: Vec<Invoice> = Vec::new();

        while let Some(url) = next.take() {
            if !fetched.insert(url.clone()) {
                return Err(BillingError::PaginationLoop(url));
            }

            let page: InvoicePage = self.get_json(&url).await?;
            next = page.next_link();

            let records = page.invoices.unwrap_or_default();
            debug!(
                page = fetched.len(),
                records = records.len(),
                has_next = next.is_some(),
                "fetched invoice page"
            );
            invoices.extend(records);
        }

        info!(
            "Fetched {} invoices across {} page(s)",
            invoices.len(),
            fetched.len()
        );
        Ok(invoices)
    }

    fn first_invoice_page_url(&self) -> String {
        format!(
            "{}{}?per_page={}&page=1",
            self.base_url, INVOICES_PATH, PAGE_SIZE
        )
    }

    /// GET `url` with the bearer token and decode a JSON body.
    ///
    /// Non-2xx statuses become [`BillingError::Api`].
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BillingError::http(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::Api {
                endpoint: url.to_string(),
                status: status.as_u16(),
                body: body.trim().chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BillingError::http(url, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
