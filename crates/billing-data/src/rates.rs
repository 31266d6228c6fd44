//! USD→target-currency rate resolution over an ordered list of providers.
//!
//! Every provider failure is absorbed locally; when none of them answers the
//! resolver hands back a fixed fallback quote so the report can still be
//! produced.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use billing_core::error::{BillingError, Result};
use billing_core::models::RateQuote;

// ── RateProvider ──────────────────────────────────────────────────────────────

/// One exchange-rate endpoint and the JSON path at which it reports the rate.
#[derive(Debug, Clone)]
pub struct RateProvider {
    name: String,
    url: String,
    path: Vec<String>,
}

impl RateProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>, path: &[&str]) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Try this provider once. Any failure yields `None`.
    pub async fn attempt(&self, http: &Client, timeout: Duration) -> Option<RateQuote> {
        match self.fetch_quote(http, timeout).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                debug!(provider = %self.name, error = %e, "rate provider failed");
                None
            }
        }
    }

    async fn fetch_quote(&self, http: &Client, timeout: Duration) -> Result<RateQuote> {
        let response = http
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| BillingError::rate_provider(&self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BillingError::rate_provider(
                &self.name,
                format!("HTTP {}", status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BillingError::rate_provider(&self.name, e))?;

        let rate = extract_rate(&body, self.path.as_slice()).ok_or_else(|| {
            BillingError::rate_provider(
                &self.name,
                format!("no numeric rate at `{}`", self.path.join(".")),
            )
        })?;

        RateQuote::new(rate, self.name.clone()).ok_or_else(|| {
            BillingError::rate_provider(&self.name, format!("unusable rate {}", rate))
        })
    }
}

/// Follow `path` into `body` and read the leaf as a number.
///
/// Numeric strings such as `"5.4312"` are accepted.
pub fn extract_rate<S: AsRef<str>>(body: &Value, path: &[S]) -> Option<f64> {
    let leaf = path
        .iter()
        .try_fold(body, |node, key| node.get(key.as_ref()))?;
    match leaf {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// The built-in providers for `currency`, most preferred first.
pub fn default_providers(currency: &str) -> Vec<RateProvider> {
    let code = currency.to_ascii_uppercase();
    let pair = format!("USD{}", code);
    vec![
        RateProvider::new(
            "exchangerate.host",
            format!(
                "https://api.exchangerate.host/latest?base=USD&symbols={}",
                code
            ),
            &["rates", code.as_str()],
        ),
        RateProvider::new(
            "open.er-api.com",
            "https://open.er-api.com/v6/latest/USD",
            &["rates", code.as_str()],
        ),
        RateProvider::new(
            "awesomeapi.com.br",
            format!("https://economia.awesomeapi.com.br/json/last/USD-{}", code),
            &[pair.as_str(), "bid"],
        ),
    ]
}

// ── RateResolver ──────────────────────────────────────────────────────────────

/// Queries providers in order and returns the first valid quote.
pub struct RateResolver {
    http: Client,
    providers: Vec<RateProvider>,
    timeout: Duration,
    fallback_rate: f64,
}

impl RateResolver {
    pub fn new(providers: Vec<RateProvider>, timeout: Duration, fallback_rate: f64) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| BillingError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            providers,
            timeout,
            fallback_rate,
        })
    }

    /// Resolver over [`default_providers`] for `currency`.
    pub fn for_currency(currency: &str, timeout: Duration, fallback_rate: f64) -> Result<Self> {
        Self::new(default_providers(currency), timeout, fallback_rate)
    }

    /// Resolve the run's rate. Never fails; see [`RateQuote::fallback`].
    pub async fn resolve(&self) -> RateQuote {
        for provider in &self.providers {
            if let Some(quote) = provider.attempt(&self.http, self.timeout).await {
                info!("Exchange rate {} from {}", quote.rate(), quote.source());
                return quote;
            }
        }

        debug!(
            providers = self.providers.len(),
            rate = self.fallback_rate,
            "no rate provider answered; using fallback rate"
        );
        RateQuote::fallback(self.fallback_rate)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::models::DEFAULT_FALLBACK_RATE;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, template: ResponseTemplate, hits: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .expect(hits)
            .mount(server)
            .await;
    }

    fn provider(server: &MockServer, name: &str, route: &str, json_path: &[&str]) -> RateProvider {
        RateProvider::new(name, format!("{}{}", server.uri(), route), json_path)
    }

    fn resolver(providers: Vec<RateProvider>) -> RateResolver {
        RateResolver::new(providers, Duration::from_millis(500), DEFAULT_FALLBACK_RATE).unwrap()
    }

    // ── extract_rate ──────────────────────────────────────────────────────────

    #[test]
    fn test_extract_rate_number() {
        let body = json!({"rates": {"BRL": 5.12}});
        assert_eq!(extract_rate(&body, &["rates", "BRL"]), Some(5.12));
    }

    #[test]
    fn test_extract_rate_numeric_string() {
        let body = json!({"USDBRL": {"bid": " 5.4312 "}});
        assert_eq!(extract_rate(&body, &["USDBRL", "bid"]), Some(5.4312));
    }

    #[test]
    fn test_extract_rate_missing_or_wrong_type() {
        let body = json!({"rates": {"EUR": 0.9, "BRL": null, "XYZ": [1]}});
        assert_eq!(extract_rate(&body, &["rates", "USD"]), None);
        assert_eq!(extract_rate(&body, &["rates", "BRL"]), None);
        assert_eq!(extract_rate(&body, &["rates", "XYZ"]), None);
        assert_eq!(extract_rate(&body, &["missing", "BRL"]), None);
        assert_eq!(extract_rate(&json!({"bid": "n/a"}), &["bid"]), None);
    }

    // ── default_providers ─────────────────────────────────────────────────────

    #[test]
    fn test_default_providers_order_and_currency() {
        let providers = default_providers("eur");
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["exchangerate.host", "open.er-api.com", "awesomeapi.com.br"]
        );
        assert!(providers[0].url().ends_with("symbols=EUR"));
        assert!(providers[2].url().ends_with("USD-EUR"));
        assert_eq!(providers[2].path, vec!["USDEUR".to_string(), "bid".to_string()]);
    }

    // ── resolve ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/first",
            ResponseTemplate::new(200).set_body_json(json!({"rates": {"BRL": 5.1}})),
            1,
        )
        .await;
        mount(
            &server,
            "/second",
            ResponseTemplate::new(200).set_body_json(json!({"rates": {"BRL": 6.0}})),
            0,
        )
        .await;

        let quote = resolver(vec![
            provider(&server, "first", "/first", &["rates", "BRL"]),
            provider(&server, "second", "/second", &["rates", "BRL"]),
        ])
        .resolve()
        .await;

        assert_eq!(quote.rate(), 5.1);
        assert_eq!(quote.source(), "first");
    }

    #[tokio::test]
    async fn test_falls_through_to_later_provider() {
        let server = MockServer::start().await;
        mount(&server, "/down", ResponseTemplate::new(503), 1).await;
        mount(
            &server,
            "/garbled",
            ResponseTemplate::new(200).set_body_string("not json"),
            1,
        )
        .await;
        mount(
            &server,
            "/bid",
            ResponseTemplate::new(200).set_body_json(json!({"USDBRL": {"bid": "5.43"}})),
            1,
        )
        .await;

        let quote = resolver(vec![
            provider(&server, "down", "/down", &["rates", "BRL"]),
            provider(&server, "garbled", "/garbled", &["rates", "BRL"]),
            provider(&server, "awesome", "/bid", &["USDBRL", "bid"]),
        ])
        .resolve()
        .await;

        assert_eq!(quote.rate(), 5.43);
        assert_eq!(quote.source(), "awesome");
    }

    #[tokio::test]
    async fn test_all_failures_return_fallback() {
        let server = MockServer::start().await;
        mount(&server, "/missing", ResponseTemplate::new(404), 1).await;
        mount(
            &server,
            "/zero",
            ResponseTemplate::new(200).set_body_json(json!({"rates": {"BRL": 0}})),
            1,
        )
        .await;
        mount(
            &server,
            "/negative",
            ResponseTemplate::new(200).set_body_json(json!({"USDBRL": {"bid": "-1"}})),
            1,
        )
        .await;

        let quote = resolver(vec![
            provider(&server, "missing", "/missing", &["rates", "BRL"]),
            provider(&server, "zero", "/zero", &["rates", "BRL"]),
            provider(&server, "negative", "/negative", &["USDBRL", "bid"]),
        ])
        .resolve()
        .await;

        assert_eq!(quote, RateQuote::fallback(5.0));
        assert_eq!(quote.source(), "fallback");
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/slow",
            ResponseTemplate::new(200)
                .set_body_json(json!({"rates": {"BRL": 9.9}}))
                .set_delay(Duration::from_secs(3)),
            1,
        )
        .await;
        mount(
            &server,
            "/fast",
            ResponseTemplate::new(200).set_body_json(json!({"rates": {"BRL": 5.2}})),
            1,
        )
        .await;

        let quote = resolver(vec![
            provider(&server, "slow", "/slow", &["rates", "BRL"]),
            provider(&server, "fast", "/fast", &["rates", "BRL"]),
        ])
        .resolve()
        .await;

        assert_eq!(quote.source(), "fast");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_skipped() {
        let quote = resolver(vec![RateProvider::new(
            "nowhere",
            "http://127.0.0.1:9/latest",
            &["rates", "BRL"],
        )])
        .resolve()
        .await;

        assert!(quote.is_fallback());
        assert_eq!(quote.rate(), DEFAULT_FALLBACK_RATE);
    }

    #[tokio::test]
    async fn test_no_providers_returns_fallback() {
        let r = RateResolver::new(Vec::new(), Duration::from_secs(1), 4.2).unwrap();
        let quote = r.resolve().await;
        assert_eq!(quote.rate(), 4.2);
        assert!(quote.is_fallback());
    }
}
