mod bootstrap;
mod render;

use anyhow::Result;
use billing_core::settings::Settings;
use billing_data::aggregator::MonthlyAggregator;
use billing_data::client::BillingClient;
use billing_data::rates::RateResolver;
use render::ReportContext;

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = bootstrap::load_env();
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("billing-report v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = env_file {
        tracing::debug!("loaded environment from {}", path.display());
    }

    let resolver = RateResolver::for_currency(
        &settings.currency,
        settings.fx_timeout(),
        settings.fallback_rate,
    )?;

    generate(&settings, &resolver).await?;
    println!("Report written: {}", settings.output.display());

    Ok(())
}

/// Run the whole pipeline and write the report to `settings.output`.
///
/// Range and credential problems are reported before any request is made.
async fn generate(settings: &Settings, resolver: &RateResolver) -> Result<()> {
    let range = settings.date_range()?;
    let token = settings.bearer_token()?;

    tracing::info!(
        "Report period {} to {} ({} month(s))",
        range.start(),
        range.end(),
        range.months().len()
    );

    let client = BillingClient::new(&settings.api_base, token, settings.request_timeout())?;

    let balance = client.fetch_balance().await?;
    let invoices = client.fetch_all_invoices().await?;

    let series = MonthlyAggregator::aggregate(&range, &invoices);
    tracing::info!(
        "{} of {} invoices fall within the period, total USD {:.2}",
        series.matched,
        invoices.len(),
        series.total()
    );

    let quote = resolver.resolve().await;

    let html = render::render_html(&ReportContext {
        balance: &balance,
        range: &range,
        series: &series,
        quote: &quote,
        currency: &settings.currency,
    });
    render::write_report(&settings.output, &html)?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
