//! Self-contained HTML rendering of the monthly billing series.

use anyhow::Context;
use serde_json::Value;
use std::path::Path;

use billing_core::formatting::{format_number, format_rate};
use billing_core::models::{DateRange, RateQuote};
use billing_data::aggregator::MonthlySeries;

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.4/dist/chart.umd.min.js";

const STYLE: &str = "body{font-family:Arial, sans-serif;line-height:1.4}\
.wrap{max-width:920px;margin:24px auto}\
.muted{color:#666} h2{margin-top:28px} table{border-collapse:collapse;margin-top:10px}\
th,td{border:1px solid #ddd;padding:6px 8px} td.num{text-align:right}\
.chart-box{position:relative;width:clamp(300px,80vw,720px);}\
canvas{display:block;width:100% !important;height:auto !important;}";

const CHART_SCRIPT: &str = r#"
let lineChart, barChart;
function buildCharts(){
  if(!window.Chart) return;
  const base = {responsive:true, maintainAspectRatio:true, aspectRatio:1.8, resizeDelay:120};
  const lineOpts = Object.assign({}, base, {scales:{y:{beginAtZero:true}}});
  const barOpts = Object.assign({}, base, {indexAxis:'y', animation:false, scales:{x:{beginAtZero:true}, y:{ticks:{autoSkip:false}}}});
  if(lineChart) lineChart.destroy();
  if(barChart) barChart.destroy();
  lineChart = new Chart(document.getElementById('evo').getContext('2d'),
    {type:'line', data:{labels:LABELS, datasets:[{label:'Monthly total (USD)', data:VALUES, tension:0.2, fill:false}]}, options:lineOpts});
  barChart = new Chart(document.getElementById('evo_hbar').getContext('2d'),
    {type:'bar', data:{labels:LABELS, datasets:[{label:'Total per month (USD)', data:VALUES}]}, options:barOpts});
}
if(document.readyState==='loading'){ document.addEventListener('DOMContentLoaded', buildCharts); } else { buildCharts(); }
window.addEventListener('resize', ()=>{ if(lineChart) lineChart.resize(); if(barChart) barChart.resize(); });
"#;

/// Everything the report shows.
pub struct ReportContext<'a> {
    pub balance: &'a Value,
    pub range: &'a DateRange,
    pub series: &'a MonthlySeries,
    pub quote: &'a RateQuote,
    pub currency: &'a str,
}

/// Render the full HTML document.
pub fn render_html(ctx: &ReportContext<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!doctype html><html><head><meta charset='utf-8'>\n");
    html.push_str("<title>Billing Report</title>\n");
    html.push_str(&format!("<script src='{}'></script>\n", CHART_JS_CDN));
    html.push_str(&format!("<style>{}</style>\n", STYLE));
    html.push_str("</head><body><div class='wrap'>\n");
    html.push_str("<h1>Billing Report</h1>\n");
    html.push_str(&format!(
        "<p class='muted'><strong>Period:</strong> {} to {}</p>\n",
        ctx.range.start(),
        ctx.range.end()
    ));

    let balance = serde_json::to_string_pretty(ctx.balance).unwrap_or_else(|_| "{}".to_string());
    html.push_str(&format!(
        "<details><summary><strong>Balance</strong></summary><pre>{}</pre></details>\n",
        escape_html(&balance)
    ));

    html.push_str("<h2>Monthly trend</h2>\n");
    html.push_str("<div class='chart-box' id='box_line'><canvas id='evo'></canvas></div>\n");
    html.push_str("<h2>Totals per month</h2>\n");
    html.push_str("<div class='chart-box' id='box_bar'><canvas id='evo_hbar'></canvas></div>\n");

    let currency = escape_html(ctx.currency);
    html.push_str(&format!(
        "<p class='muted'>USD→{} rate: <strong>{}</strong> (source: {})</p>\n",
        currency,
        format_rate(ctx.quote.rate()),
        escape_html(ctx.quote.source())
    ));

    html.push_str(&format!(
        "<table><thead><tr><th>Month</th><th>Total (USD)</th><th>Total ({})</th></tr></thead><tbody>\n",
        currency
    ));
    for bucket in &ctx.series.buckets {
        html.push_str(&format!(
            "<tr><td>{}</td><td class='num'>{}</td><td class='num'>{}</td></tr>\n",
            escape_html(&bucket.label),
            format_number(bucket.total, 2),
            format_number(ctx.quote.convert(bucket.total), 2)
        ));
    }
    let total = ctx.series.total();
    html.push_str(&format!(
        "</tbody><tfoot><tr><th>Total</th><th class='num'>{}</th><th class='num'>{}</th></tr></tfoot></table>\n",
        format_number(total, 2),
        format_number(ctx.quote.convert(total), 2)
    ));

    html.push_str("<script>\n");
    html.push_str(&format!("const LABELS = {};\n", script_json(&ctx.series.labels())));
    html.push_str(&format!("const VALUES = {};\n", script_json(&ctx.series.values())));
    html.push_str(CHART_SCRIPT);
    html.push_str("</script>\n");

    html.push_str("</div></body></html>\n");
    html
}

/// Write `html` to `path`, replacing any existing file.
pub fn write_report(path: &Path, html: &str) -> anyhow::Result<()> {
    std::fs::write(path, html)
        .with_context(|| format!("Failed to write report {}", path.display()))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON literal safe to embed inside a `<script>` element.
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
