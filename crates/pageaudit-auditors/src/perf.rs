//! Performance auditor: server latency, page weight, compression, scripts.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pageaudit_core::{AuditInput, AuditResult, Auditor};
use reqwest::Url;
use serde_json::Value;
use tracing::warn;

use crate::fetch::{FetchedPage, PageFetcher};
use crate::html;
use crate::scorecard::Scorecard;

pub const KEY: &str = "perf";
pub const NAME: &str = "Performance";

const PAGESPEED_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

const SLOW_RESPONSE_MS: u64 = 1_000;
const VERY_SLOW_RESPONSE_MS: u64 = 3_000;
const HEAVY_HTML_BYTES: usize = 500 * 1024;
const VERY_HEAVY_HTML_BYTES: usize = 2 * 1024 * 1024;
const MAX_SCRIPTS: usize = 20;
const MAX_STYLESHEETS: usize = 10;
const MAX_BLOCKING_SCRIPTS: usize = 3;

/// Signals gathered outside the main page fetch.
#[derive(Debug, Clone, Default)]
pub struct PerfSignals {
    /// `Some(None)` means the server sent no `Content-Encoding`; `None` means unknown.
    pub content_encoding: Option<Option<String>>,
    /// Lighthouse performance score, 0..=100.
    pub pagespeed_score: Option<i64>,
    pub pagespeed_error: Option<String>,
}

/// Score a fetched page.
pub fn analyze(page: &FetchedPage, signals: &PerfSignals) -> AuditResult {
    let mut card = Scorecard::new();

    card.detail("responseTimeMs", page.elapsed_ms);
    match page.elapsed_ms {
        ms if ms > VERY_SLOW_RESPONSE_MS => card.fail(30, format!("Server responded in {ms} ms")),
        ms if ms > SLOW_RESPONSE_MS => card.warn(15, format!("Server responded in {ms} ms")),
        ms => card.pass(format!("Server responded in {ms} ms")),
    }

    let bytes = page.body_bytes();
    let kb = bytes / 1024;
    card.detail("htmlBytes", bytes);
    if bytes > VERY_HEAVY_HTML_BYTES {
        card.fail(20, format!("HTML document is {kb} KB"));
    } else if bytes > HEAVY_HTML_BYTES {
        card.warn(10, format!("HTML document is {kb} KB"));
    } else {
        card.pass(format!("HTML document is {kb} KB"));
    }

    match &signals.content_encoding {
        Some(Some(encoding)) => {
            card.detail("contentEncoding", encoding.as_str());
            card.pass(format!("Response is compressed ({encoding})"));
        }
        Some(None) => card.warn(10, "Response is not compressed"),
        None => card.pass("Compression could not be determined"),
    }

    let scripts = html::scripts(&page.body);
    let external = scripts.iter().filter(|s| s.contains_key("src")).count();
    let blocking = scripts.iter().filter(|s| html::is_render_blocking(s)).count();
    card.detail("scriptCount", scripts.len());
    card.detail("renderBlockingScripts", blocking);
    if external > MAX_SCRIPTS {
        card.warn(10, format!("{external} external scripts are loaded"));
    }
    if blocking > MAX_BLOCKING_SCRIPTS {
        card.warn(
            10,
            format!("{blocking} render-blocking scripts (add async or defer)"),
        );
    } else if blocking > 0 {
        card.pass(format!("{blocking} render-blocking script(s)"));
    }

    let stylesheets = html::links_with_rel(&page.body, "stylesheet").len();
    card.detail("stylesheetCount", stylesheets);
    if stylesheets > MAX_STYLESHEETS {
        card.warn(5, format!("{stylesheets} stylesheets are loaded"));
    }

    let heuristic = card.score();
    card.detail("heuristicScore", heuristic);

    if let Some(error) = &signals.pagespeed_error {
        card.warn(0, format!("PageSpeed Insights unavailable: {error}"));
    }
    match signals.pagespeed_score {
        Some(lighthouse) => {
            card.detail("pagespeedScore", lighthouse);
            card.pass(format!("PageSpeed performance score {lighthouse}"));
            let blended = ((heuristic + lighthouse) as f64 / 2.0).round() as i64;
            card.finish_with_score(KEY, NAME, blended)
        }
        None => card.finish(KEY, NAME),
    }
}

/// Extract the 0..=100 performance score from a PageSpeed v5 response.
pub fn pagespeed_score(body: &Value) -> Option<i64> {
    body.pointer("/lighthouseResult/categories/performance/score")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite())
        .map(|s| (s * 100.0).round().clamp(0.0, 100.0) as i64)
}

/// Performance auditor.
pub struct PerfAuditor {
    fetcher: Arc<PageFetcher>,
    api_key: Option<String>,
}

impl PerfAuditor {
    pub fn new(fetcher: Arc<PageFetcher>, api_key: Option<String>) -> Self {
        Self { fetcher, api_key }
    }

    async fn pagespeed(&self, input: &AuditInput, api_key: &str) -> Result<i64> {
        let endpoint = Url::parse_with_params(
            PAGESPEED_ENDPOINT,
            &[
                ("url", input.url.as_str()),
                ("key", api_key),
                ("category", "performance"),
            ],
        )
        .context("build PageSpeed URL")?;
        let body = self.fetcher.get_json(endpoint, input.timeout()).await?;
        pagespeed_score(&body).context("response has no performance score")
    }
}

#[async_trait]
impl Auditor for PerfAuditor {
    fn key(&self) -> &str {
        KEY
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &AuditInput) -> Result<AuditResult> {
        let page = self.fetcher.fetch(input).await?;

        let mut signals = PerfSignals::default();
        match self.fetcher.content_encoding(&page.url, input.timeout()).await {
            Ok(encoding) => signals.content_encoding = Some(encoding),
            Err(e) => warn!(url = %page.url, error = %format!("{e:#}"), "compression check failed"),
        }

        let api_key = input
            .extra_str("apiKey")
            .map(str::to_string)
            .or_else(|| self.api_key.clone());
        if let Some(api_key) = api_key {
            match self.pagespeed(input, &api_key).await {
                Ok(score) => signals.pagespeed_score = Some(score),
                Err(e) => signals.pagespeed_error = Some(format!("{e:#}")),
            }
        }

        Ok(analyze(&page, &signals))
    }
}
