//! Shared HTTP fetching for the built-in auditors.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use pageaudit_core::AuditInput;
use reqwest::header::{HeaderMap, ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::Url;
use tokio::time::Instant;
use tracing::debug;

/// A fetched HTML document plus the response metadata auditors inspect.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects.
    pub url: Url,
    pub status: u16,
    /// Response headers with lowercased names.
    pub headers: HashMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl FetchedPage {
    /// Build a page from already-known parts.
    pub fn new(url: Url, status: u16, headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            body: body.into(),
            elapsed_ms: 0,
        }
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    pub fn body_bytes(&self) -> usize {
        self.body.len()
    }
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.entry(name.as_str().to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }
    out
}

/// HTTP client shared by all built-in auditors.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    /// Client without transparent decompression, so `Content-Encoding` survives.
    raw: reqwest::Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("build HTTP client")?;
        let raw = reqwest::Client::builder()
            .user_agent(user_agent)
            .no_gzip()
            .build()
            .context("build raw HTTP client")?;
        Ok(Self { client, raw })
    }

    /// GET the input URL, honouring its timeout.
    ///
    /// Non-2xx responses are errors whose message is the status line,
    /// e.g. `404 Not Found`.
    pub async fn fetch(&self, input: &AuditInput) -> Result<FetchedPage> {
        let mut request = self.client.get(input.url.clone());
        if let Some(timeout) = input.timeout() {
            request = request.timeout(timeout);
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .with_context(|| format!("request {}", input.url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("{status}");
        }

        let url = response.url().clone();
        let headers = collect_headers(response.headers());
        let body = response.text().await.context("read response body")?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(url = %url, status = status.as_u16(), elapsed_ms, bytes = body.len(), "page fetched");

        Ok(FetchedPage {
            url,
            status: status.as_u16(),
            headers,
            body,
            elapsed_ms,
        })
    }

    /// The `Content-Encoding` a server picks when offered gzip and brotli.
    ///
    /// A non-2xx answer to the HEAD request is an error: its headers say
    /// nothing about how the page itself is served.
    pub async fn content_encoding(&self, url: &Url, timeout: Option<Duration>) -> Result<Option<String>> {
        let mut request = self
            .raw
            .head(url.clone())
            .header(ACCEPT_ENCODING, "gzip, deflate, br");
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.context("compression check")?;
        let status = response.status();
        if !status.is_success() {
            bail!("{status}");
        }
        Ok(response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// GET a JSON document, for third-party APIs.
    pub async fn get_json(&self, url: Url, timeout: Option<Duration>) -> Result<serde_json::Value> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("{status}");
        }
        Ok(response.json().await?)
    }
}
