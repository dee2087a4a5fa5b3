//! Security auditor: transport and response-header hardening.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use pageaudit_core::{AuditInput, AuditResult, Auditor};

use crate::fetch::{FetchedPage, PageFetcher};
use crate::scorecard::Scorecard;

pub const KEY: &str = "security";
pub const NAME: &str = "Security";

/// Six months, the usual floor for HSTS preload lists.
const MIN_HSTS_MAX_AGE: u64 = 15_552_000;

fn hsts_max_age(value: &str) -> Option<u64> {
    value.split(';').find_map(|directive| {
        let (name, age) = directive.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("max-age")
            .then(|| age.trim().trim_matches('"').parse().ok())
            .flatten()
    })
}

fn discloses_version(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

pub fn analyze(page: &FetchedPage) -> AuditResult {
    let mut card = Scorecard::new();
    let https = page.is_https();
    card.detail("https", https);

    if https {
        card.pass("Page is served over HTTPS");
        match page.header("strict-transport-security") {
            None => card.warn(15, "Missing Strict-Transport-Security header"),
            Some(value) => match hsts_max_age(value) {
                Some(age) if age >= MIN_HSTS_MAX_AGE => card.pass("HSTS is enabled"),
                Some(age) => card.warn(5, format!("HSTS max-age is only {age} seconds")),
                None => card.warn(10, "Strict-Transport-Security has no max-age"),
            },
        }
    } else {
        card.fail(30, "Page is not served over HTTPS");
    }

    let csp = page.header("content-security-policy");
    match csp {
        Some(_) => card.pass("Content-Security-Policy is set"),
        None => card.warn(15, "Missing Content-Security-Policy header"),
    }

    let frame_ancestors = csp.is_some_and(|p| p.to_ascii_lowercase().contains("frame-ancestors"));
    match page.header("x-frame-options") {
        Some(value) => card.pass(format!("X-Frame-Options is {value}")),
        None if frame_ancestors => card.pass("Framing restricted by CSP frame-ancestors"),
        None => card.warn(10, "Missing clickjacking protection (X-Frame-Options or frame-ancestors)"),
    }

    match page.header("x-content-type-options") {
        Some(value) if value.trim().eq_ignore_ascii_case("nosniff") => {
            card.pass("X-Content-Type-Options is nosniff")
        }
        Some(value) => card.warn(10, format!("X-Content-Type-Options is '{value}', expected nosniff")),
        None => card.warn(10, "Missing X-Content-Type-Options header"),
    }

    match page.header("referrer-policy") {
        Some(value) => card.pass(format!("Referrer-Policy is {value}")),
        None => card.warn(5, "Missing Referrer-Policy header"),
    }

    for header in ["server", "x-powered-by"] {
        if let Some(value) = page.header(header).filter(|v| discloses_version(v)) {
            card.detail(header, value);
            card.warn(5, format!("{header} header discloses version: {value}"));
        }
    }

    card.finish(KEY, NAME)
}

/// Security auditor.
pub struct SecurityAuditor {
    fetcher: Arc<PageFetcher>,
}

impl SecurityAuditor {
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Auditor for SecurityAuditor {
    fn key(&self) -> &str {
        KEY
    }

    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &AuditInput) -> Result<AuditResult> {
        let page = self.fetcher.fetch(input).await?;
        Ok(analyze(&page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageaudit_core::{AuditStatus, LogLevel};
    use reqwest::Url;
    use std::collections::HashMap;

    fn page(url: &str, headers: &[(&str, &str)]) -> FetchedPage {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        FetchedPage::new(Url::parse(url).unwrap(), 200, headers, "<html></html>")
    }

    const HARDENED: &[(&str, &str)] = &[
        ("Strict-Transport-Security", "max-age=63072000; includeSubDomains; preload"),
        ("Content-Security-Policy", "default-src 'self'; frame-ancestors 'none'"),
        ("X-Content-Type-Options", "nosniff"),
        ("Referrer-Policy", "strict-origin-when-cross-origin"),
        ("Server", "nginx"),
    ];

    #[test]
    fn test_hardened_https_page_passes() {
        let result = analyze(&page("https://example.com/", HARDENED));
        assert_eq!(result.status, AuditStatus::Pass, "{:?}", result.logs);
        assert_eq!(result.details["score"], 100);
    }

    #[test]
    fn test_plain_http_fails() {
        let result = analyze(&page("http://example.com/", HARDENED));
        assert_eq!(result.status, AuditStatus::Fail);
        assert_eq!(result.details["https"], false);
        assert_eq!(result.details["score"], 70);
    }

    #[test]
    fn test_bare_https_page_warns() {
        let result = analyze(&page("https://example.com/", &[]));
        assert_eq!(result.status, AuditStatus::Warn);
        // hsts 15, csp 15, framing 10, nosniff 10, referrer 5
        assert_eq!(result.details["score"], 45);
        assert!(result.logs.iter().all(|l| l.level != LogLevel::Error));
    }

    #[test]
    fn test_short_hsts_and_version_disclosure() {
        let result = analyze(&page(
            "https://example.com/",
            &[
                ("Strict-Transport-Security", "max-age=3600"),
                ("Content-Security-Policy", "default-src 'self'"),
                ("X-Frame-Options", "DENY"),
                ("X-Content-Type-Options", "nosniff"),
                ("Referrer-Policy", "no-referrer"),
                ("Server", "Apache/2.4.41 (Ubuntu)"),
                ("X-Powered-By", "PHP/7.4.3"),
            ],
        ));
        assert_eq!(result.details["score"], 85);
        assert_eq!(result.details["server"], "Apache/2.4.41 (Ubuntu)");
        assert!(result
            .logs
            .iter()
            .any(|l| l.message == "HSTS max-age is only 3600 seconds"));
    }

    #[test]
    fn test_hsts_max_age_parsing() {
        assert_eq!(hsts_max_age("max-age=31536000; includeSubDomains"), Some(31_536_000));
        assert_eq!(hsts_max_age("includeSubDomains; Max-Age=\"60\""), Some(60));
        assert_eq!(hsts_max_age("includeSubDomains"), None);
    }
}
