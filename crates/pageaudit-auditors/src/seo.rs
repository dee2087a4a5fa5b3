//! SEO auditor: on-page metadata search engines rely on.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use pageaudit_core::{AuditInput, AuditResult, Auditor};

use crate::fetch::{FetchedPage, PageFetcher};
use crate::html;
use crate::scorecard::Scorecard;

pub const KEY: &str = "seo";
pub const NAME: &str = "SEO";

const TITLE_LEN: std::ops::RangeInclusive<usize> = 10..=60;
const DESCRIPTION_LEN: std::ops::RangeInclusive<usize> = 50..=160;

fn is_noindex(directives: &str) -> bool {
    directives
        .split(',')
        .any(|d| matches!(d.trim().to_ascii_lowercase().as_str(), "noindex" | "none"))
}

pub fn analyze(page: &FetchedPage) -> AuditResult {
    let body = &page.body;
    let mut card = Scorecard::new();

    match html::title(body) {
        None => card.fail(25, "Page has no <title>"),
        Some(title) => {
            let len = title.chars().count();
            card.detail("title", title.as_str());
            if TITLE_LEN.contains(&len) {
                card.pass(format!("Title is {len} characters"));
            } else {
                card.warn(
                    10,
                    format!("Title is {len} characters (aim for {}-{})", TITLE_LEN.start(), TITLE_LEN.end()),
                );
            }
        }
    }

    match html::meta_content(body, "description").filter(|d| !d.is_empty()) {
        None => card.warn(15, "Missing meta description"),
        Some(description) => {
            let len = description.chars().count();
            card.detail("descriptionLength", len);
            if DESCRIPTION_LEN.contains(&len) {
                card.pass("Meta description present");
            } else {
                card.warn(
                    5,
                    format!(
                        "Meta description is {len} characters (aim for {}-{})",
                        DESCRIPTION_LEN.start(),
                        DESCRIPTION_LEN.end()
                    ),
                );
            }
        }
    }

    let h1 = html::h1_count(body);
    card.detail("h1Count", h1);
    match h1 {
        0 => card.warn(10, "Page has no <h1>"),
        1 => card.pass("Page has a single <h1>"),
        n => card.warn(5, format!("Page has {n} <h1> elements")),
    }

    match html::links_with_rel(body, "canonical").first().and_then(|l| l.get("href")) {
        Some(href) => {
            card.detail("canonical", href.as_str());
            card.pass("Canonical link present");
        }
        None => card.warn(5, "Missing canonical link"),
    }

    match html::html_lang(body) {
        Some(lang) => {
            card.detail("lang", lang.as_str());
            card.pass(format!("Document language is {lang}"));
        }
        None => card.warn(5, "Missing lang attribute on <html>"),
    }

    if html::meta_content(body, "viewport").is_some() {
        card.pass("Viewport meta tag present");
    } else {
        card.warn(10, "Missing viewport meta tag");
    }

    let images = html::images(body);
    let missing_alt = images.iter().filter(|img| !img.contains_key("alt")).count();
    card.detail("imageCount", images.len());
    card.detail("imagesMissingAlt", missing_alt);
    if missing_alt > 0 {
        let penalty = (missing_alt as i64 * 2).min(10);
        card.warn(penalty, format!("{missing_alt} image(s) missing alt text"));
    }

    let meta_noindex = html::meta_content(body, "robots").is_some_and(|r| is_noindex(&r));
    let header_noindex = page.header("x-robots-tag").is_some_and(is_noindex);
    if meta_noindex || header_noindex {
        card.fail(30, "Page is excluded from indexing (noindex)");
    }

    card.finish(KEY, NAME)
}

/// SEO auditor.
pub struct SeoAuditor {
    fetcher: Arc<PageFetcher>,
}

impl SeoAuditor {
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Auditor for SeoAuditor {
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
    use pageaudit_core::AuditStatus;
    use reqwest::Url;
    use std::collections::HashMap;

    const GOOD: &str = r#"<html lang="en"><head>
<title>Example Domain for documentation</title>
<meta name="description" content="This domain is for use in illustrative examples in documents and tutorials.">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="canonical" href="https://example.com/">
</head><body><h1>Example</h1><img src="a.png" alt="diagram"></body></html>"#;

    fn page(body: &str, headers: &[(&str, &str)]) -> FetchedPage {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        FetchedPage::new(Url::parse("https://example.com/").unwrap(), 200, headers, body)
    }

    #[test]
    fn test_well_formed_page_passes() {
        let result = analyze(&page(GOOD, &[]));
        assert_eq!(result.status, AuditStatus::Pass, "{:?}", result.logs);
        assert_eq!(result.details["score"], 100);
        assert_eq!(result.details["canonical"], "https://example.com/");
    }

    #[test]
    fn test_missing_title_fails() {
        let result = analyze(&page("<html><body></body></html>", &[]));
        assert_eq!(result.status, AuditStatus::Fail);
        assert!(result.logs.iter().any(|l| l.message == "Page has no <title>"));
        // title 25, description 15, h1 10, canonical 5, lang 5, viewport 10
        assert_eq!(result.details["score"], 30);
    }

    #[test]
    fn test_noindex_header_fails() {
        let result = analyze(&page(GOOD, &[("X-Robots-Tag", "noindex, nofollow")]));
        assert_eq!(result.status, AuditStatus::Fail);
        assert_eq!(result.details["score"], 70);
    }

    #[test]
    fn test_noindex_meta_fails() {
        let body = GOOD.replace("</head>", r#"<meta name="robots" content="none"></head>"#);
        assert_eq!(analyze(&page(&body, &[])).status, AuditStatus::Fail);
    }

    #[test]
    fn test_missing_alt_penalty_is_capped() {
        let imgs: String = (0..8).map(|i| format!(r#"<img src="{i}.png">"#)).collect();
        let body = GOOD.replace("</body>", &format!("{imgs}</body>"));
        let result = analyze(&page(&body, &[]));
        assert_eq!(result.status, AuditStatus::Warn);
        assert_eq!(result.details["imagesMissingAlt"], 8);
        assert_eq!(result.details["score"], 90);
    }

    #[test]
    fn test_multiple_h1_warns() {
        let body = GOOD.replace("<h1>Example</h1>", "<h1>A</h1><h1>B</h1>");
        let result = analyze(&page(&body, &[]));
        assert_eq!(result.status, AuditStatus::Warn);
        assert_eq!(result.details["h1Count"], 2);
    }
}
