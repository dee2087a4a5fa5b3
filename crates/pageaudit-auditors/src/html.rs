//! Lightweight regex scanning of HTML documents.
//!
//! Not a parser: enough to pull out tags and attributes the auditors
//! score against.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

macro_rules! html_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

html_pattern!(RE_TITLE, r"(?is)<title\b[^>]*>(.*?)</title\s*>");
html_pattern!(RE_META, r"(?is)<meta\b[^>]*>");
html_pattern!(RE_LINK, r"(?is)<link\b[^>]*>");
html_pattern!(RE_IMG, r"(?is)<img\b[^>]*>");
html_pattern!(RE_SCRIPT, r"(?is)<script\b[^>]*>");
html_pattern!(RE_HTML, r"(?is)<html\b[^>]*>");
html_pattern!(RE_H1, r"(?is)<h1\b[^>]*>");
html_pattern!(
    RE_ATTR,
    r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
);

/// Attributes of one start tag, names lowercased.
pub type Attrs = HashMap<String, String>;

fn find_all<'a>(pattern: &LazyLock<Option<Regex>>, html: &'a str) -> Vec<&'a str> {
    match pattern.as_ref() {
        Some(re) => re.find_iter(html).map(|m| m.as_str()).collect(),
        None => Vec::new(),
    }
}

/// Parse the attributes of a start tag such as `<meta name="x" content="y">`.
pub fn attrs(tag: &str) -> Attrs {
    let Some(re) = RE_ATTR.as_ref() else {
        return Attrs::new();
    };
    // Skip the element name.
    let inner = tag
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    let inner = inner
        .find(char::is_whitespace)
        .map_or("", |idx| &inner[idx..]);

    re.captures_iter(inner)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (name, value.to_string())
        })
        .collect()
}

fn tags_with_attrs(pattern: &LazyLock<Option<Regex>>, html: &str) -> Vec<Attrs> {
    find_all(pattern, html).into_iter().map(attrs).collect()
}

/// Trimmed `<title>` text, if present and non-empty.
pub fn title(html: &str) -> Option<String> {
    let re = RE_TITLE.as_ref()?;
    let caps = re.captures(html)?;
    let text = collapse_whitespace(&caps[1]);
    (!text.is_empty()).then_some(text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `content` of the first `<meta name=..>` or `<meta property=..>` matching `name`.
pub fn meta_content(html: &str, name: &str) -> Option<String> {
    tags_with_attrs(&RE_META, html).into_iter().find_map(|attrs| {
        let key = attrs.get("name").or_else(|| attrs.get("property"))?;
        if key.eq_ignore_ascii_case(name) {
            attrs.get("content").map(|c| c.trim().to_string())
        } else {
            None
        }
    })
}

/// `<link>` tags whose `rel` contains `rel` as a token.
pub fn links_with_rel(html: &str, rel: &str) -> Vec<Attrs> {
    tags_with_attrs(&RE_LINK, html)
        .into_iter()
        .filter(|attrs| {
            attrs.get("rel").is_some_and(|value| {
                value
                    .split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case(rel))
            })
        })
        .collect()
}

/// The `lang` attribute on `<html>`, if non-empty.
pub fn html_lang(html: &str) -> Option<String> {
    let attrs = tags_with_attrs(&RE_HTML, html).into_iter().next()?;
    attrs
        .get("lang")
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

pub fn h1_count(html: &str) -> usize {
    find_all(&RE_H1, html).len()
}

pub fn images(html: &str) -> Vec<Attrs> {
    tags_with_attrs(&RE_IMG, html)
}

pub fn scripts(html: &str) -> Vec<Attrs> {
    tags_with_attrs(&RE_SCRIPT, html)
}

/// External classic scripts that block parsing (no `async`/`defer`, not modules).
pub fn is_render_blocking(script: &Attrs) -> bool {
    script.contains_key("src")
        && !script.contains_key("async")
        && !script.contains_key("defer")
        && !script
            .get("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("module"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<HTML lang="en-GB">
<head>
  <title>
    Example   Domain
  </title>
  <meta charset="utf-8">
  <meta name="Description" content=" An example page. ">
  <meta property="og:title" content='Example'>
  <link rel="canonical" href="https://example.com/">
  <link rel="preload stylesheet" href="/a.css">
  <script src="/app.js"></script>
  <script src="/mod.js" type="module"></script>
  <script async src=/analytics.js></script>
</head>
<body><h1 class="hero">Hi</h1><img src="a.png" alt=""><img src="b.png"></body>
</HTML>"#;

    #[test]
    fn test_title_collapses_whitespace() {
        assert_eq!(title(PAGE).as_deref(), Some("Example Domain"));
        assert_eq!(title("<title>  </title>"), None);
    }

    #[test]
    fn test_meta_lookup_is_case_insensitive() {
        assert_eq!(meta_content(PAGE, "description").as_deref(), Some("An example page."));
        assert_eq!(meta_content(PAGE, "og:title").as_deref(), Some("Example"));
        assert_eq!(meta_content(PAGE, "robots"), None);
    }

    #[test]
    fn test_attrs_handles_quoting_styles() {
        let a = attrs(r#"<img src=a.png alt='x y' data-x="1" hidden>"#);
        assert_eq!(a["src"], "a.png");
        assert_eq!(a["alt"], "x y");
        assert_eq!(a["data-x"], "1");
        assert_eq!(a["hidden"], "");
    }

    #[test]
    fn test_links_and_lang() {
        assert_eq!(links_with_rel(PAGE, "canonical").len(), 1);
        assert_eq!(links_with_rel(PAGE, "stylesheet").len(), 1);
        assert_eq!(html_lang(PAGE).as_deref(), Some("en-GB"));
        assert_eq!(h1_count(PAGE), 1);
    }

    #[test]
    fn test_render_blocking_scripts() {
        let blocking: Vec<_> = scripts(PAGE)
            .into_iter()
            .filter(is_render_blocking)
            .collect();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0]["src"], "/app.js");
    }

    #[test]
    fn test_images_missing_alt() {
        let missing = images(PAGE)
            .iter()
            .filter(|img| !img.contains_key("alt"))
            .count();
        assert_eq!(missing, 1);
    }
}
