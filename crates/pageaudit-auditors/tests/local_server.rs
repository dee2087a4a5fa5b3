//! Built-in auditors against a throwaway local HTTP server.

use std::time::Duration;

use pageaudit_auditors::{default_registry, PageFetcher};
use pageaudit_core::{run_audits, AuditConfig, AuditRequest, AuditStatus, RunOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PAGE: &str = r#"<!doctype html><html lang="en"><head>
<title>Local fixture page for audits</title>
<meta name="description" content="A small page served from a local socket so the auditors have something real to fetch.">
<meta name="viewport" content="width=device-width">
<link rel="canonical" href="http://127.0.0.1/">
</head><body><h1>Fixture</h1></body></html>"#;

/// Serve `response` to every connection; returns the base URL.
async fn serve(status_line: &'static str, headers: &'static str, body: &'static str, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n{headers}\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}/")
}

/// Serve `PAGE` to GET but answer HEAD with `405 Method Not Allowed`.
async fn serve_without_head() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let response = if buf[..n].starts_with(b"HEAD ") {
                    "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                } else {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{PAGE}",
                        PAGE.len()
                    )
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}/")
}

fn config() -> AuditConfig {
    AuditConfig::default().with_timeout_ms(5_000)
}

#[tokio::test]
async fn test_builtins_audit_a_real_page() {
    let url = serve("200 OK", "X-Content-Type-Options: nosniff\r\n", PAGE, Duration::ZERO).await;
    let registry = default_registry(&config()).unwrap();

    let report = run_audits(
        &registry,
        AuditRequest::new(url).with_timeout_ms(5_000),
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.keys(), vec!["perf", "seo", "security"]);

    let seo = report.audit("seo").unwrap();
    assert_eq!(seo.status, AuditStatus::Pass, "{:?}", seo.logs);

    // Plain http is an error for the security auditor.
    let security = report.audit("security").unwrap();
    assert_eq!(security.status, AuditStatus::Fail);

    let perf = report.audit("perf").unwrap();
    assert_ne!(perf.status, AuditStatus::Fail, "{:?}", perf.logs);
    assert!(perf.details["responseTimeMs"].is_u64());

    assert!(report.summary.overall_score.is_some());
}

#[tokio::test]
async fn test_http_error_becomes_failed_result() {
    let url = serve("404 Not Found", "", "gone", Duration::ZERO).await;
    let registry = default_registry(&config()).unwrap();

    let report = run_audits(
        &registry,
        AuditRequest::new(url).with_types(["seo", "security"]),
        &RunOptions::default(),
    )
    .await
    .unwrap();

    for audit in &report.audits {
        assert_eq!(audit.status, AuditStatus::Fail);
        assert_eq!(audit.logs.len(), 1);
        assert_eq!(audit.logs[0].message, "404 Not Found");
        assert_eq!(audit.details, serde_json::json!({}));
    }
    assert_eq!(report.summary.overall_score, None);
    assert_eq!(report.summary.error_count, 2);
}

#[tokio::test]
async fn test_timeout_is_reported_per_auditor() {
    let url = serve("200 OK", "", PAGE, Duration::from_secs(5)).await;
    let registry = default_registry(&config()).unwrap();

    let report = run_audits(
        &registry,
        AuditRequest::new(url).with_types(["seo"]).with_timeout_ms(200),
        &RunOptions::default(),
    )
    .await
    .unwrap();

    let seo = report.audit("seo").unwrap();
    assert_eq!(seo.status, AuditStatus::Fail);
    assert!(!seo.logs[0].message.is_empty());
}

#[tokio::test]
async fn test_content_encoding_reports_header() {
    let url = serve("200 OK", "Content-Encoding: gzip\r\n", "", Duration::ZERO).await;
    let fetcher = PageFetcher::new("pageaudit-test").unwrap();
    let encoding = fetcher
        .content_encoding(&url.parse().unwrap(), Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(encoding.as_deref(), Some("gzip"));
}

#[tokio::test]
async fn test_content_encoding_rejects_error_status() {
    let url = serve_without_head().await;
    let fetcher = PageFetcher::new("pageaudit-test").unwrap();
    let err = fetcher
        .content_encoding(&url.parse().unwrap(), Some(Duration::from_secs(5)))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "405 Method Not Allowed");
}

#[tokio::test]
async fn test_rejected_head_does_not_penalise_compression() {
    let url = serve_without_head().await;
    let registry = default_registry(&config()).unwrap();

    let report = run_audits(
        &registry,
        AuditRequest::new(url).with_types(["perf"]).with_timeout_ms(5_000),
        &RunOptions::default(),
    )
    .await
    .unwrap();

    let perf = report.audit("perf").unwrap();
    let messages: Vec<&str> = perf.logs.iter().map(|l| l.message.as_str()).collect();
    assert!(messages.contains(&"Compression could not be determined"), "{messages:?}");
    assert!(!messages.contains(&"Response is not compressed"));
    assert_eq!(perf.status, AuditStatus::Pass, "{messages:?}");
}
