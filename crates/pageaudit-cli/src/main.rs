//! PageAudit CLI
//!
//! The `pageaudit` command audits a web page for performance, SEO and
//! security problems.
//!
//! ## Commands
//!
//! - `run`: Audit a URL and print or save the report
//! - `list`: Show the registered auditors

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pageaudit_auditors::default_registry;
use pageaudit_core::{
    render_report_markdown, AuditConfig, AuditRequest, AuditService, AuditStatus, ProgressEvent,
    ProgressSink, Report, METRICS,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "pageaudit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent web page auditing (performance, SEO, security)", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a URL
    Run {
        /// Page to audit (http or https)
        url: String,

        /// Comma-separated auditor keys (default: all registered)
        #[arg(short, long, value_delimiter = ',')]
        types: Option<Vec<String>>,

        /// Per-auditor timeout in milliseconds, 0 disables it
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print progress events to stderr as NDJSON
        #[arg(long)]
        stream: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// List registered auditors
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    pageaudit_core::init_tracing(cli.json, level);

    let config = AuditConfig::from_env();

    let outcome = match cli.command {
        Commands::Run {
            url,
            types,
            timeout_ms,
            stream,
            output,
            format,
        } => {
            let mut request = AuditRequest::new(url);
            if let Some(types) = types {
                request = request.with_types(types);
            }
            if let Some(timeout_ms) = timeout_ms {
                request = request.with_timeout_ms(timeout_ms);
            }
            cmd_run(config, request, stream, output.as_deref(), format).await
        }
        Commands::List => cmd_list(&config),
    };

    METRICS.flush();

    match outcome? {
        AuditStatus::Fail => std::process::exit(1),
        AuditStatus::Pass | AuditStatus::Warn => Ok(()),
    }
}

/// Sink writing each progress event as one JSON line on stderr.
fn stderr_sink() -> ProgressSink {
    Arc::new(|event: &ProgressEvent| {
        if let Ok(line) = serde_json::to_string(event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{line}");
        }
    })
}

fn render(report: &Report, format: Format) -> Result<String> {
    match format {
        Format::Json => serde_json::to_string_pretty(report).context("serialize report"),
        Format::Markdown => Ok(render_report_markdown(report)),
    }
}

/// Run an audit; the returned status decides the exit code.
async fn cmd_run(
    config: AuditConfig,
    request: AuditRequest,
    stream: bool,
    output: Option<&Path>,
    format: Format,
) -> Result<AuditStatus> {
    let registry = Arc::new(default_registry(&config)?);
    let service = AuditService::new(registry, config);

    let sink = stream.then(stderr_sink);
    let response = service
        .handle(request, None, sink)
        .await
        .context("audit failed")?;
    let report = response.report;

    let rendered = render(&report, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, &rendered).with_context(|| format!("write {:?}", path))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }

    let status = report.overall_status();
    info!(
        url = %report.url,
        status = %status,
        score = ?report.summary.overall_score,
        failed = report.count_with_status(AuditStatus::Fail),
        "audit finished"
    );
    Ok(status)
}

fn cmd_list(config: &AuditConfig) -> Result<AuditStatus> {
    let registry = default_registry(config)?;
    println!("Registered auditors:");
    for auditor in registry.auditors() {
        println!("  {:<10} {}", auditor.key, auditor.name);
    }
    Ok(AuditStatus::Pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pageaudit_core::{summarize, AuditResult, LogEntry};
    use serde_json::json;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "pageaudit",
            "--verbose",
            "run",
            "https://example.com",
            "--types",
            "perf,seo",
            "--timeout-ms",
            "2500",
            "--format",
            "markdown",
            "--stream",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                url,
                types,
                timeout_ms,
                stream,
                output,
                format,
            } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(types, Some(vec!["perf".to_string(), "seo".to_string()]));
                assert_eq!(timeout_ms, Some(2500));
                assert!(stream);
                assert!(output.is_none());
                assert_eq!(format, Format::Markdown);
            }
            Commands::List => panic!("expected run"),
        }
    }

    #[test]
    fn test_render_formats() {
        let audits = vec![AuditResult::from_logs(
            "seo",
            "SEO",
            json!({ "score": 64 }),
            vec![LogEntry::warning("Missing meta description")],
        )];
        let summary = summarize(&audits);
        let now = chrono::Utc::now();
        let report = Report {
            url: "https://example.com/".to_string(),
            started_at: now,
            finished_at: now,
            audits,
            summary,
        };

        let as_json: serde_json::Value =
            serde_json::from_str(&render(&report, Format::Json).unwrap()).unwrap();
        assert_eq!(as_json["summary"]["overallScore"], 64);

        let as_md = render(&report, Format::Markdown).unwrap();
        assert!(as_md.contains("Missing meta description"));
    }
}
