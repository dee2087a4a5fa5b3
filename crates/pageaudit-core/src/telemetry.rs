//! Process-wide log subscriber for the `pageaudit` binaries.
//!
//! Everything is written to stderr; stdout carries reports only.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter from `RUST_LOG`, or `fallback` when unset or unparsable.
fn filter_or(fallback: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback.as_str()))
}

/// Install the global subscriber, as JSON lines when `json` is set.
///
/// Returns `false` when a subscriber was already installed; the existing one
/// is kept.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let json_layer = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter_or(level))
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_keeps_the_first() {
        init_tracing(false, Level::WARN);
        assert!(!init_tracing(true, Level::DEBUG));
    }
}
