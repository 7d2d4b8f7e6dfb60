//! Logging setup for providers.
//!
//! Providers log through the `tracing` ecosystem. All output goes to
//! **stderr**: stdout carries the handshake line and nothing else.
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_provider_sdk::{serve, init_logging};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), strata_provider_sdk::ProviderError> {
//!     // Initialize logging (reads RUST_LOG env var)
//!     init_logging();
//!
//!     tracing::info!("Starting provider");
//!     serve(MyProvider).await
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: controls log levels (e.g., `info`, `debug`,
//!   `my_provider=debug`)
//! - `STRATA_LOG_PROVIDER_SDK`: raises the level of the SDK's own dispatch
//!   spans without touching the rest of the filter, e.g.
//!   `STRATA_LOG_PROVIDER_SDK=trace` while `RUST_LOG=info`
//!
//! Per-request context is carried by the spans the dispatch layer opens
//! around each RPC; nothing needs to be threaded through handler arguments.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that raises the SDK's own log level independently
/// of `RUST_LOG`.
pub const ENV_LOG_SDK: &str = "STRATA_LOG_PROVIDER_SDK";

fn env_filter(default_level: &str) -> EnvFilter {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A dedicated variable for the SDK target, so provider authors can turn
    // dispatch tracing up without drowning in their own debug output.
    if let Ok(level) = std::env::var(ENV_LOG_SDK) {
        if let Ok(directive) = format!("strata_provider_sdk={}", level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    filter
}

/// Initialize the default logging subscriber.
///
/// This sets up a `tracing` subscriber that:
/// - Writes to **stderr** (stdout is reserved for the handshake)
/// - Respects `RUST_LOG` and [`ENV_LOG_SDK`] for filtering
/// - Defaults to `info` level if `RUST_LOG` is not set
/// - Uses a compact, human-readable format
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level.
///
/// Like [`init_logging`], but `default_level` is used when `RUST_LOG` is
/// not set (e.g. "debug", "info", "warn").
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Unlike [`init_logging`], this does not panic when a subscriber has
/// already been set. Useful in tests or when the provider might be
/// initialized more than once.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so these
    // tests only cover filter construction.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("debug").is_ok());
        assert!(EnvFilter::try_new("strata_provider_sdk=debug").is_ok());
        assert!(EnvFilter::try_new("warn,strata_provider_sdk=debug").is_ok());
    }

    #[test]
    fn test_sdk_directive_parses() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let directive = format!("strata_provider_sdk={}", level);
            assert!(
                directive.parse::<tracing_subscriber::filter::Directive>().is_ok(),
                "directive {:?} should parse",
                directive
            );
        }
    }
}
