//! Observability infrastructure for Lakehold.
//!
//! Structured logging with consistent spans. This module provides the
//! initialization helper and span constructors shared by the catalog and
//! the command-line tool.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
    /// Single-line compact logs (for terminals).
    Compact,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `lakehold_catalog=debug`)
///
/// # Example
///
/// ```rust
/// use lakehold_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    init_logging_with_default(format, "info");
}

/// Initializes logging with an explicit default filter for when `RUST_LOG`
/// is unset.
pub fn init_logging_with_default(format: LogFormat, default_filter: &str) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let registry = tracing_subscriber::registry().with(env_filter);
        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = match format {
            LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
            LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_target(false))
                .try_init(),
        };
    });
}

/// Creates the span covering one lake bootstrap.
///
/// # Example
///
/// ```rust
/// use lakehold_core::observability::bootstrap_span;
///
/// let span = bootstrap_span("sales", "/meta/sales.lake");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn bootstrap_span(lake: &str, metadata_path: &str) -> Span {
    tracing::info_span!("bootstrap", lake = lake, metadata_path = metadata_path)
}

/// Creates a span for a single metadata-store operation.
#[must_use]
pub fn metadata_span(operation: &str, database: &str) -> Span {
    tracing::debug_span!("metadata", op = operation, database = database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_succeeds() {
        // Should not panic (uses Once internally)
        init_logging(LogFormat::Compact);
        init_logging(LogFormat::Json);
    }

    #[test]
    fn test_bootstrap_span_creates_span() {
        let span = bootstrap_span("sales", "/meta/sales.lake");
        let _guard = span.enter();
        tracing::info!("test message in span");
    }

    #[test]
    fn test_metadata_span_creates_span() {
        let span = metadata_span("probe", "__lakehold_metadata_sales");
        let _guard = span.enter();
        tracing::debug!("metadata message");
    }
}
