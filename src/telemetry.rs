//! Structured logging setup
//!
//! Logs go to stderr so they never mix with command output on stdout.
//! `LEND_LOG` takes an `EnvFilter` directive string and overrides the
//! default level.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "LEND_LOG";

/// Initialize the global subscriber
///
/// `verbose` lowers the default level from `warn` to `debug`; `json` emits
/// one JSON object per event instead of the compact human format.
pub fn init(verbose: bool, json: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))?;

    let registry = tracing_subscriber::registry().with(filter);

    // A second init (e.g. from tests) keeps the first subscriber
    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(verbose, json, "logging initialized");
    }
    Ok(())
}

/// Create a span carrying the common attributes of a catalog operation
pub fn operation_span(operation: &str, actor: &str, task: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "lend_operation",
        operation = operation,
        actor = actor,
        task.id = task,
    )
}
