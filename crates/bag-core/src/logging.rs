//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Initialize a tracing subscriber with default configuration.
///
/// Logs go to stderr in compact format. The level comes from `RUST_LOG`,
/// defaulting to `default_level` when unset.
pub fn init(default_level: &str) -> InitResult {
    install(env_filter(default_level, true)?)
}

/// Initialize a tracing subscriber at exactly `level`, ignoring `RUST_LOG`.
pub fn init_at(level: &str) -> InitResult {
    install(env_filter(level, false)?)
}

fn env_filter(
    level: &str,
    prefer_env: bool,
) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    if prefer_env {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
    }
    EnvFilter::try_new(level)
}

fn install(filter_layer: EnvFilter) -> InitResult {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
