//! Tracing setup. Logs go to stderr so stdout stays machine-readable.

use crate::domain::error::DomainError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `log_level` overrides `RUST_LOG`
/// (default `info`).
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> Result<(), DomainError> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| DomainError::InvalidInput(format!("Invalid log filter: {e}")))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!no_color && std::env::var_os("NO_COLOR").is_none());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| DomainError::InvalidInput(format!("Failed to init logging: {e}")))
}
