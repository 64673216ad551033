//! Tracing subscriber setup

use crate::utils::config::LogLevel;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for `level`; `RUST_LOG` wins when it is set
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

/// Install the global fmt subscriber.
///
/// Returns false if a subscriber was already installed, which happens when
/// tests or an embedding host set one up first.
pub fn init_logging(level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter(level))
        .try_init()
        .is_ok()
}
