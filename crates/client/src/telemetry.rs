use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;

/// Install a JSON tracing subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(config: &ClientConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .try_init()
        .is_ok()
}
