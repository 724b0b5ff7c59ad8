//! Logging setup

use tracing_subscriber::EnvFilter;

use crate::config;

/// Filter directive: `RUST_LOG` when set, else the configured `log_level`
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::settings().log_level))
}

/// Install a fmt subscriber for the process.
///
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init();
        assert!(!init());
        tracing::debug!("logging initialized");
    }
}
