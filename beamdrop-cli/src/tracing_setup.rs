//! Tracing setup for the beamdrop CLI
//!
//! Usage:
//!   beamdrop --debug ...               # Debug logging to console
//!   RUST_LOG=beamdrop_core=trace ...   # Fine-grained log control
//!
//! Without `RUST_LOG` the filter comes from `--debug`, then `logging.level`.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Enable debug logging (overrides the configured level)
    pub debug: bool,
    /// Level from the config file
    pub level: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: "info".to_string(),
        }
    }
}

impl TracingConfig {
    fn directive(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.level
        }
    }
}

/// Initialize console tracing. Logs go to stderr so command output stays clean.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directive()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug) // Show targets in debug mode
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_overrides_level() {
        let config = TracingConfig {
            debug: true,
            level: "warn".into(),
        };
        assert_eq!(config.directive(), "debug");
    }

    #[test]
    fn level_used_without_debug() {
        let config = TracingConfig {
            debug: false,
            level: "warn".into(),
        };
        assert_eq!(config.directive(), "warn");
    }
}
