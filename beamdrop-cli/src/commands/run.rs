//! Launch the application with the web render host.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use beamdrop_core::BeamdropConfig;
use beamdrop_server::WebHost;
use clap::Parser;

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Address to bind to (overrides server.bind)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Serve the UI from this directory instead of the embedded bundle
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Open the window URL in the system browser
    #[arg(long)]
    pub open: bool,

    /// Do not emit time events
    #[arg(long)]
    pub no_ticker: bool,

    /// Keep running after the last window closes
    #[arg(long)]
    pub keep_alive: bool,
}

impl RunArgs {
    fn apply(self, config: &mut BeamdropConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(assets) = self.assets {
            config.server.assets_dir = Some(assets);
        }
        if self.open {
            config.server.open_browser = true;
        }
        if self.no_ticker {
            config.ticker.enabled = false;
        }
        if self.keep_alive {
            config.lifecycle.quit_on_last_window_closed = false;
        }
    }
}

/// Run until quit, last window closed, or a signal. Blocks.
pub async fn run(args: RunArgs, mut config: BeamdropConfig) -> Result<()> {
    args.apply(&mut config);
    tracing::info!("Starting {} on {}", config.app.name, config.server.bind);

    let host = WebHost::new(config.server.clone());
    let app = Arc::new(beamdrop_core::application(config).context("Failed to build application")?);
    app.run(host).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = BeamdropConfig::default();
        RunArgs {
            bind: Some("127.0.0.1:9000".parse().unwrap()),
            assets: Some(PathBuf::from("ui")),
            open: true,
            no_ticker: true,
            keep_alive: true,
        }
        .apply(&mut config);

        assert_eq!(config.server.bind.port(), 9000);
        assert_eq!(config.server.assets_dir, Some(PathBuf::from("ui")));
        assert!(config.server.open_browser);
        assert!(!config.ticker.enabled);
        assert!(!config.lifecycle.quit_on_last_window_closed);
    }

    #[test]
    fn no_flags_keep_config() {
        let mut config = BeamdropConfig::default();
        RunArgs::default().apply(&mut config);
        assert_eq!(config, BeamdropConfig::default());
    }
}
