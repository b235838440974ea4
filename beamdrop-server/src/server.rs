//! Web render host
//!
//! - Binds a local listener and serves the frontend plus the page API
//! - Each page that opens `/api/events` is one window
//! - Graceful shutdown on host quit, SIGTERM or Ctrl+C

use std::net::SocketAddr;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use beamdrop_core::config::ServerConfig;
use beamdrop_core::{Application, BridgeError, RenderHost, Result};
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{assets, routes};

/// Build the page-facing router for `app`.
pub fn create_router(app: Arc<Application>, config: &ServerConfig) -> Router {
    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::events::router())
        .merge(routes::call::router())
        .merge(routes::app::router())
        .merge(assets::router(config.assets_dir.as_deref()))
        .layer(TraceLayer::new_for_http());

    // Pages are served from our own origin; cross-origin access is opt-in.
    let router = if config.cors_permissive {
        warn!("CORS: Permissive mode enabled - all origins allowed");
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(app)
}

struct Started {
    listener: TcpListener,
    router: Router,
    app: Arc<Application>,
}

/// [`RenderHost`] that renders the window in a browser tab
pub struct WebHost {
    config: ServerConfig,
    started: Option<Started>,
    local_addr: Option<SocketAddr>,
}

impl WebHost {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            started: None,
            local_addr: None,
        }
    }

    /// Bound address, once started. Differs from the configured one for port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

#[async_trait]
impl RenderHost for WebHost {
    async fn start(&mut self, app: Arc<Application>) -> Result<()> {
        if let Some(dir) = &self.config.assets_dir {
            if !dir.is_dir() {
                return Err(BridgeError::fatal(format!(
                    "asset directory {} does not exist",
                    dir.display()
                )));
            }
        }

        let listener = TcpListener::bind(self.config.bind).await.map_err(|e| {
            BridgeError::fatal(format!("failed to bind {}: {}", self.config.bind, e))
        })?;
        let addr = listener
            .local_addr()
            .map_err(|e| BridgeError::fatal(format!("failed to read bound address: {}", e)))?;
        info!("Server listening on {}", addr);

        let window = &app.config().window;
        let url = format!("http://{}{}", addr, window.url);
        info!(
            title = %window.title,
            width = window.width,
            height = window.height,
            url = %url,
            "Window ready"
        );
        if self.config.open_browser {
            open_in_browser(browser_command(), &url);
        }

        let router = create_router(Arc::clone(&app), &self.config);
        self.local_addr = Some(addr);
        self.started = Some(Started {
            listener,
            router,
            app,
        });
        Ok(())
    }

    async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        let Started {
            listener,
            router,
            app,
        } = self
            .started
            .take()
            .ok_or_else(|| BridgeError::fatal("web host was not started"))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(shutdown, app))
            .await
            .map_err(|e| BridgeError::fatal(format!("server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait for the host to quit, or turn Ctrl+C/SIGTERM into a quit.
async fn shutdown_signal(shutdown: CancellationToken, app: Arc<Application>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting shutdown");
            app.quit();
        }
        _ = terminate => {
            info!("Received SIGTERM, starting shutdown");
            app.quit();
        }
    }
}

fn browser_command() -> Command {
    if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    }
}

/// Launch `command url` without waiting for it. Some launchers keep the
/// browser in the foreground, so the exit status is only logged.
fn open_in_browser(mut command: Command, url: &str) {
    let spawned = command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            warn!(url, error = %err, "Failed to launch browser");
            return;
        }
    };
    info!(url, "Opening browser");

    let url = url.to_string();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => debug!(url = %url, "Browser launcher exited"),
            Ok(status) => warn!(url = %url, %status, "Browser launcher exited with an error"),
            Err(err) => warn!(url = %url, error = %err, "Browser launcher failed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamdrop_core::{application, BeamdropConfig, HostState};

    fn config() -> BeamdropConfig {
        let mut config = BeamdropConfig::default();
        config.server.bind = SocketAddr::from(([127, 0, 0, 1], 0));
        config.lifecycle.quit_on_last_window_closed = false;
        config
    }

    #[tokio::test]
    async fn missing_asset_dir_fails_start() {
        let mut config = config();
        config.server.assets_dir = Some("/definitely/not/here".into());
        let host = WebHost::new(config.server.clone());
        let app = Arc::new(application(config).unwrap());

        let err = Arc::clone(&app).run(host).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("asset directory"));
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[tokio::test]
    async fn run_without_start_is_fatal() {
        let mut host = WebHost::new(ServerConfig::default());
        let err = host.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn serves_until_quit() {
        let config = config();
        let host = WebHost::new(config.server.clone());
        let app = Arc::new(application(config).unwrap());

        let handle = tokio::spawn(Arc::clone(&app).run(host));
        let mut state = app.subscribe_state();
        state
            .wait_for(|s| *s == HostState::Running)
            .await
            .unwrap();

        app.quit();
        handle.await.unwrap().unwrap();
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[tokio::test]
    async fn port_in_use_is_fatal() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = config();
        config.server.bind = taken.local_addr().unwrap();
        let app = Arc::new(application(config.clone()).unwrap());

        let err = Arc::clone(&app)
            .run(WebHost::new(config.server))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_launcher_does_not_hold_startup() {
        let mut launcher = Command::new("sh");
        launcher.args(["-c", "sleep 5"]);

        let started = std::time::Instant::now();
        open_in_browser(launcher, "http://127.0.0.1:1/");
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[tokio::test]
    async fn missing_launcher_is_not_an_error() {
        open_in_browser(Command::new("beamdrop-no-such-launcher"), "http://127.0.0.1:1/");
    }
}
