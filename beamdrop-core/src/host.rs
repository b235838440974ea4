//! Application host: owns the bus, the service registry and the process lifecycle.
//!
//! ```text
//! Initializing ──start ok──► Running ──quit / last window / host exit──► ShuttingDown ──► Stopped
//!      │                                                                                    ▲
//!      └──────────────────────────── start failed (fatal) ──────────────────────────────────┘
//! ```
//!
//! The windowing side is a [`RenderHost`]: it serves assets, creates the window,
//! forwards page calls to [`Application::invoke`] and attaches pages through
//! [`Application::open_window`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::config::BeamdropConfig;
use crate::error::{BridgeError, Result};
use crate::events::{Event, EventBus};
use crate::services::{Service, ServiceCall, ServiceRegistry};
use crate::ticker::Ticker;
use crate::windows::{Window, WindowManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

impl HostState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostState::Initializing => "initializing",
            HostState::Running => "running",
            HostState::ShuttingDown => "shutting_down",
            HostState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HostState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The window/rendering collaborator.
#[async_trait]
pub trait RenderHost: Send {
    /// Bind the asset server and create the initial window. Errors are fatal.
    async fn start(&mut self, app: Arc<Application>) -> Result<()>;

    /// Dispatch window and page traffic until `shutdown` fires or the host exits.
    async fn run(&mut self, shutdown: CancellationToken) -> Result<()>;
}

/// Collects event types and services before the host starts.
pub struct ApplicationBuilder {
    config: BeamdropConfig,
    bus: EventBus,
    services: ServiceRegistry,
}

impl ApplicationBuilder {
    pub fn register_event<T>(&mut self, name: impl Into<String>) -> Result<&mut Self>
    where
        T: Serialize + 'static,
    {
        self.bus.register_event_type::<T>(name)?;
        Ok(self)
    }

    pub fn register_service<S: Service>(&mut self, service: S) -> Result<&mut Self> {
        self.services.register(service)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Application> {
        self.config.validate()?;
        let (state, _) = watch::channel(HostState::Initializing);
        Ok(Application {
            windows: WindowManager::new(self.bus.clone()),
            config: self.config,
            bus: self.bus,
            services: self.services,
            state,
            invocations: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        })
    }
}

pub struct Application {
    config: BeamdropConfig,
    bus: EventBus,
    services: ServiceRegistry,
    windows: WindowManager,
    state: watch::Sender<HostState>,
    invocations: TaskTracker,
    shutdown: CancellationToken,
}

impl Application {
    pub fn builder(config: BeamdropConfig) -> ApplicationBuilder {
        ApplicationBuilder {
            config,
            bus: EventBus::new(),
            services: ServiceRegistry::new(),
        }
    }

    pub fn config(&self) -> &BeamdropConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn state(&self) -> HostState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<HostState> {
        self.state.subscribe()
    }

    /// Token cancelled when shutdown begins; long-lived page streams end on it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Attach a rendered page. The returned guard closes the window on drop.
    pub fn open_window(&self, label: impl Into<String>) -> (Window, mpsc::UnboundedReceiver<Event>) {
        self.windows.open(label)
    }

    /// Run a page-originated call. Rejected unless the host is running.
    pub fn invoke(&self, call: ServiceCall) -> Result<Value> {
        // Hold the token across the state check so shutdown waits for us.
        let _inflight = self.invocations.token();
        let state = self.state();
        if state != HostState::Running {
            return Err(BridgeError::unavailable(format!("host is {}", state)));
        }

        debug!(service = %call.service, method = %call.method, args = call.args.len(), "Invoking");
        let service = call.service.clone();
        let method = call.method.clone();
        let result = self.services.call(call);
        if let Err(err) = &result {
            debug!(service = %service, method = %method, kind = err.kind(), error = %err, "Invocation failed");
        }
        result
    }

    /// Request a clean shutdown.
    pub fn quit(&self) {
        self.begin_shutdown("quit requested");
    }

    fn begin_shutdown(&self, reason: &str) {
        let entered = self.state.send_if_modified(|state| {
            if *state == HostState::Running {
                *state = HostState::ShuttingDown;
                true
            } else {
                false
            }
        });
        if entered {
            info!(reason, "Shutting down");
        }
        self.shutdown.cancel();
    }

    fn set_state(&self, next: HostState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "Host state changed");
        }
    }

    /// Drive the lifecycle to completion. Blocks until the host has stopped.
    pub async fn run<H: RenderHost>(self: Arc<Self>, mut host: H) -> Result<()> {
        if self.state() != HostState::Initializing {
            return Err(BridgeError::fatal(format!("cannot start a host that is {}", self.state())));
        }
        info!(app = %self.config.app.name, "Starting");

        let ticker = if self.config.ticker.enabled {
            match Ticker::new(self.bus.clone(), &self.config.ticker) {
                Ok(ticker) => Some(ticker),
                Err(err) => return Err(self.fail_start(err)),
            }
        } else {
            None
        };

        if let Err(err) = host.start(Arc::clone(&self)).await {
            return Err(self.fail_start(err));
        }

        self.set_state(HostState::Running);
        info!(
            app = %self.config.app.name,
            services = self.services.len(),
            "Running"
        );

        let ticker = ticker.map(|t| t.spawn(self.shutdown.child_token()));
        let watcher = self
            .config
            .lifecycle
            .quit_on_last_window_closed
            .then(|| tokio::spawn(watch_last_window(Arc::clone(&self))));

        let outcome = host.run(self.shutdown.clone()).await;
        match &outcome {
            Ok(()) => self.begin_shutdown("render host exited"),
            Err(err) => {
                error!(error = %err, "Render host failed");
                self.begin_shutdown("render host failed");
            }
        }

        self.invocations.close();
        self.invocations.wait().await;

        if let Some(handle) = ticker {
            if let Err(err) = handle.await {
                warn!(error = %err, "Ticker task ended abnormally");
            }
        }
        if let Some(handle) = watcher {
            handle.abort();
        }

        self.set_state(HostState::Stopped);
        info!(app = %self.config.app.name, "Stopped");

        outcome.map_err(|err| fatal("run loop exited with an error", err))
    }

    fn fail_start(&self, err: BridgeError) -> BridgeError {
        self.shutdown.cancel();
        self.set_state(HostState::Stopped);
        let err = fatal("startup failed", err);
        error!(error = %err, "Host failed to start");
        err
    }
}

fn fatal(context: &str, err: BridgeError) -> BridgeError {
    if err.is_fatal() {
        err
    } else {
        BridgeError::fatal(format!("{}: {}", context, err))
    }
}

async fn watch_last_window(app: Arc<Application>) {
    let mut count = app.windows.watch_count();
    let grace = app.config.lifecycle.close_grace();

    loop {
        let current = *count.borrow_and_update();
        if current.open == 0 && current.opened_total > 0 {
            let reopened = tokio::time::timeout(grace, count.wait_for(|c| c.open > 0))
                .await
                .map(|waited| waited.is_ok());
            match reopened {
                Ok(true) => continue,
                Ok(false) => return,
                Err(_) => {
                    info!("Last window closed");
                    app.begin_shutdown("last window closed");
                    return;
                }
            }
        }
        if count.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TIME_EVENT;
    use crate::services::GreetService;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Default)]
    struct MockHost {
        fail_start: bool,
        fail_run: bool,
    }

    #[async_trait]
    impl RenderHost for MockHost {
        async fn start(&mut self, _app: Arc<Application>) -> Result<()> {
            if self.fail_start {
                return Err(BridgeError::config("asset handler unavailable"));
            }
            Ok(())
        }

        async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
            if self.fail_run {
                return Err(BridgeError::unavailable("window system went away"));
            }
            shutdown.cancelled().await;
            Ok(())
        }
    }

    fn app() -> Arc<Application> {
        let mut builder = Application::builder(BeamdropConfig::default());
        builder
            .register_event::<String>(TIME_EVENT)
            .unwrap()
            .register_service(GreetService)
            .unwrap();
        Arc::new(builder.build().unwrap())
    }

    async fn wait_running(app: &Application) {
        let mut state = app.subscribe_state();
        state
            .wait_for(|s| *s != HostState::Initializing)
            .await
            .unwrap();
    }

    fn greet() -> ServiceCall {
        ServiceCall::new("GreetService", "Greet", vec![json!("World")])
    }

    #[tokio::test]
    async fn start_failure_is_fatal_and_stops() {
        let app = app();
        let host = MockHost {
            fail_start: true,
            ..MockHost::default()
        };

        let err = Arc::clone(&app).run(host).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("asset handler unavailable"));
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[tokio::test]
    async fn invoke_rejected_before_running() {
        let err = app().invoke(greet()).unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }

    #[tokio::test(start_paused = true)]
    async fn full_lifecycle() {
        let app = app();
        let handle = tokio::spawn(Arc::clone(&app).run(MockHost::default()));
        wait_running(&app).await;
        assert_eq!(app.state(), HostState::Running);

        assert_eq!(app.invoke(greet()).unwrap(), json!("Hello World!"));

        let (_window, mut rx) = app.open_window("main");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, TIME_EVENT);
        assert!(event.payload::<String>().unwrap().ends_with("GMT"));

        app.quit();
        handle.await.unwrap().unwrap();
        assert_eq!(app.state(), HostState::Stopped);
        assert_eq!(app.invoke(greet()).unwrap_err().kind(), "unavailable");
    }

    #[tokio::test(start_paused = true)]
    async fn last_window_closing_ends_the_run() {
        let app = app();
        let handle = tokio::spawn(Arc::clone(&app).run(MockHost::default()));
        wait_running(&app).await;

        let (window, _rx) = app.open_window("main");
        drop(window);

        let outcome = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("host should stop after the grace period");
        outcome.unwrap().unwrap();
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_within_grace_keeps_running() {
        let app = app();
        let handle = tokio::spawn(Arc::clone(&app).run(MockHost::default()));
        wait_running(&app).await;

        let (window, _rx) = app.open_window("main");
        drop(window);
        tokio::time::sleep(Duration::from_millis(500)).await;
        let (_reloaded, _rx) = app.open_window("main");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(app.state(), HostState::Running);

        app.quit();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn run_loop_error_is_fatal() {
        let app = app();
        let host = MockHost {
            fail_run: true,
            ..MockHost::default()
        };

        let err = Arc::clone(&app).run(host).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(app.state(), HostState::Stopped);
    }

    #[tokio::test]
    async fn cannot_run_twice() {
        let app = app();
        let host = MockHost {
            fail_run: true,
            ..MockHost::default()
        };
        let _ = Arc::clone(&app).run(host).await;

        let err = Arc::clone(&app).run(MockHost::default()).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
