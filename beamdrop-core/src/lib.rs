//! beamdrop-core: the backend half of the BeamDrop desktop bridge.
//!
//! - [`events`]: typed event bus pushing backend events to attached windows
//! - [`services`]: registry of backend methods callable from rendered pages
//! - [`ticker`]: background producer of `"time"` events
//! - [`host`]: application lifecycle around a pluggable [`RenderHost`]

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod services;
pub mod ticker;
pub mod windows;

pub use config::BeamdropConfig;
pub use error::{BridgeError, Resource, Result};
pub use events::{Event, EventBus, TIME_EVENT};
pub use host::{Application, ApplicationBuilder, HostState, RenderHost};
pub use services::{GreetService, Service, ServiceCall, ServiceRegistry};
pub use ticker::Ticker;
pub use windows::{Window, WindowInfo, WindowManager};

/// Build the BeamDrop application: the ticker's event and the sample service.
pub fn application(config: BeamdropConfig) -> Result<Application> {
    let ticker_event = config.ticker.event.clone();
    let mut builder = Application::builder(config);
    builder
        .register_event::<String>(ticker_event)?
        .register_service(GreetService)?;
    builder.build()
}
