//! Backend-to-frontend event bridge

pub mod bus;
pub mod event;
pub mod listener;

pub use bus::EventBus;
pub use event::Event;
pub use listener::{ChannelListener, DeliveryError, Listener, ListenerId};

/// Event carrying the formatted wall-clock time, emitted by the ticker.
pub const TIME_EVENT: &str = "time";
