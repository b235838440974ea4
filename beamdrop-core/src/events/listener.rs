//! Listener side of the event bus.
//!
//! A listener is the delivery endpoint of one attached window. The bus never
//! owns listeners; it keeps a `Weak` handle and prunes entries whose owner is gone.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::Event;

/// Identity of an attached listener (one per window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery to one listener failed; the bus swallows it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("listener channel closed")]
    Closed,
}

/// Receives events from the bus.
///
/// `deliver` is called synchronously from `emit` and must not block: hand the
/// event to a queue and return.
pub trait Listener: Send + Sync {
    fn id(&self) -> ListenerId;

    fn deliver(&self, event: &Event) -> Result<(), DeliveryError>;
}

/// Listener backed by an unbounded tokio channel.
///
/// The receiving half is drained by whatever renders the window; FIFO channel
/// order is what gives each window the publisher's emission order.
pub struct ChannelListener {
    id: ListenerId,
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Self {
            id: ListenerId::new(),
            tx,
        };
        (listener, rx)
    }
}

impl Listener for ChannelListener {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        self.tx.send(event.clone()).map_err(|_| DeliveryError::Closed)
    }
}
