//! Open windows and their bus listeners.
//!
//! The host owns each window's listener through a [`Window`] guard. Dropping the
//! guard detaches the listener and updates the window count that drives the
//! last-window-closed policy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::events::{ChannelListener, Event, EventBus, Listener, ListenerId};

/// Public description of an open window
#[derive(Debug, Clone, Serialize)]
pub struct WindowInfo {
    pub id: ListenerId,
    pub label: String,
    pub opened_at: DateTime<Utc>,
}

/// Snapshot published whenever a window opens or closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowCount {
    pub open: usize,
    /// Windows ever opened; lets observers tell "none yet" from "all closed"
    pub opened_total: u64,
}

struct WindowSet {
    open: Mutex<HashMap<ListenerId, WindowInfo>>,
    count: watch::Sender<WindowCount>,
}

impl WindowSet {
    fn insert(&self, info: WindowInfo) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        open.insert(info.id, info);
        let len = open.len();
        self.count.send_modify(|count| {
            count.open = len;
            count.opened_total += 1;
        });
    }

    fn remove(&self, id: ListenerId) -> Option<WindowInfo> {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = open.remove(&id);
        let len = open.len();
        self.count.send_modify(|count| count.open = len);
        removed
    }
}

/// Guard for one open window. Dropping it closes the window.
pub struct Window {
    info: WindowInfo,
    listener: Arc<ChannelListener>,
    bus: EventBus,
    set: Arc<WindowSet>,
}

impl Window {
    pub fn id(&self) -> ListenerId {
        self.info.id
    }

    pub fn label(&self) -> &str {
        &self.info.label
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.bus.detach(self.listener.id());
        if self.set.remove(self.info.id).is_some() {
            info!(window = %self.info.label, id = %self.info.id, "Window closed");
        }
    }
}

/// Tracks open windows and attaches each one to the bus.
pub struct WindowManager {
    bus: EventBus,
    set: Arc<WindowSet>,
}

impl WindowManager {
    pub fn new(bus: EventBus) -> Self {
        let (count, _) = watch::channel(WindowCount::default());
        Self {
            bus,
            set: Arc::new(WindowSet {
                open: Mutex::new(HashMap::new()),
                count,
            }),
        }
    }

    /// Open a window: attach a listener and return the guard with its event feed.
    pub fn open(&self, label: impl Into<String>) -> (Window, mpsc::UnboundedReceiver<Event>) {
        let (listener, rx) = ChannelListener::new();
        let listener = Arc::new(listener);
        let info = WindowInfo {
            id: listener.id(),
            label: label.into(),
            opened_at: Utc::now(),
        };

        self.bus.attach(&listener);
        self.set.insert(info.clone());
        info!(window = %info.label, id = %info.id, "Window opened");

        let window = Window {
            info,
            listener,
            bus: self.bus.clone(),
            set: Arc::clone(&self.set),
        };
        (window, rx)
    }

    pub fn count(&self) -> usize {
        self.set.count.borrow().open
    }

    pub fn watch_count(&self) -> watch::Receiver<WindowCount> {
        self.set.count.subscribe()
    }

    pub fn list(&self) -> Vec<WindowInfo> {
        let open = self.set.open.lock().unwrap_or_else(PoisonError::into_inner);
        let mut windows: Vec<WindowInfo> = open.values().cloned().collect();
        windows.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
        windows
    }
}
