//! # Event bus for pushing typed events to windows.
//!
//! [`EventBus`] is a cloneable handle owned by the [`Application`](crate::Application)
//! and passed to whatever needs to publish (the ticker) or attach (window
//! creation). There is one bus per process, but no global.
//!
//! ## Rules
//! - **Typed names**: every event name is registered with exactly one payload
//!   type before it can be emitted. Re-registering with the same type is a no-op.
//! - **Snapshot delivery**: `emit` copies the listener set under a read lock and
//!   delivers without holding it, so attach/detach never wait on delivery.
//! - **Per-producer order**: a single caller's emissions reach each listener in
//!   call order. Nothing is promised across concurrent producers.
//! - **Best effort**: a listener whose channel is closed, or whose owner has
//!   dropped it, is skipped and pruned. Other listeners are unaffected.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, trace};

use super::{Event, Listener, ListenerId};
use crate::error::{BridgeError, Resource, Result};

#[derive(Debug, Clone, Copy)]
struct PayloadType {
    id: TypeId,
    name: &'static str,
}

impl PayloadType {
    fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

#[derive(Default)]
struct BusInner {
    types: RwLock<HashMap<String, PayloadType>>,
    listeners: RwLock<HashMap<ListenerId, Weak<dyn Listener>>>,
    sequence: AtomicU64,
}

/// Process-wide publish handle. Cheap to clone.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `name` carries payloads of type `T`.
    ///
    /// Fails with [`BridgeError::TypeConflict`] if `name` is already bound to a
    /// different type; the existing binding is kept.
    pub fn register_event_type<T>(&self, name: impl Into<String>) -> Result<()>
    where
        T: Serialize + 'static,
    {
        let name = name.into();
        let requested = PayloadType::of::<T>();
        let mut types = write(&self.inner.types);

        if let Some(existing) = types.get(&name) {
            if existing.id == requested.id {
                return Ok(());
            }
            return Err(BridgeError::TypeConflict {
                event: name,
                registered: existing.name,
                requested: requested.name,
            });
        }

        debug!(event = %name, payload = requested.name, "Registered event type");
        types.insert(name, requested);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        read(&self.inner.types).contains_key(name)
    }

    /// Registered event names with their payload type names, sorted by name.
    pub fn event_types(&self) -> Vec<(String, &'static str)> {
        let mut types: Vec<_> = read(&self.inner.types)
            .iter()
            .map(|(name, ty)| (name.clone(), ty.name))
            .collect();
        types.sort();
        types
    }

    /// Attach a listener. The bus keeps only a weak reference; dropping the
    /// last `Arc` detaches it implicitly on the next emission.
    pub fn attach<L>(&self, listener: &Arc<L>)
    where
        L: Listener + 'static,
    {
        let weak: Weak<L> = Arc::downgrade(listener);
        let weak: Weak<dyn Listener> = weak;
        let id = listener.id();
        write(&self.inner.listeners).insert(id, weak);
        debug!(listener = %id, "Listener attached");
    }

    /// Detach a listener. Returns whether it was attached; detaching twice is fine.
    pub fn detach(&self, id: ListenerId) -> bool {
        let removed = write(&self.inner.listeners).remove(&id).is_some();
        if removed {
            debug!(listener = %id, "Listener detached");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        read(&self.inner.listeners).len()
    }

    /// Deliver `payload` as event `name` to every attached listener.
    ///
    /// Returns how many listeners accepted the event. Unknown names and
    /// mistyped payloads fail before anything is delivered.
    pub fn emit<T>(&self, name: &str, payload: &T) -> Result<usize>
    where
        T: Serialize + 'static,
    {
        let registered = read(&self.inner.types)
            .get(name)
            .copied()
            .ok_or_else(|| BridgeError::not_found(Resource::Event, name))?;

        if registered.id != TypeId::of::<T>() {
            return Err(BridgeError::TypeMismatch {
                event: name.to_string(),
                expected: registered.name,
                actual: std::any::type_name::<T>(),
            });
        }

        let data = serde_json::to_value(payload).map_err(|e| {
            BridgeError::invalid_argument(format!("payload for '{}' not serializable: {}", name, e))
        })?;

        let event = Event {
            name: name.to_string(),
            data,
            sequence: self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            emitted_at: Utc::now(),
        };

        Ok(self.deliver(&event))
    }

    fn deliver(&self, event: &Event) -> usize {
        let snapshot: Vec<(ListenerId, Weak<dyn Listener>)> = read(&self.inner.listeners)
            .iter()
            .map(|(id, weak)| (*id, weak.clone()))
            .collect();

        let mut delivered = 0;
        let mut stale = Vec::new();

        for (id, weak) in snapshot {
            let Some(listener) = weak.upgrade() else {
                stale.push(id);
                continue;
            };
            match listener.deliver(event) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    trace!(listener = %id, event = %event.name, error = %err, "Delivery skipped");
                    stale.push(id);
                }
            }
        }

        if !stale.is_empty() {
            let mut listeners = write(&self.inner.listeners);
            for id in &stale {
                listeners.remove(id);
            }
            debug!(pruned = stale.len(), "Pruned unreachable listeners");
        }

        trace!(event = %event.name, sequence = event.sequence, delivered, "Event emitted");
        delivered
    }
}
