use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named message broadcast from the backend to attached windows.
///
/// The payload is serialized once at emission and shared by every listener,
/// so delivery never re-encodes per window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Registered event name (e.g. `"time"`)
    pub name: String,

    /// JSON-encoded payload of the registered type
    pub data: serde_json::Value,

    /// Bus-wide emission counter; strictly increasing per bus
    pub sequence: u64,

    /// Wall-clock time the bus accepted the emission
    pub emitted_at: DateTime<Utc>,
}

impl Event {
    /// Decode the payload back into its registered type.
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.data.clone())
    }
}
