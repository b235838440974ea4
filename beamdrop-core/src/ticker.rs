//! Periodic "time" producer.
//!
//! Emits immediately on launch, then once per interval. A failed emit is logged
//! and the loop keeps going. The loop exits when its cancellation token fires.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{is_valid_format, TickerConfig};
use crate::error::{BridgeError, Result};
use crate::events::EventBus;

pub struct Ticker {
    bus: EventBus,
    event: String,
    format: String,
    interval: Duration,
}

impl Ticker {
    /// Fails if the format string or interval is unusable.
    pub fn new(bus: EventBus, config: &TickerConfig) -> Result<Self> {
        if !is_valid_format(&config.format) {
            return Err(BridgeError::config(format!(
                "invalid ticker format '{}'",
                config.format
            )));
        }
        if config.interval_ms == 0 {
            return Err(BridgeError::config("ticker interval must be non-zero"));
        }
        Ok(Self {
            bus,
            event: config.event.clone(),
            format: config.format.clone(),
            interval: config.interval(),
        })
    }

    pub fn format_time(&self, now: DateTime<Utc>) -> String {
        now.format(&self.format).to_string()
    }

    /// Emit one timestamp. Returns the number of windows reached.
    pub fn tick(&self) -> Result<usize> {
        let now = self.format_time(Utc::now());
        self.bus.emit(&self.event, &now)
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(event = %self.event, interval_ms = self.interval.as_millis() as u64, "Ticker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(err) = self.tick() {
                        warn!(event = %self.event, error = %err, "Tick not delivered");
                    }
                }
            }
        }

        debug!(event = %self.event, "Ticker stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
