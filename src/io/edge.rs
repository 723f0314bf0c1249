//! Edge sink - the hand-off from edge sources to the controller queue
//!
//! Edge sources (GPIO interrupt threads, the console reader) call
//! [`EdgeSink::forward`] for every raw edge. Accepted events are queued with
//! `try_send` so an interrupt thread never blocks; drops are counted in
//! metrics and warned about at most once per second.

use crate::domain::types::{EdgeKind, LogicalEvent, Pin, SensorEvent};
use crate::infra::metrics::Metrics;
use crate::services::dispatcher::SensorEventDispatcher;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// What became of one raw edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    /// Accepted and queued for the controller
    Queued(LogicalEvent),
    /// Unbound pin, wrong polarity or inside the bounce window
    Rejected,
    /// Accepted but the queue was full
    Dropped(LogicalEvent),
    /// The controller is gone
    Closed,
}

pub struct EdgeSink {
    dispatcher: SensorEventDispatcher,
    event_tx: mpsc::Sender<SensorEvent>,
    metrics: Arc<Metrics>,
    last_drop_warn: Mutex<Option<Instant>>,
}

impl EdgeSink {
    pub fn new(
        dispatcher: SensorEventDispatcher,
        event_tx: mpsc::Sender<SensorEvent>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { dispatcher, event_tx, metrics, last_drop_warn: Mutex::new(None) }
    }

    pub fn dispatcher(&self) -> &SensorEventDispatcher {
        &self.dispatcher
    }

    /// Classify one raw edge and queue the resulting event, never blocking
    pub fn forward(&self, pin: Pin, edge: EdgeKind, timestamp: Duration) -> Forwarded {
        let Some(event) = self.dispatcher.on_edge(pin, edge, timestamp) else {
            return Forwarded::Rejected;
        };

        let sensor_event =
            SensorEvent { event, pin, accepted_at: timestamp, received_at: Instant::now() };

        match self.event_tx.try_send(sensor_event) {
            Ok(()) => {
                debug!(pin = %pin, event = event.as_str(), "edge_accepted");
                Forwarded::Queued(event)
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_event_dropped();
                self.warn_dropped(pin, event);
                Forwarded::Dropped(event)
            }
            Err(TrySendError::Closed(_)) => {
                debug!(pin = %pin, "event_channel_closed");
                Forwarded::Closed
            }
        }
    }

    /// Rate-limit drop warnings to 1 per second
    fn warn_dropped(&self, pin: Pin, event: LogicalEvent) {
        let mut last = self.last_drop_warn.lock();
        if last.map_or(true, |at| at.elapsed() > Duration::from_secs(1)) {
            warn!(pin = %pin, event = event.as_str(), "event_dropped: queue full");
            *last = Some(Instant::now());
        }
    }
}
