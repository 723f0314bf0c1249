//! Raw pin edges to logical events, with per-pin software debounce
//!
//! Edge callbacks arrive on independent interrupt threads. The pin map is
//! built once and never changes; each pin's debounce record sits behind its
//! own lock, so a discarded edge on one pin never touches another pin.

use crate::domain::types::{BounceWindow, EdgeKind, LogicalEvent, Pin};
use crate::infra::config::SensorBinding;
use crate::infra::metrics::Metrics;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Last accepted edge on one pin
#[derive(Debug, Default)]
struct DebounceRecord {
    last_accepted: Option<Duration>,
}

#[derive(Debug)]
struct PinSlot {
    edge: EdgeKind,
    event: LogicalEvent,
    bounce: BounceWindow,
    record: Mutex<DebounceRecord>,
}

pub struct SensorEventDispatcher {
    pins: FxHashMap<Pin, PinSlot>,
    metrics: Arc<Metrics>,
}

impl SensorEventDispatcher {
    pub fn new(bindings: &[SensorBinding], metrics: Arc<Metrics>) -> Self {
        let pins = bindings
            .iter()
            .map(|b| {
                let slot = PinSlot {
                    edge: b.edge,
                    event: b.event,
                    bounce: b.bounce,
                    record: Mutex::new(DebounceRecord::default()),
                };
                (b.pin, slot)
            })
            .collect();
        Self { pins, metrics }
    }

    /// Classify an edge; `None` when it is unbound, of the wrong polarity,
    /// or inside the pin's bounce window
    pub fn on_edge(&self, pin: Pin, edge: EdgeKind, timestamp: Duration) -> Option<LogicalEvent> {
        let Some(slot) = self.pins.get(&pin) else {
            trace!(pin = %pin, "edge_unbound_pin");
            self.metrics.record_edge_rejected();
            return None;
        };

        if edge != slot.edge {
            trace!(pin = %pin, edge = edge.as_str(), "edge_wrong_polarity");
            self.metrics.record_edge_rejected();
            return None;
        }

        let mut record = slot.record.lock();
        if let Some(last) = record.last_accepted {
            // Also rejects timestamps older than the last accepted edge
            let within_window = timestamp
                .checked_sub(last)
                .map_or(true, |elapsed| elapsed < slot.bounce.duration());
            if within_window {
                trace!(pin = %pin, "edge_debounced");
                self.metrics.record_edge_rejected();
                return None;
            }
        }
        record.last_accepted = Some(timestamp);
        drop(record);

        self.metrics.record_edge_accepted();
        Some(slot.event)
    }

    /// Pin and polarity bound to `event`, if any (lowest pin first)
    pub fn binding_for(&self, event: LogicalEvent) -> Option<(Pin, EdgeKind)> {
        self.pins
            .iter()
            .filter(|(_, slot)| slot.event == event)
            .map(|(pin, slot)| (*pin, slot.edge))
            .min_by_key(|(pin, _)| *pin)
    }

    /// Last accepted timestamp on `pin`
    #[cfg(test)]
    fn last_accepted(&self, pin: Pin) -> Option<Duration> {
        self.pins.get(&pin).and_then(|slot| slot.record.lock().last_accepted)
    }
}
