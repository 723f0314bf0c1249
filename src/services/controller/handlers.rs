//! Side-effect handlers for the Controller
//!
//! A failed side effect is logged and counted; it never stops the loop.

use super::Controller;
use crate::domain::types::{SensorEvent, TrackCategory, TrackId};
use crate::services::actuator_worker::LaunchCmd;
use crate::services::game::{Action, Transition};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info};

impl Controller {
    pub(crate) fn execute(&mut self, action: Action) {
        match action {
            Action::Launch => self.request_launch(),
            Action::Play { category, track } => self.play(category, track),
        }
    }

    /// Hand the release cycle to the actuator worker; the Playing state is
    /// already committed and stays so if the request cannot be queued
    fn request_launch(&mut self) {
        match self.launch_tx.try_send(LaunchCmd::now()) {
            Ok(()) => info!("launch_requested"),
            Err(TrySendError::Full(_)) => {
                self.metrics.record_launch_failed();
                error!("launch_queue_full");
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.record_launch_failed();
                error!("launch_worker_gone");
            }
        }
    }

    fn play(&mut self, category: TrackCategory, track: TrackId) {
        match self.audio.play_track(track) {
            Ok(()) => {
                self.metrics.record_track_played();
                info!(category = category.as_str(), track = %track, "track_played");
            }
            Err(e) => {
                self.metrics.record_audio_error();
                error!(
                    category = category.as_str(),
                    track = %track,
                    error = %e,
                    "track_play_failed"
                );
            }
        }
    }

    pub(crate) fn log_transition(
        &self,
        event: &SensorEvent,
        transition: &Transition,
        queue_delay_us: u64,
    ) {
        if transition.is_ignored() {
            debug!(
                event = event.event.as_str(),
                pin = %event.pin,
                state = transition.from.as_str(),
                "event_ignored"
            );
            return;
        }
        info!(
            event = event.event.as_str(),
            pin = %event.pin,
            from = transition.from.as_str(),
            to = transition.to.as_str(),
            accepted_at_ms = event.accepted_at.as_millis() as u64,
            queue_delay_us = %queue_delay_us,
            "event_processed"
        );
    }
}
