//! Game controller and event orchestration
//!
//! The Controller is the single consumer of the event queue. It coordinates:
//! - The game state machine (idle/playing, track rotation)
//! - Audio playback on the audio board
//! - Ball release requests to the actuator worker
//!
//! All game state lives here and is only touched from `process_event`, so no
//! further locking is needed.

mod handlers;
#[cfg(test)]
mod tests;

use crate::domain::types::{EqMode, GameState, SensorEvent, TrackCatalog, TrackId, Volume};
use crate::infra::metrics::Metrics;
use crate::io::devices::AudioDevice;
use crate::services::actuator_worker::LaunchCmd;
use crate::services::game::GameStateMachine;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Audio board settings applied at startup
#[derive(Debug, Clone, Copy)]
pub struct StartupCue {
    pub volume: Volume,
    pub eq: EqMode,
    pub track: Option<TrackId>,
}

pub struct Controller {
    /// State machine and track rotation
    pub(crate) game: GameStateMachine,
    /// Audio board, only driven from this loop
    pub(crate) audio: Box<dyn AudioDevice>,
    /// Launch requests to the actuator worker
    pub(crate) launch_tx: mpsc::Sender<LaunchCmd>,
    pub(crate) metrics: Arc<Metrics>,
}

impl Controller {
    pub fn new(
        catalog: &TrackCatalog,
        audio: Box<dyn AudioDevice>,
        launch_tx: mpsc::Sender<LaunchCmd>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { game: GameStateMachine::new(catalog), audio, launch_tx, metrics }
    }

    pub fn state(&self) -> GameState {
        self.game.state()
    }

    /// Configure the audio board and play the startup cue. Failures are logged.
    pub fn startup(&mut self, cue: StartupCue) {
        if let Err(e) = self.audio.set_volume(cue.volume) {
            warn!(error = %e, volume = cue.volume.get(), "audio_set_volume_failed");
        }
        if let Err(e) = self.audio.set_eq(cue.eq) {
            warn!(error = %e, eq = cue.eq.as_str(), "audio_set_eq_failed");
        }
        if let Some(track) = cue.track {
            match self.audio.play_track(track) {
                Ok(()) => {
                    self.metrics.record_track_played();
                    info!(track = %track, "startup_cue_played");
                }
                Err(e) => {
                    self.metrics.record_audio_error();
                    warn!(error = %e, track = %track, "startup_cue_failed");
                }
            }
        }
    }

    /// Consume events until the channel closes or shutdown is signalled
    pub async fn run(
        &mut self,
        mut event_rx: mpsc::Receiver<SensorEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(e) => self.process_event(e),
                        None => break, // All edge sources gone
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if let Err(e) = self.audio.stop() {
            warn!(error = %e, "audio_stop_failed");
        }
        info!(state = self.state().as_str(), "controller_stopped");
    }

    /// Apply one event to the state machine and carry out its side effect
    pub fn process_event(&mut self, event: SensorEvent) {
        let process_start = Instant::now();
        let queue_delay_us = event.received_at.elapsed().as_micros() as u64;

        let transition = self.game.handle(event.event);
        self.log_transition(&event, &transition, queue_delay_us);

        if let Some(action) = transition.action {
            self.execute(action);
        } else if transition.is_ignored() {
            self.metrics.record_event_ignored();
        }

        let latency_us = process_start.elapsed().as_micros() as u64;
        self.metrics.record_event_processed(latency_us);
    }
}
