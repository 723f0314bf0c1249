//! Actuator worker - runs release cycles off the controller loop
//!
//! A release cycle sleeps for about two time units. This worker decouples it
//! from the controller so RF cues and the cup sensor stay responsive while a
//! ball is in flight. The controller enqueues commands via an mpsc channel;
//! the worker runs them one at a time on the blocking pool.

use crate::infra::metrics::Metrics;
use crate::services::actuator::BallReleaseActuator;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// A release request from the controller
#[derive(Debug)]
pub struct LaunchCmd {
    /// When the command was enqueued (for queue delay measurement)
    pub enqueued_at: Instant,
}

impl LaunchCmd {
    pub fn now() -> Self {
        Self { enqueued_at: Instant::now() }
    }
}

/// Worker that owns the actuator and processes launch commands
pub struct ActuatorWorker {
    actuator: BallReleaseActuator,
    cmd_rx: mpsc::Receiver<LaunchCmd>,
    metrics: Arc<Metrics>,
}

impl ActuatorWorker {
    pub fn new(
        actuator: BallReleaseActuator,
        cmd_rx: mpsc::Receiver<LaunchCmd>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { actuator, cmd_rx, metrics }
    }

    /// Run the worker, processing commands until the channel closes
    pub async fn run(self) {
        let Self { mut actuator, mut cmd_rx, metrics } = self;
        info!("actuator_worker_started");

        if let Err(e) = actuator.park() {
            warn!(error = %e, "obstructor_park_failed");
        }

        while let Some(cmd) = cmd_rx.recv().await {
            let queue_delay_us = cmd.enqueued_at.elapsed().as_micros() as u64;
            let cycle_start = Instant::now();

            let joined = tokio::task::spawn_blocking(move || {
                let result = actuator.launch();
                (actuator, result)
            })
            .await;

            let result = match joined {
                Ok((returned, result)) => {
                    actuator = returned;
                    result
                }
                Err(e) => {
                    error!(error = %e, "actuator_task_panicked");
                    metrics.record_launch_failed();
                    break;
                }
            };

            let cycle_ms = cycle_start.elapsed().as_millis() as u64;
            match result {
                Ok(()) => {
                    metrics.record_launch_ok();
                    info!(queue_delay_us = %queue_delay_us, cycle_ms = %cycle_ms, "launch_completed");
                }
                Err(fault) => {
                    // Game stays Playing; the operator recovers with the reset button
                    metrics.record_launch_failed();
                    error!(
                        error = %fault,
                        queue_delay_us = %queue_delay_us,
                        cycle_ms = %cycle_ms,
                        "launch_fault"
                    );
                }
            }
        }

        info!("actuator_worker_stopped");
    }
}

/// Create a launch command channel and worker
///
/// Returns the sender (for the controller) and the worker (to be spawned)
pub fn create_actuator_worker(
    actuator: BallReleaseActuator,
    metrics: Arc<Metrics>,
    buffer_size: usize,
) -> (mpsc::Sender<LaunchCmd>, ActuatorWorker) {
    let (cmd_tx, cmd_rx) = mpsc::channel(buffer_size);
    let worker = ActuatorWorker::new(actuator, cmd_rx, metrics);
    (cmd_tx, worker)
}
