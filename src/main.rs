//! Putt arcade cabinet controller
//!
//! Watches the putt and cup sensors plus the RF remote, releases one ball per
//! game and plays audio cues.
//!
//! Module structure:
//! - `domain/` - Core types (events, game state, tracks, errors)
//! - `io/` - Hardware interfaces (I2C boards, servo, edge sources)
//! - `services/` - Game logic (dispatcher, state machine, actuator, controller)
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use clap::Parser;
use putt_arcade::infra::{Config, Metrics, SensorBinding};
use putt_arcade::io::{EdgeSink, Mp3Trigger, QwiicRelay};
use putt_arcade::services::{
    create_actuator_worker, BallReleaseActuator, Controller, SensorEventDispatcher, StartupCue,
};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Putt arcade - cabinet controller
#[derive(Parser, Debug)]
#[command(name = "putt-arcade", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

/// Launch commands waiting for the actuator; one game needs one
const LAUNCH_QUEUE_SIZE: usize = 4;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Default: INFO, use RUST_LOG=debug for every accepted edge and bus write
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);
    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let started_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        started_at = %started_at,
        "putt-arcade starting"
    );

    let config =
        Config::load_from_path(&args.config).context("failed to load configuration")?;
    let settings = config.validate().context("invalid configuration")?;

    info!(
        config_file = %config.config_file(),
        cabinet_id = %config.cabinet_id(),
        i2c_bus = %settings.i2c_bus,
        relay_address = %settings.relay_address,
        audio_address = %settings.audio_address,
        volume = %settings.volume.get(),
        eq = %settings.eq.as_str(),
        servo_pin = %settings.servo_pin,
        time_unit_ms = %settings.time_unit.as_millis(),
        sensors = %settings.sensors.len(),
        queue_capacity = %settings.queue_capacity,
        "config_loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(Metrics::new());

    // Devices: relay and servo belong to the actuator, the MP3 board to the controller
    let bus = putt_arcade::io::open_bus(settings.i2c_bus).context("failed to open I2C bus")?;
    let relay = QwiicRelay::new(bus.clone(), settings.relay_address);
    let audio = Mp3Trigger::new(bus, settings.audio_address);
    let servo = putt_arcade::io::open_servo(settings.servo_pin).context("failed to open servo")?;

    // Start actuator worker
    let actuator = BallReleaseActuator::new(Box::new(relay), servo, settings.time_unit);
    let (launch_tx, actuator_worker) =
        create_actuator_worker(actuator, metrics.clone(), LAUNCH_QUEUE_SIZE);
    let actuator_handle = tokio::spawn(actuator_worker.run());

    // Create event queue (bounded, edges are dropped when full)
    let (event_tx, event_rx) = mpsc::channel(settings.queue_capacity);
    let dispatcher = SensorEventDispatcher::new(&settings.sensors, metrics.clone());
    let sink = Arc::new(EdgeSink::new(dispatcher, event_tx, metrics.clone()));

    // Start edge source; dropping it disarms the pins
    let _edge_source = start_edge_source(&settings.sensors, sink, shutdown_rx.clone())?;

    // Start metrics reporter (lock-free reads)
    let reporter_metrics = metrics.clone();
    let metrics_interval = settings.metrics_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(metrics_interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            reporter_metrics.report().log();
        }
    });

    // Handle shutdown on Ctrl+C or SIGTERM
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let mut controller =
        Controller::new(&settings.catalog, Box::new(audio), launch_tx, metrics.clone());
    controller.startup(StartupCue {
        volume: settings.volume,
        eq: settings.eq,
        track: settings.startup_track,
    });
    info!("controller_started");

    // Run controller - consumes events until shutdown
    controller.run(event_rx, shutdown_rx).await;

    // Dropping the controller closes the launch queue; an in-flight release finishes
    drop(controller);
    if let Err(e) = actuator_handle.await {
        error!(error = %e, "actuator_worker_join_failed");
    }

    metrics.report().log();
    info!("putt-arcade shutdown complete");
    Ok(())
}

#[cfg(feature = "rpi")]
fn start_edge_source(
    sensors: &[SensorBinding],
    sink: Arc<EdgeSink>,
    _shutdown: watch::Receiver<bool>,
) -> anyhow::Result<putt_arcade::io::rpi::GpioEdgeSource> {
    let source = putt_arcade::io::rpi::GpioEdgeSource::start(sensors, sink)
        .context("failed to arm GPIO edge source")?;
    info!(pins = source.pin_count(), "gpio_edge_source_started");
    Ok(source)
}

#[cfg(not(feature = "rpi"))]
fn start_edge_source(
    _sensors: &[SensorBinding],
    sink: Arc<EdgeSink>,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(putt_arcade::io::console::run_stdin_source(sink, shutdown)))
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            error!(error = %e, "sigterm_handler_failed");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}
