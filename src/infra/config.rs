//! Configuration loading from TOML files
//!
//! Config file is selected via `--config <path>` (default: config/dev.toml).
//! Raw TOML sections are converted into an immutable `Config`; `validate()`
//! turns it into `Settings` made of checked device values. Anything invalid is
//! rejected there, before the event loop starts.

use crate::domain::error::ConfigError;
use crate::domain::types::{
    BounceWindow, EdgeKind, EqMode, I2cAddress, LogicalEvent, Pin, Pull, TrackCatalog, TrackId,
    Volume,
};
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct CabinetConfig {
    /// Cabinet identifier used in logs
    #[serde(default = "default_cabinet_id")]
    pub id: String,
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self { id: default_cabinet_id() }
    }
}

fn default_cabinet_id() -> String {
    "putt-arcade".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct I2cConfig {
    #[serde(default = "default_i2c_bus")]
    pub bus: u8,
    #[serde(default = "default_relay_address")]
    pub relay_address: i64,
    #[serde(default = "default_audio_address")]
    pub audio_address: i64,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            bus: default_i2c_bus(),
            relay_address: default_relay_address(),
            audio_address: default_audio_address(),
        }
    }
}

fn default_i2c_bus() -> u8 {
    1
}

fn default_relay_address() -> i64 {
    0x18
}

fn default_audio_address() -> i64 {
    0x37
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_volume")]
    pub volume: i64,
    #[serde(default = "default_eq")]
    pub eq: String,
    /// Track played once at startup (omit to stay silent)
    #[serde(default = "default_startup_track")]
    pub startup_track: Option<i64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            eq: default_eq(),
            startup_track: default_startup_track(),
        }
    }
}

fn default_volume() -> i64 {
    3
}

fn default_eq() -> String {
    "normal".to_string()
}

fn default_startup_track() -> Option<i64> {
    Some(1)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracksConfig {
    #[serde(default = "default_greeting_tracks")]
    pub greeting: Vec<i64>,
    #[serde(default = "default_non_sequitur_tracks")]
    pub non_sequitur: Vec<i64>,
    #[serde(default = "default_taunt_tracks")]
    pub taunt: Vec<i64>,
    #[serde(default = "default_congratulation_tracks")]
    pub congratulation: Vec<i64>,
}

impl Default for TracksConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting_tracks(),
            non_sequitur: default_non_sequitur_tracks(),
            taunt: default_taunt_tracks(),
            congratulation: default_congratulation_tracks(),
        }
    }
}

fn default_greeting_tracks() -> Vec<i64> {
    vec![1]
}

fn default_non_sequitur_tracks() -> Vec<i64> {
    (2..=10).collect()
}

fn default_taunt_tracks() -> Vec<i64> {
    (11..=21).collect()
}

fn default_congratulation_tracks() -> Vec<i64> {
    (22..=39).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActuatorConfig {
    /// PWM output driving the obstructor servo
    #[serde(default = "default_servo_pin")]
    pub servo_pin: Pin,
    /// Hold duration of one release step
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self { servo_pin: default_servo_pin(), time_unit_ms: default_time_unit_ms() }
    }
}

fn default_servo_pin() -> Pin {
    Pin(19)
}

fn default_time_unit_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    pub pin: Pin,
    pub event: LogicalEvent,
    #[serde(default = "default_edge")]
    pub edge: EdgeKind,
    #[serde(default = "default_pull")]
    pub pull: Pull,
    #[serde(default = "default_bounce_ms")]
    pub bounce_ms: u64,
}

fn default_edge() -> EdgeKind {
    EdgeKind::Rising
}

fn default_pull() -> Pull {
    Pull::Down
}

fn default_bounce_ms() -> u64 {
    100
}

fn default_sensors() -> Vec<SensorConfig> {
    [
        (17, LogicalEvent::PuttDetected),
        (27, LogicalEvent::CupSink),
        (22, LogicalEvent::RfGreeting),
        (23, LogicalEvent::RfNonSequitur),
        (24, LogicalEvent::RfTaunt),
        (25, LogicalEvent::RfResetState),
    ]
    .into_iter()
    .map(|(pin, event)| SensorConfig {
        pin: Pin(pin),
        event,
        edge: default_edge(),
        pull: default_pull(),
        bounce_ms: default_bounce_ms(),
    })
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Bounded event queue between edge sources and the controller
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: default_queue_capacity() }
    }
}

fn default_queue_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub cabinet: CabinetConfig,
    #[serde(default)]
    pub i2c: I2cConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub tracks: TracksConfig,
    #[serde(default)]
    pub actuator: ActuatorConfig,
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    cabinet_id: String,
    i2c_bus: u8,
    relay_address: i64,
    audio_address: i64,
    volume: i64,
    eq: String,
    startup_track: Option<i64>,
    tracks: TracksConfig,
    servo_pin: Pin,
    time_unit_ms: u64,
    sensors: Vec<SensorConfig>,
    queue_capacity: usize,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cabinet_id: default_cabinet_id(),
            i2c_bus: default_i2c_bus(),
            relay_address: default_relay_address(),
            audio_address: default_audio_address(),
            volume: default_volume(),
            eq: default_eq(),
            startup_track: default_startup_track(),
            tracks: TracksConfig::default(),
            servo_pin: default_servo_pin(),
            time_unit_ms: default_time_unit_ms(),
            sensors: default_sensors(),
            queue_capacity: default_queue_capacity(),
            metrics_interval_secs: default_metrics_interval(),
            config_file: "default".to_string(),
        }
    }
}

/// A pin bound to the one edge polarity and logical event it reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorBinding {
    pub pin: Pin,
    pub event: LogicalEvent,
    pub edge: EdgeKind,
    pub pull: Pull,
    pub bounce: BounceWindow,
}

/// Validated settings, safe to hand to devices and services
#[derive(Debug, Clone)]
pub struct Settings {
    pub i2c_bus: u8,
    pub relay_address: I2cAddress,
    pub audio_address: I2cAddress,
    pub volume: Volume,
    pub eq: EqMode,
    pub startup_track: Option<TrackId>,
    pub catalog: TrackCatalog,
    pub servo_pin: Pin,
    pub time_unit: Duration,
    pub sensors: Vec<SensorBinding>,
    pub queue_capacity: usize,
    pub metrics_interval: Duration,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content, path)
    }

    fn from_toml(content: &str, path: &Path) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            cabinet_id: toml_config.cabinet.id,
            i2c_bus: toml_config.i2c.bus,
            relay_address: toml_config.i2c.relay_address,
            audio_address: toml_config.i2c.audio_address,
            volume: toml_config.audio.volume,
            eq: toml_config.audio.eq,
            startup_track: toml_config.audio.startup_track,
            tracks: toml_config.tracks,
            servo_pin: toml_config.actuator.servo_pin,
            time_unit_ms: toml_config.actuator.time_unit_ms,
            sensors: toml_config.sensors,
            queue_capacity: toml_config.queue.capacity,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration, falling back to defaults only when the file is missing
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(config_file = %path.display(), "config_file_missing: using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    /// Check every configured value and build the runtime settings
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let relay_address = I2cAddress::new("relay", self.relay_address)?;
        let audio_address = I2cAddress::new("audio", self.audio_address)?;
        let volume = Volume::new(self.volume)?;
        let eq: EqMode = self.eq.parse()?;

        let startup_track = match self.startup_track {
            Some(id) => Some(
                u8::try_from(id)
                    .ok()
                    .and_then(TrackId::new)
                    .ok_or(ConfigError::InvalidStartupTrack(id))?,
            ),
            None => None,
        };

        let catalog = TrackCatalog::new(
            &self.tracks.greeting,
            &self.tracks.non_sequitur,
            &self.tracks.taunt,
            &self.tracks.congratulation,
        )?;

        let mut seen = HashSet::new();
        let mut sensors = Vec::with_capacity(self.sensors.len());
        for sensor in &self.sensors {
            if !seen.insert(sensor.pin) {
                return Err(ConfigError::DuplicatePin(sensor.pin));
            }
            if sensor.pin == self.servo_pin {
                return Err(ConfigError::ServoPinConflict(sensor.pin));
            }
            sensors.push(SensorBinding {
                pin: sensor.pin,
                event: sensor.event,
                edge: sensor.edge,
                pull: sensor.pull,
                bounce: BounceWindow::new(sensor.pin, sensor.bounce_ms)?,
            });
        }

        // RF bindings are optional; a cabinet cannot play without both game sensors
        for required in [LogicalEvent::PuttDetected, LogicalEvent::CupSink] {
            if !sensors.iter().any(|s| s.event == required) {
                return Err(ConfigError::MissingBinding(required));
            }
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }

        Ok(Settings {
            i2c_bus: self.i2c_bus,
            relay_address,
            audio_address,
            volume,
            eq,
            startup_track,
            catalog,
            servo_pin: self.servo_pin,
            time_unit: Duration::from_millis(self.time_unit_ms),
            sensors,
            queue_capacity: self.queue_capacity,
            metrics_interval: Duration::from_secs(self.metrics_interval_secs.max(1)),
        })
    }

    // Getters used in startup logging
    pub fn cabinet_id(&self) -> &str {
        &self.cabinet_id
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to override the release step duration
    #[cfg(test)]
    pub fn with_time_unit_ms(mut self, ms: u64) -> Self {
        self.time_unit_ms = ms;
        self
    }

    /// Builder method for tests to set the volume
    #[cfg(test)]
    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = volume;
        self
    }

    /// Builder method for tests to replace the sensor bindings
    #[cfg(test)]
    pub fn with_sensors(mut self, sensors: Vec<SensorConfig>) -> Self {
        self.sensors = sensors;
        self
    }
}
