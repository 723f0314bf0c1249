//! Error taxonomy for configuration, device IO and the release actuator

use crate::domain::types::{LogicalEvent, Pin, TrackCategory};
use thiserror::Error;

/// Rejected configuration, fatal before the event loop starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid volume level {0} (expected 0..=31)")]
    InvalidVolume(i64),

    #[error("invalid I2C address {address:#x} for {device} (expected 0x07..=0x78)")]
    InvalidAddress { device: &'static str, address: i64 },

    #[error("invalid EQ setting '{0}'")]
    InvalidEq(String),

    #[error("invalid track id {id} in category {category} (expected 1..=255)")]
    InvalidTrackId { category: TrackCategory, id: i64 },

    #[error("invalid startup track {0} (expected 1..=255)")]
    InvalidStartupTrack(i64),

    #[error("track category {0} has no tracks")]
    EmptyCategory(TrackCategory),

    #[error("bounce window of {ms}ms on pin {pin} out of range (expected 100..=1000)")]
    InvalidBounceWindow { pin: Pin, ms: u64 },

    #[error("pin {0} is bound more than once")]
    DuplicatePin(Pin),

    #[error("no sensor pin bound to {0}")]
    MissingBinding(LogicalEvent),

    #[error("servo pin {0} is also bound as a sensor input")]
    ServoPinConflict(Pin),

    #[error("event queue capacity must be at least 1")]
    InvalidQueueCapacity,
}

/// Bus-level failure talking to a device
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceIoError {
    #[error("I2C write to {address:#04x} failed: {reason}")]
    Bus { address: u8, reason: String },

    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("PWM error: {0}")]
    Pwm(String),
}

/// A release cycle that could not be completed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActuatorFault {
    #[error("relay {action} failed")]
    Relay {
        action: &'static str,
        #[source]
        source: DeviceIoError,
    },

    #[error("obstructor drive to {duty}% failed")]
    Pwm {
        duty: f64,
        #[source]
        source: DeviceIoError,
    },
}
