//! Capability traits for the cabinet hardware
//!
//! The controller and actuator only see these traits. Hardware adapters
//! (`qwiic`, `rpi`), the console backend and the test fakes implement them.

use crate::domain::error::DeviceIoError;
use crate::domain::types::{EqMode, TrackId, Volume};

/// Raw SMBus-style register writes on an I2C bus
pub trait I2cBus: Send {
    /// Write a single command byte
    fn write_byte(&mut self, address: u8, command: u8) -> Result<(), DeviceIoError>;

    /// Write a command byte followed by one data byte
    fn write_byte_data(&mut self, address: u8, command: u8, value: u8)
        -> Result<(), DeviceIoError>;
}

/// On/off launch relay
pub trait RelayDevice: Send {
    fn on(&mut self) -> Result<(), DeviceIoError>;
    fn off(&mut self) -> Result<(), DeviceIoError>;
}

/// Audio trigger board
pub trait AudioDevice: Send {
    fn set_volume(&mut self, level: Volume) -> Result<(), DeviceIoError>;
    fn play_track(&mut self, track: TrackId) -> Result<(), DeviceIoError>;
    fn stop(&mut self) -> Result<(), DeviceIoError>;
    fn set_eq(&mut self, mode: EqMode) -> Result<(), DeviceIoError>;
}

/// Servo output running a fixed-frequency carrier
pub trait PwmOutput: Send {
    /// Set the duty cycle as a percentage of the period (0.0..=100.0)
    fn set_duty_cycle(&mut self, percent: f64) -> Result<(), DeviceIoError>;
}
