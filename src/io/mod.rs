//! IO modules - hardware interfaces
//!
//! This module contains all hardware IO:
//! - `devices` - Capability traits the services are written against
//! - `qwiic` - Qwiic relay and MP3 trigger drivers over any I2C bus
//! - `edge` - Hands debounced edges to the controller queue
//! - `console` - Bench backend: stdin edges, logged bus and PWM writes
//! - `rpi` - Raspberry Pi backend (feature `rpi`)
//! - `fake` - Journaling devices for tests

pub mod console;
pub mod devices;
pub mod edge;
pub mod fake;
pub mod qwiic;
#[cfg(feature = "rpi")]
pub mod rpi;

// Re-export commonly used types
pub use devices::{AudioDevice, I2cBus, PwmOutput, RelayDevice};
pub use edge::{EdgeSink, Forwarded};
pub use qwiic::{Mp3Trigger, QwiicRelay};

#[cfg(not(feature = "rpi"))]
pub use console::{open_bus, open_servo, Bus};
#[cfg(feature = "rpi")]
pub use rpi::{open_bus, open_servo, Bus};
