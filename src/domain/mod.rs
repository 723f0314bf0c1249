//! Domain models - core cabinet types and error taxonomy
//!
//! This module contains the canonical data types used throughout the system:
//! - `LogicalEvent` - debounced, classified sensor/button occurrence
//! - `SensorEvent` - queue envelope around a logical event
//! - `GameState` - idle/playing
//! - `TrackCategory` / `TrackCatalog` - audio cue groups
//! - validated device values (`Volume`, `I2cAddress`, `EqMode`, `TrackId`)

pub mod error;
pub mod types;

pub use error::{ActuatorFault, ConfigError, DeviceIoError};
pub use types::{
    BounceWindow, EdgeKind, EqMode, GameState, I2cAddress, LogicalEvent, Pin, Pull, SensorEvent,
    TrackCatalog, TrackCategory, TrackId, Volume,
};
