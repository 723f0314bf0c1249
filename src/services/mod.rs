//! Services - game logic and actuation
//!
//! This module contains the core services:
//! - `dispatcher` - Raw pin edges to debounced logical events
//! - `game` - Idle/Playing state machine
//! - `selector` - Non-repeating audio track rotation
//! - `actuator` - Relay and servo release sequence
//! - `actuator_worker` - Async release command worker
//! - `controller` - Central event consumer

pub mod actuator;
pub mod actuator_worker;
pub mod controller;
pub mod dispatcher;
pub mod game;
pub mod selector;

// Re-export commonly used types
pub use actuator::BallReleaseActuator;
pub use actuator_worker::{create_actuator_worker, ActuatorWorker, LaunchCmd};
pub use controller::{Controller, StartupCue};
pub use dispatcher::SensorEventDispatcher;
pub use game::{Action, GameStateMachine, Transition};
pub use selector::AudioTrackSelector;
