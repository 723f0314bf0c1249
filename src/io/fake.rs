//! In-memory devices that journal every command
//!
//! Used by the test suites to observe what the controller and actuator asked
//! the hardware to do, with optional failure injection.

use crate::domain::error::DeviceIoError;
use crate::domain::types::{EqMode, TrackId, Volume};
use crate::io::devices::{AudioDevice, I2cBus, PwmOutput, RelayDevice};
use parking_lot::Mutex;
use std::sync::Arc;

/// One command observed by a fake device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    RelayOn,
    RelayOff,
    Duty(f64),
    Volume(u8),
    Play(u8),
    Stop,
    Eq(EqMode),
}

/// Shared, ordered log of device calls across several fakes
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<DeviceCall>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.0.lock().clone()
    }

    /// Track numbers sent with `play_track`, in order
    pub fn played(&self) -> Vec<u8> {
        self.0
            .lock()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Play(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Number of release cycles started (relay energized)
    pub fn relay_cycles(&self) -> usize {
        self.0.lock().iter().filter(|c| **c == DeviceCall::RelayOn).count()
    }

    fn push(&self, call: DeviceCall) {
        self.0.lock().push(call);
    }
}

fn injected(what: &str) -> DeviceIoError {
    DeviceIoError::Bus { address: 0, reason: format!("injected {} failure", what) }
}

#[derive(Debug, Default)]
pub struct FakeRelay {
    journal: Journal,
    fail_on: bool,
    fail_off: bool,
}

impl FakeRelay {
    pub fn new(journal: Journal) -> Self {
        Self { journal, fail_on: false, fail_off: false }
    }

    pub fn failing_on(mut self) -> Self {
        self.fail_on = true;
        self
    }

    pub fn failing_off(mut self) -> Self {
        self.fail_off = true;
        self
    }
}

impl RelayDevice for FakeRelay {
    fn on(&mut self) -> Result<(), DeviceIoError> {
        if self.fail_on {
            return Err(injected("relay on"));
        }
        self.journal.push(DeviceCall::RelayOn);
        Ok(())
    }

    fn off(&mut self) -> Result<(), DeviceIoError> {
        if self.fail_off {
            return Err(injected("relay off"));
        }
        self.journal.push(DeviceCall::RelayOff);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakePwm {
    journal: Journal,
    calls: usize,
    /// Zero-based index of the `set_duty_cycle` call that fails
    fail_at: Option<usize>,
}

impl FakePwm {
    pub fn new(journal: Journal) -> Self {
        Self { journal, calls: 0, fail_at: None }
    }

    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }
}

impl PwmOutput for FakePwm {
    fn set_duty_cycle(&mut self, percent: f64) -> Result<(), DeviceIoError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_at == Some(call) {
            return Err(DeviceIoError::Pwm(format!("injected failure at {}%", percent)));
        }
        self.journal.push(DeviceCall::Duty(percent));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeAudio {
    journal: Journal,
    fail_play: bool,
}

impl FakeAudio {
    pub fn new(journal: Journal) -> Self {
        Self { journal, fail_play: false }
    }

    pub fn failing_play(mut self) -> Self {
        self.fail_play = true;
        self
    }
}

impl AudioDevice for FakeAudio {
    fn set_volume(&mut self, level: Volume) -> Result<(), DeviceIoError> {
        self.journal.push(DeviceCall::Volume(level.get()));
        Ok(())
    }

    fn play_track(&mut self, track: TrackId) -> Result<(), DeviceIoError> {
        if self.fail_play {
            return Err(injected("play"));
        }
        self.journal.push(DeviceCall::Play(track.get()));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceIoError> {
        self.journal.push(DeviceCall::Stop);
        Ok(())
    }

    fn set_eq(&mut self, mode: EqMode) -> Result<(), DeviceIoError> {
        self.journal.push(DeviceCall::Eq(mode));
        Ok(())
    }
}

/// Raw write observed on a `RecordingBus`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub address: u8,
    pub command: u8,
    pub value: Option<u8>,
}

/// I2C bus that records writes instead of performing them
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    writes: Arc<Mutex<Vec<BusWrite>>>,
    fail: bool,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { writes: Arc::default(), fail: true }
    }

    pub fn writes(&self) -> Vec<BusWrite> {
        self.writes.lock().clone()
    }

    fn record(&mut self, address: u8, command: u8, value: Option<u8>) -> Result<(), DeviceIoError> {
        if self.fail {
            return Err(DeviceIoError::Bus { address, reason: "bus unreachable".to_string() });
        }
        self.writes.lock().push(BusWrite { address, command, value });
        Ok(())
    }
}

impl I2cBus for RecordingBus {
    fn write_byte(&mut self, address: u8, command: u8) -> Result<(), DeviceIoError> {
        self.record(address, command, None)
    }

    fn write_byte_data(
        &mut self,
        address: u8,
        command: u8,
        value: u8,
    ) -> Result<(), DeviceIoError> {
        self.record(address, command, Some(value))
    }
}
