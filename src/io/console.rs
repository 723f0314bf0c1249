//! Console backend for bench development without cabinet hardware
//!
//! Bus and PWM writes are logged instead of performed. Edges come from stdin,
//! one per line:
//! - `putt`, `cup`, `greeting`, `non_sequitur`, `taunt`, `reset` fire the
//!   edge bound to that event
//! - `<pin> rising|falling` fires a raw edge on a pin
//!
//! Edges go through the same dispatcher as on hardware, so typing `putt`
//! twice quickly is debounced.

use crate::domain::error::DeviceIoError;
use crate::domain::types::{EdgeKind, LogicalEvent, Pin};
use crate::io::devices::{I2cBus, PwmOutput};
use crate::io::edge::{EdgeSink, Forwarded};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub type Bus = ConsoleBus;

/// I2C bus that logs every write
#[derive(Debug, Clone)]
pub struct ConsoleBus {
    bus: u8,
}

impl I2cBus for ConsoleBus {
    fn write_byte(&mut self, address: u8, command: u8) -> Result<(), DeviceIoError> {
        info!(bus = self.bus, address = address, command = command, "i2c_write_byte");
        Ok(())
    }

    fn write_byte_data(
        &mut self,
        address: u8,
        command: u8,
        value: u8,
    ) -> Result<(), DeviceIoError> {
        info!(
            bus = self.bus,
            address = address,
            command = command,
            value = value,
            "i2c_write_byte_data"
        );
        Ok(())
    }
}

/// Servo output that logs duty changes
#[derive(Debug)]
pub struct ConsolePwm {
    pin: Pin,
}

impl PwmOutput for ConsolePwm {
    fn set_duty_cycle(&mut self, percent: f64) -> Result<(), DeviceIoError> {
        info!(pin = %self.pin, duty = percent, "pwm_duty");
        Ok(())
    }
}

pub fn open_bus(bus: u8) -> Result<Bus, DeviceIoError> {
    info!(bus = bus, "console_bus_opened");
    Ok(ConsoleBus { bus })
}

pub fn open_servo(pin: Pin) -> Result<Box<dyn PwmOutput>, DeviceIoError> {
    Ok(Box::new(ConsolePwm { pin }))
}

/// One parsed console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    Event(LogicalEvent),
    Edge(Pin, EdgeKind),
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let mut words = line.split_whitespace();
    let first = words.next().ok_or_else(|| "empty line".to_string())?;

    let event = match first {
        "putt" => Some(LogicalEvent::PuttDetected),
        "cup" => Some(LogicalEvent::CupSink),
        "greeting" => Some(LogicalEvent::RfGreeting),
        "non_sequitur" => Some(LogicalEvent::RfNonSequitur),
        "taunt" => Some(LogicalEvent::RfTaunt),
        "reset" => Some(LogicalEvent::RfResetState),
        _ => None,
    };
    if let Some(event) = event {
        return Ok(ConsoleInput::Event(event));
    }

    let pin: u8 = first.parse().map_err(|_| format!("unknown command '{}'", first))?;
    let edge: EdgeKind = words
        .next()
        .ok_or_else(|| format!("missing edge for pin {}", pin))?
        .parse()?;
    Ok(ConsoleInput::Edge(Pin(pin), edge))
}

/// Read edges from stdin until shutdown
pub async fn run_stdin_source(sink: Arc<EdgeSink>, shutdown: watch::Receiver<bool>) {
    run_line_source(BufReader::new(tokio::io::stdin()), sink, shutdown).await;
}

/// Read console lines from `reader` until shutdown or until the shutdown
/// sender is gone
///
/// Timestamps are measured from the moment the reader starts. End of input
/// does not stop the cabinet; the reader just waits for shutdown.
pub async fn run_line_source<R>(
    reader: R,
    sink: Arc<EdgeSink>,
    mut shutdown: watch::Receiver<bool>,
) where
    R: AsyncBufRead + Unpin,
{
    let start = Instant::now();
    let mut lines = reader.lines();
    info!("console_source_started");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("console_input_closed");
                        let _ = shutdown.wait_for(|stop| *stop).await;
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "console_read_failed");
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let (pin, edge) = match parse_line(line) {
                    Ok(ConsoleInput::Edge(pin, edge)) => (pin, edge),
                    Ok(ConsoleInput::Event(event)) => match sink.dispatcher().binding_for(event) {
                        Some(binding) => binding,
                        None => {
                            warn!(event = event.as_str(), "console_event_unbound");
                            continue;
                        }
                    },
                    Err(e) => {
                        warn!(line = %line, error = %e, "console_input_invalid");
                        continue;
                    }
                };

                if sink.forward(pin, edge, start.elapsed()) == Forwarded::Closed {
                    break;
                }
            }
        }
    }

    debug!("console_source_stopped");
}
