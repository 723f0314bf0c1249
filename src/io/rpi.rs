//! Raspberry Pi backend (feature `rpi`)
//!
//! - I2C through `/dev/i2c-<bus>`, shared by the relay and the MP3 trigger
//! - Software PWM on the servo pin at the servo carrier frequency
//! - One GPIO interrupt thread per bound input pin

use crate::domain::error::DeviceIoError;
use crate::domain::types::{EdgeKind, Pin, Pull};
use crate::infra::config::SensorBinding;
use crate::io::devices::{I2cBus, PwmOutput};
use crate::io::edge::{EdgeSink, Forwarded};
use crate::services::actuator::SERVO_FREQUENCY_HZ;
use parking_lot::Mutex;
use rppal::gpio::{Event, Gpio, InputPin, OutputPin, Trigger};
use rppal::i2c::I2c;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type Bus = RppalBus;

/// Shared handle to one I2C bus; each write selects its target address
#[derive(Clone)]
pub struct RppalBus {
    i2c: Arc<Mutex<I2c>>,
}

impl RppalBus {
    fn select(i2c: &mut I2c, address: u8) -> Result<(), DeviceIoError> {
        i2c.set_slave_address(u16::from(address))
            .map_err(|e| DeviceIoError::Bus { address, reason: e.to_string() })
    }
}

impl I2cBus for RppalBus {
    fn write_byte(&mut self, address: u8, command: u8) -> Result<(), DeviceIoError> {
        let mut i2c = self.i2c.lock();
        Self::select(&mut i2c, address)?;
        i2c.smbus_send_byte(command)
            .map_err(|e| DeviceIoError::Bus { address, reason: e.to_string() })
    }

    fn write_byte_data(
        &mut self,
        address: u8,
        command: u8,
        value: u8,
    ) -> Result<(), DeviceIoError> {
        let mut i2c = self.i2c.lock();
        Self::select(&mut i2c, address)?;
        i2c.smbus_write_byte(command, value)
            .map_err(|e| DeviceIoError::Bus { address, reason: e.to_string() })
    }
}

pub fn open_bus(bus: u8) -> Result<Bus, DeviceIoError> {
    let i2c = I2c::with_bus(bus)
        .map_err(|e| DeviceIoError::Bus { address: 0, reason: e.to_string() })?;
    info!(bus = bus, "i2c_bus_opened");
    Ok(RppalBus { i2c: Arc::new(Mutex::new(i2c)) })
}

/// Software PWM on a GPIO output
pub struct SoftPwm {
    pin: OutputPin,
}

impl PwmOutput for SoftPwm {
    fn set_duty_cycle(&mut self, percent: f64) -> Result<(), DeviceIoError> {
        self.pin
            .set_pwm_frequency(SERVO_FREQUENCY_HZ, percent / 100.0)
            .map_err(|e| DeviceIoError::Pwm(e.to_string()))
    }
}

impl Drop for SoftPwm {
    fn drop(&mut self) {
        if let Err(e) = self.pin.clear_pwm() {
            warn!(error = %e, "pwm_clear_failed");
        }
    }
}

pub fn open_servo(pin: Pin) -> Result<Box<dyn PwmOutput>, DeviceIoError> {
    let gpio = Gpio::new().map_err(|e| DeviceIoError::Gpio(e.to_string()))?;
    let output = gpio
        .get(pin.0)
        .map_err(|e| DeviceIoError::Gpio(format!("servo pin {}: {}", pin, e)))?
        .into_output_low();
    info!(pin = %pin, frequency_hz = SERVO_FREQUENCY_HZ, "servo_pwm_opened");
    Ok(Box::new(SoftPwm { pin: output }))
}

/// Interrupt-driven edge source; edges stop when this is dropped
pub struct GpioEdgeSource {
    pins: Vec<InputPin>,
}

impl GpioEdgeSource {
    /// Configure every bound pin and start its interrupt thread
    pub fn start(bindings: &[SensorBinding], sink: Arc<EdgeSink>) -> Result<Self, DeviceIoError> {
        let gpio = Gpio::new().map_err(|e| DeviceIoError::Gpio(e.to_string()))?;
        let mut pins = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let pin = gpio
                .get(binding.pin.0)
                .map_err(|e| DeviceIoError::Gpio(format!("pin {}: {}", binding.pin, e)))?;
            let mut input = match binding.pull {
                Pull::Up => pin.into_input_pullup(),
                Pull::Down => pin.into_input_pulldown(),
                Pull::Off => pin.into_input(),
            };

            let trigger = match binding.edge {
                EdgeKind::Rising => Trigger::RisingEdge,
                EdgeKind::Falling => Trigger::FallingEdge,
            };
            let bound_pin = binding.pin;
            let sink = sink.clone();
            input
                .set_async_interrupt(
                    trigger,
                    Some(binding.bounce.duration()),
                    move |event: Event| {
                        let edge = match event.trigger {
                            Trigger::FallingEdge => EdgeKind::Falling,
                            _ => EdgeKind::Rising,
                        };
                        if sink.forward(bound_pin, edge, event.timestamp) == Forwarded::Closed {
                            debug!(pin = %bound_pin, "edge_after_shutdown");
                        }
                    },
                )
                .map_err(|e| DeviceIoError::Gpio(format!("pin {}: {}", binding.pin, e)))?;

            info!(
                pin = %binding.pin,
                event = binding.event.as_str(),
                edge = binding.edge.as_str(),
                bounce_ms = binding.bounce.duration().as_millis() as u64,
                "edge_source_armed"
            );
            pins.push(input);
        }

        Ok(Self { pins })
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}
