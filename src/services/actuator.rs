//! Ball release actuator
//!
//! Two obstructors sit one ball-width apart in the queue pipe, both driven by
//! one servo. Closing, opening and closing again lets exactly the terminal
//! ball through. The relay powers the mechanism for the whole cycle.
//!
//! Sequence (one time unit per hold):
//! relay on → CLOSED, hold → OPEN, hold → CLOSED → relay off

use crate::domain::error::ActuatorFault;
use crate::io::devices::{PwmOutput, RelayDevice};
use std::time::Duration;
use tracing::{debug, error, info};

/// Servo carrier frequency
pub const SERVO_FREQUENCY_HZ: f64 = 50.0;

/// Duty cycle (%) holding the queue
pub const DUTY_CLOSED: f64 = 4.5;

/// Duty cycle (%) letting the terminal ball advance
pub const DUTY_OPEN: f64 = 10.0;

/// One entry of the release table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceStep {
    pub duty: f64,
    pub hold_units: u32,
}

/// Release cycle; must end closed
pub const RELEASE_SEQUENCE: [SequenceStep; 3] = [
    SequenceStep { duty: DUTY_CLOSED, hold_units: 1 },
    SequenceStep { duty: DUTY_OPEN, hold_units: 1 },
    SequenceStep { duty: DUTY_CLOSED, hold_units: 0 },
];

pub struct BallReleaseActuator {
    relay: Box<dyn RelayDevice>,
    pwm: Box<dyn PwmOutput>,
    time_unit: Duration,
}

impl BallReleaseActuator {
    pub fn new(relay: Box<dyn RelayDevice>, pwm: Box<dyn PwmOutput>, time_unit: Duration) -> Self {
        Self { relay, pwm, time_unit }
    }

    /// Drive the obstructors to the closed position without cycling
    pub fn park(&mut self) -> Result<(), ActuatorFault> {
        self.pwm
            .set_duty_cycle(DUTY_CLOSED)
            .map_err(|source| ActuatorFault::Pwm { duty: DUTY_CLOSED, source })
    }

    /// Release exactly one ball. Blocks for the length of the sequence.
    ///
    /// Relay on is always the first command and relay off always the last,
    /// whatever fails in between. If the relay cannot be energized the
    /// servo is not moved.
    pub fn launch(&mut self) -> Result<(), ActuatorFault> {
        if let Err(source) = self.relay.on() {
            if let Err(e) = self.relay.off() {
                error!(error = %e, "relay_release_failed");
            }
            return Err(ActuatorFault::Relay { action: "on", source });
        }

        let sequence = self.run_sequence();
        if let Err(ref fault) = sequence {
            error!(error = %fault, "release_sequence_fault");
            // Never leave the queue open
            if let Err(e) = self.pwm.set_duty_cycle(DUTY_CLOSED) {
                error!(error = %e, "obstructor_close_failed");
            }
        }

        let released = self
            .relay
            .off()
            .map_err(|source| ActuatorFault::Relay { action: "off", source });

        sequence?;
        released?;
        info!("ball_released");
        Ok(())
    }

    fn run_sequence(&mut self) -> Result<(), ActuatorFault> {
        for step in RELEASE_SEQUENCE {
            debug!(duty = step.duty, hold_units = step.hold_units, "obstructor_step");
            self.pwm
                .set_duty_cycle(step.duty)
                .map_err(|source| ActuatorFault::Pwm { duty: step.duty, source })?;
            if step.hold_units > 0 && !self.time_unit.is_zero() {
                std::thread::sleep(self.time_unit * step.hold_units);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fake::{DeviceCall, FakePwm, FakeRelay, Journal};

    fn actuator(relay: FakeRelay, pwm: FakePwm) -> BallReleaseActuator {
        BallReleaseActuator::new(Box::new(relay), Box::new(pwm), Duration::ZERO)
    }

    #[test]
    fn test_sequence_ends_closed() {
        assert_eq!(RELEASE_SEQUENCE.last().map(|s| s.duty), Some(DUTY_CLOSED));
        assert_eq!(RELEASE_SEQUENCE.iter().map(|s| s.hold_units).sum::<u32>(), 2);
    }

    #[test]
    fn test_launch_order() {
        let journal = Journal::new();
        let mut act = actuator(FakeRelay::new(journal.clone()), FakePwm::new(journal.clone()));

        act.launch().unwrap();

        assert_eq!(
            journal.calls(),
            vec![
                DeviceCall::RelayOn,
                DeviceCall::Duty(DUTY_CLOSED),
                DeviceCall::Duty(DUTY_OPEN),
                DeviceCall::Duty(DUTY_CLOSED),
                DeviceCall::RelayOff,
            ]
        );
    }

    #[test]
    fn test_pwm_fault_still_closes_and_releases_relay() {
        let journal = Journal::new();
        // Second call (OPEN) fails
        let pwm = FakePwm::new(journal.clone()).failing_at(1);
        let mut act = actuator(FakeRelay::new(journal.clone()), pwm);

        let err = act.launch().unwrap_err();

        assert!(matches!(err, ActuatorFault::Pwm { duty, .. } if duty == DUTY_OPEN));
        assert_eq!(
            journal.calls(),
            vec![
                DeviceCall::RelayOn,
                DeviceCall::Duty(DUTY_CLOSED),
                DeviceCall::Duty(DUTY_CLOSED),
                DeviceCall::RelayOff,
            ]
        );
    }

    #[test]
    fn test_relay_on_fault_skips_servo() {
        let journal = Journal::new();
        let relay = FakeRelay::new(journal.clone()).failing_on();
        let mut act = actuator(relay, FakePwm::new(journal.clone()));

        let err = act.launch().unwrap_err();

        assert!(matches!(err, ActuatorFault::Relay { action: "on", .. }));
        assert_eq!(journal.calls(), vec![DeviceCall::RelayOff]);
    }

    #[test]
    fn test_relay_off_fault_reported_after_full_cycle() {
        let journal = Journal::new();
        let relay = FakeRelay::new(journal.clone()).failing_off();
        let mut act = actuator(relay, FakePwm::new(journal.clone()));

        let err = act.launch().unwrap_err();

        assert!(matches!(err, ActuatorFault::Relay { action: "off", .. }));
        assert_eq!(journal.calls().last(), Some(&DeviceCall::Duty(DUTY_CLOSED)));
    }

    #[test]
    fn test_park() {
        let journal = Journal::new();
        let mut act = actuator(FakeRelay::new(journal.clone()), FakePwm::new(journal.clone()));
        act.park().unwrap();
        assert_eq!(journal.calls(), vec![DeviceCall::Duty(DUTY_CLOSED)]);
    }

    #[test]
    fn test_hold_time_applied() {
        let journal = Journal::new();
        let mut act = BallReleaseActuator::new(
            Box::new(FakeRelay::new(journal.clone())),
            Box::new(FakePwm::new(journal.clone())),
            Duration::from_millis(20),
        );
        let start = std::time::Instant::now();
        act.launch().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
