//! Tests for the Controller module

use super::*;
use crate::domain::types::{LogicalEvent, Pin};
use crate::io::fake::{DeviceCall, FakeAudio, Journal};
use std::time::Duration;

/// Test harness that keeps the launch receiver alive so `try_send` succeeds
struct TestController {
    controller: Controller,
    launch_rx: mpsc::Receiver<LaunchCmd>,
    journal: Journal,
}

impl std::ops::Deref for TestController {
    type Target = Controller;
    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

impl std::ops::DerefMut for TestController {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.controller
    }
}

impl TestController {
    /// Number of launch commands the controller has queued so far
    fn launches(&mut self) -> usize {
        let mut count = 0;
        while self.launch_rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    fn send(&mut self, event: LogicalEvent) {
        self.controller.process_event(sensor_event(event));
    }
}

fn catalog() -> TrackCatalog {
    let non_sequitur: Vec<i64> = (2..=10).collect();
    let taunt: Vec<i64> = (11..=21).collect();
    let congratulation: Vec<i64> = (22..=39).collect();
    TrackCatalog::new(&[1], &non_sequitur, &taunt, &congratulation).unwrap()
}

fn create_test_controller() -> TestController {
    create_test_controller_with_audio(FakeAudio::new)
}

fn create_test_controller_with_audio(audio: impl FnOnce(Journal) -> FakeAudio) -> TestController {
    let journal = Journal::new();
    let (launch_tx, launch_rx) = mpsc::channel(8);
    let metrics = Arc::new(Metrics::new());
    let controller =
        Controller::new(&catalog(), Box::new(audio(journal.clone())), launch_tx, metrics);
    TestController { controller, launch_rx, journal }
}

fn sensor_event(event: LogicalEvent) -> SensorEvent {
    SensorEvent {
        event,
        pin: Pin(17),
        accepted_at: Duration::from_millis(1000),
        received_at: Instant::now(),
    }
}

#[test]
fn test_putt_from_idle_requests_launch() {
    let mut c = create_test_controller();
    c.send(LogicalEvent::PuttDetected);

    assert_eq!(c.state(), GameState::Playing);
    assert_eq!(c.launches(), 1);
    assert!(c.journal.calls().is_empty());
}

#[test]
fn test_putt_while_playing_no_second_launch() {
    let mut c = create_test_controller();
    c.send(LogicalEvent::PuttDetected);
    c.send(LogicalEvent::PuttDetected);
    c.send(LogicalEvent::PuttDetected);

    assert_eq!(c.launches(), 1);
    assert_eq!(c.state(), GameState::Playing);
    assert_eq!(c.metrics.events_ignored(), 2);
}

#[test]
fn test_cup_while_playing_plays_first_congratulation() {
    let mut c = create_test_controller();
    c.send(LogicalEvent::PuttDetected);
    c.send(LogicalEvent::CupSink);

    assert_eq!(c.journal.played(), vec![22]);
    assert_eq!(c.state(), GameState::Idle);
}

#[test]
fn test_second_round_rotates_congratulation() {
    let mut c = create_test_controller();
    for _ in 0..2 {
        c.send(LogicalEvent::PuttDetected);
        c.send(LogicalEvent::CupSink);
    }

    assert_eq!(c.journal.played(), vec![22, 23]);
    assert_eq!(c.launches(), 2);
    assert_eq!(c.state(), GameState::Idle);
}

#[test]
fn test_cup_while_idle_is_silent() {
    let mut c = create_test_controller();
    c.send(LogicalEvent::CupSink);

    assert!(c.journal.calls().is_empty());
    assert_eq!(c.state(), GameState::Idle);
    assert_eq!(c.metrics.events_ignored(), 1);
}

#[test]
fn test_rf_cues_in_any_state() {
    let mut c = create_test_controller();
    c.send(LogicalEvent::RfNonSequitur);
    c.send(LogicalEvent::PuttDetected);
    c.send(LogicalEvent::RfNonSequitur);
    c.send(LogicalEvent::RfGreeting);
    c.send(LogicalEvent::RfTaunt);

    assert_eq!(c.journal.played(), vec![2, 3, 1, 11]);
    assert_eq!(c.state(), GameState::Playing);
}

#[test]
fn test_five_non_sequiturs_never_repeat() {
    let mut c = create_test_controller();
    for _ in 0..5 {
        c.send(LogicalEvent::RfNonSequitur);
    }
    assert_eq!(c.journal.played(), vec![2, 3, 4, 5, 6]);
}

#[test]
fn test_reset_forces_idle_from_playing() {
    let mut c = create_test_controller();
    c.send(LogicalEvent::PuttDetected);
    c.send(LogicalEvent::RfResetState);

    assert_eq!(c.state(), GameState::Idle);
    assert!(c.journal.calls().is_empty());

    // A new putt is accepted again after the manual reset
    c.send(LogicalEvent::PuttDetected);
    assert_eq!(c.launches(), 2);
}

#[test]
fn test_reset_from_idle_stays_idle() {
    let mut c = create_test_controller();
    c.send(LogicalEvent::RfResetState);
    assert_eq!(c.state(), GameState::Idle);
    assert_eq!(c.metrics.events_ignored(), 0);
}

#[test]
fn test_audio_failure_does_not_stop_processing() {
    let mut c = create_test_controller_with_audio(|j| FakeAudio::new(j).failing_play());
    c.send(LogicalEvent::PuttDetected);
    c.send(LogicalEvent::CupSink);

    // Transition commits even though the cue failed
    assert_eq!(c.state(), GameState::Idle);
    assert_eq!(c.metrics.audio_errors(), 1);

    c.send(LogicalEvent::PuttDetected);
    assert_eq!(c.state(), GameState::Playing);
    assert_eq!(c.launches(), 2);
    assert_eq!(c.metrics.events_total(), 3);
}

#[test]
fn test_launch_with_worker_gone_stays_playing() {
    let mut c = create_test_controller();
    c.launch_rx.close();
    c.send(LogicalEvent::PuttDetected);

    assert_eq!(c.state(), GameState::Playing);
    assert_eq!(c.metrics.launches_failed(), 1);

    c.send(LogicalEvent::PuttDetected);
    assert_eq!(c.metrics.launches_failed(), 1);
}

#[test]
fn test_startup_cue() {
    let mut c = create_test_controller();
    c.startup(StartupCue {
        volume: Volume::new(3).unwrap(),
        eq: EqMode::Rock,
        track: TrackId::new(1),
    });

    assert_eq!(
        c.journal.calls(),
        vec![DeviceCall::Volume(3), DeviceCall::Eq(EqMode::Rock), DeviceCall::Play(1)]
    );
    assert_eq!(c.state(), GameState::Idle);
}

#[test]
fn test_startup_cue_failure_is_not_fatal() {
    let mut c = create_test_controller_with_audio(|j| FakeAudio::new(j).failing_play());
    c.startup(StartupCue {
        volume: Volume::new(10).unwrap(),
        eq: EqMode::Normal,
        track: TrackId::new(1),
    });
    assert_eq!(c.metrics.audio_errors(), 1);
}

#[tokio::test]
async fn test_run_drains_queue_in_order() {
    let mut c = create_test_controller();
    let (event_tx, event_rx) = mpsc::channel(16);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    for event in [
        LogicalEvent::PuttDetected,
        LogicalEvent::RfTaunt,
        LogicalEvent::CupSink,
        LogicalEvent::CupSink,
    ] {
        event_tx.send(sensor_event(event)).await.unwrap();
    }
    drop(event_tx);

    c.run(event_rx, shutdown_rx).await;

    assert_eq!(c.journal.played(), vec![11, 22]);
    assert_eq!(c.journal.calls().last(), Some(&DeviceCall::Stop));
    assert_eq!(c.state(), GameState::Idle);
    assert_eq!(c.metrics.events_total(), 4);
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let mut c = create_test_controller();
    let (_event_tx, event_rx) = mpsc::channel::<SensorEvent>(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), c.run(event_rx, shutdown_rx))
        .await
        .expect("controller should stop on shutdown");
}
