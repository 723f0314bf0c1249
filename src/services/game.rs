//! Game state machine
//!
//! | Current | Event                      | Action                   | Next      |
//! |---------|----------------------------|--------------------------|-----------|
//! | Idle    | PuttDetected               | launch                   | Playing   |
//! | Playing | PuttDetected               | -                        | Playing   |
//! | Playing | CupSink                    | play congratulation      | Idle      |
//! | Idle    | CupSink                    | -                        | Idle      |
//! | any     | RfGreeting/NonSequitur/Taunt | play category cue      | unchanged |
//! | any     | RfResetState               | -                        | Idle      |
//!
//! The machine is pure: it decides the transition and the side effect, the
//! controller carries the side effect out.

use crate::domain::types::{GameState, LogicalEvent, TrackCatalog, TrackCategory, TrackId};
use crate::services::selector::AudioTrackSelector;

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Release one ball
    Launch,
    /// Play a cue from the given category
    Play { category: TrackCategory, track: TrackId },
}

/// Outcome of handling one logical event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub event: LogicalEvent,
    pub from: GameState,
    pub to: GameState,
    pub action: Option<Action>,
}

impl Transition {
    /// True when the event had no effect at all
    pub fn is_ignored(&self) -> bool {
        self.from == self.to && self.action.is_none() && self.event != LogicalEvent::RfResetState
    }
}

pub struct GameStateMachine {
    state: GameState,
    selector: AudioTrackSelector,
}

impl GameStateMachine {
    pub fn new(catalog: &TrackCatalog) -> Self {
        Self { state: GameState::Idle, selector: AudioTrackSelector::new(catalog) }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn selector(&self) -> &AudioTrackSelector {
        &self.selector
    }

    pub fn handle(&mut self, event: LogicalEvent) -> Transition {
        let from = self.state;
        let (to, action) = match (from, event) {
            (GameState::Idle, LogicalEvent::PuttDetected) => {
                (GameState::Playing, Some(Action::Launch))
            }
            (GameState::Playing, LogicalEvent::PuttDetected) => (GameState::Playing, None),
            (GameState::Playing, LogicalEvent::CupSink) => {
                (GameState::Idle, Some(self.play(TrackCategory::Congratulation)))
            }
            (GameState::Idle, LogicalEvent::CupSink) => (GameState::Idle, None),
            (_, LogicalEvent::RfResetState) => (GameState::Idle, None),
            (state, rf) => match rf.rf_category() {
                Some(category) => (state, Some(self.play(category))),
                None => (state, None),
            },
        };
        self.state = to;
        Transition { event, from, to, action }
    }

    fn play(&mut self, category: TrackCategory) -> Action {
        Action::Play { category, track: self.selector.pick(category) }
    }
}
