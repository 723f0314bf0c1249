//! Shared types for the putt arcade controller

use crate::domain::error::ConfigError;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Newtype wrapper for BCM GPIO pin numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Pin(pub u8);

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Track number on the audio trigger board (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TrackId(u8);

impl TrackId {
    /// Returns `None` for track 0, which the board does not address
    pub fn new(id: u8) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audio board volume, 0 = off, 31 = max
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: u8 = 31;

    pub fn new(level: i64) -> Result<Self, ConfigError> {
        match u8::try_from(level) {
            Ok(level) if level <= Self::MAX => Ok(Self(level)),
            _ => Err(ConfigError::InvalidVolume(level)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// 7-bit I2C address in the range the Qwiic boards accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    pub const MIN: u8 = 0x07;
    pub const MAX: u8 = 0x78;

    pub fn new(device: &'static str, address: i64) -> Result<Self, ConfigError> {
        match u8::try_from(address) {
            Ok(a) if (Self::MIN..=Self::MAX).contains(&a) => Ok(Self(a)),
            _ => Err(ConfigError::InvalidAddress { device, address }),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Equalizer presets supported by the audio board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqMode {
    Normal,
    Pop,
    Rock,
    Jazz,
    Classical,
    Bass,
}

impl EqMode {
    /// Register value written with the SET_EQ command
    pub fn code(self) -> u8 {
        match self {
            EqMode::Normal => 0,
            EqMode::Pop => 1,
            EqMode::Rock => 2,
            EqMode::Jazz => 3,
            EqMode::Classical => 4,
            EqMode::Bass => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EqMode::Normal => "normal",
            EqMode::Pop => "pop",
            EqMode::Rock => "rock",
            EqMode::Jazz => "jazz",
            EqMode::Classical => "classical",
            EqMode::Bass => "bass",
        }
    }
}

impl std::str::FromStr for EqMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "normal" => EqMode::Normal,
            "pop" => EqMode::Pop,
            "rock" => EqMode::Rock,
            "jazz" => EqMode::Jazz,
            "classical" => EqMode::Classical,
            "bass" => EqMode::Bass,
            _ => return Err(ConfigError::InvalidEq(s.to_string())),
        })
    }
}

/// Edge polarity watched on an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Rising,
    Falling,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Rising => "rising",
            EdgeKind::Falling => "falling",
        }
    }
}

impl std::str::FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" | "r" => Ok(EdgeKind::Rising),
            "falling" | "f" => Ok(EdgeKind::Falling),
            other => Err(format!("unknown edge kind '{}'", other)),
        }
    }
}

/// Input pull resistor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    Up,
    Down,
    Off,
}

/// Minimum time between accepted edges on one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BounceWindow(Duration);

impl BounceWindow {
    pub const MIN_MS: u64 = 100;
    pub const MAX_MS: u64 = 1000;

    pub fn new(pin: Pin, ms: u64) -> Result<Self, ConfigError> {
        if (Self::MIN_MS..=Self::MAX_MS).contains(&ms) {
            Ok(Self(Duration::from_millis(ms)))
        } else {
            Err(ConfigError::InvalidBounceWindow { pin, ms })
        }
    }

    pub fn duration(self) -> Duration {
        self.0
    }
}

/// Game state owned by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Idle,
    Playing,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Playing => "playing",
        }
    }
}

/// Debounced, classified sensor or button occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalEvent {
    PuttDetected,
    CupSink,
    RfGreeting,
    RfNonSequitur,
    RfTaunt,
    RfResetState,
}

impl LogicalEvent {
    pub const ALL: [LogicalEvent; 6] = [
        LogicalEvent::PuttDetected,
        LogicalEvent::CupSink,
        LogicalEvent::RfGreeting,
        LogicalEvent::RfNonSequitur,
        LogicalEvent::RfTaunt,
        LogicalEvent::RfResetState,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalEvent::PuttDetected => "putt_detected",
            LogicalEvent::CupSink => "cup_sink",
            LogicalEvent::RfGreeting => "rf_greeting",
            LogicalEvent::RfNonSequitur => "rf_non_sequitur",
            LogicalEvent::RfTaunt => "rf_taunt",
            LogicalEvent::RfResetState => "rf_reset_state",
        }
    }

    /// Audio category for the remote buttons that only trigger a cue
    pub fn rf_category(&self) -> Option<TrackCategory> {
        match self {
            LogicalEvent::RfGreeting => Some(TrackCategory::Greeting),
            LogicalEvent::RfNonSequitur => Some(TrackCategory::NonSequitur),
            LogicalEvent::RfTaunt => Some(TrackCategory::Taunt),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogicalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named group of audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackCategory {
    Greeting,
    NonSequitur,
    Taunt,
    Congratulation,
}

impl TrackCategory {
    pub const COUNT: usize = 4;

    pub const ALL: [TrackCategory; Self::COUNT] = [
        TrackCategory::Greeting,
        TrackCategory::NonSequitur,
        TrackCategory::Taunt,
        TrackCategory::Congratulation,
    ];

    pub fn index(self) -> usize {
        match self {
            TrackCategory::Greeting => 0,
            TrackCategory::NonSequitur => 1,
            TrackCategory::Taunt => 2,
            TrackCategory::Congratulation => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackCategory::Greeting => "greeting",
            TrackCategory::NonSequitur => "non_sequitur",
            TrackCategory::Taunt => "taunt",
            TrackCategory::Congratulation => "congratulation",
        }
    }
}

impl std::fmt::Display for TrackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered track lists per category, fixed at configuration time
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCatalog {
    lists: [Vec<TrackId>; TrackCategory::COUNT],
}

impl TrackCatalog {
    /// Build a catalog from raw track numbers, rejecting zero ids and empty lists
    pub fn new(
        greeting: &[i64],
        non_sequitur: &[i64],
        taunt: &[i64],
        congratulation: &[i64],
    ) -> Result<Self, ConfigError> {
        let raw_lists = [
            (TrackCategory::Greeting, greeting),
            (TrackCategory::NonSequitur, non_sequitur),
            (TrackCategory::Taunt, taunt),
            (TrackCategory::Congratulation, congratulation),
        ];
        let mut catalog = Self { lists: Default::default() };
        for (category, raw) in raw_lists {
            if raw.is_empty() {
                return Err(ConfigError::EmptyCategory(category));
            }
            let tracks = raw
                .iter()
                .map(|&id| {
                    u8::try_from(id)
                        .ok()
                        .and_then(TrackId::new)
                        .ok_or(ConfigError::InvalidTrackId { category, id })
                })
                .collect::<Result<Vec<_>, _>>()?;
            catalog.lists[category.index()] = tracks;
        }
        Ok(catalog)
    }

    pub fn tracks(&self, category: TrackCategory) -> &[TrackId] {
        &self.lists[category.index()]
    }
}

/// Accepted logical event queued for the controller
#[derive(Debug, Clone)]
pub struct SensorEvent {
    pub event: LogicalEvent,
    pub pin: Pin,
    /// Edge timestamp that passed the debounce check
    pub accepted_at: Duration,
    pub received_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_bounds() {
        assert_eq!(Volume::new(0).unwrap().get(), 0);
        assert_eq!(Volume::new(31).unwrap().get(), 31);
        assert_eq!(Volume::new(32), Err(ConfigError::InvalidVolume(32)));
        assert_eq!(Volume::new(-1), Err(ConfigError::InvalidVolume(-1)));
    }

    #[test]
    fn test_i2c_address_bounds() {
        assert!(I2cAddress::new("relay", 0x07).is_ok());
        assert!(I2cAddress::new("relay", 0x78).is_ok());
        assert!(I2cAddress::new("relay", 0x06).is_err());
        assert!(matches!(
            I2cAddress::new("audio", 0x79),
            Err(ConfigError::InvalidAddress { device: "audio", address: 0x79 })
        ));
    }

    #[test]
    fn test_eq_mode_from_str() {
        assert_eq!("rock".parse::<EqMode>().unwrap(), EqMode::Rock);
        assert_eq!("Bass".parse::<EqMode>().unwrap().code(), 5);
        assert_eq!(
            "disco".parse::<EqMode>(),
            Err(ConfigError::InvalidEq("disco".to_string()))
        );
    }

    #[test]
    fn test_track_id_rejects_zero() {
        assert!(TrackId::new(0).is_none());
        assert_eq!(TrackId::new(22).map(TrackId::get), Some(22));
    }

    #[test]
    fn test_bounce_window_range() {
        assert!(BounceWindow::new(Pin(17), 100).is_ok());
        assert!(BounceWindow::new(Pin(17), 1000).is_ok());
        assert_eq!(
            BounceWindow::new(Pin(17), 99),
            Err(ConfigError::InvalidBounceWindow { pin: Pin(17), ms: 99 })
        );
        assert!(BounceWindow::new(Pin(17), 1001).is_err());
    }

    #[test]
    fn test_catalog_rejects_empty_category() {
        let result = TrackCatalog::new(&[1], &[2, 3], &[], &[22]);
        assert_eq!(result, Err(ConfigError::EmptyCategory(TrackCategory::Taunt)));
    }

    #[test]
    fn test_catalog_rejects_out_of_range_track() {
        let result = TrackCatalog::new(&[1], &[2, 256], &[11], &[22]);
        assert_eq!(
            result,
            Err(ConfigError::InvalidTrackId { category: TrackCategory::NonSequitur, id: 256 })
        );
    }

    #[test]
    fn test_rf_category_mapping() {
        assert_eq!(LogicalEvent::RfTaunt.rf_category(), Some(TrackCategory::Taunt));
        assert_eq!(LogicalEvent::CupSink.rf_category(), None);
        assert_eq!(LogicalEvent::RfResetState.rf_category(), None);
    }
}
