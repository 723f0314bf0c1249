//! Cabinet hardware check
//!
//! Exercises the relay, the release servo and the MP3 board one at a time,
//! using the same backends and configuration as the controller.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use putt_arcade::domain::types::{EqMode, I2cAddress, TrackId, Volume};
use putt_arcade::infra::Config;
use putt_arcade::io::{AudioDevice, Mp3Trigger, QwiicRelay, RelayDevice};
use putt_arcade::services::BallReleaseActuator;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hw-test", about = "Cabinet hardware check")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run full release cycles (relay on, closed, open, closed, relay off)
    Servo {
        #[arg(long, default_value = "1")]
        count: u32,
        /// Pause between cycles
        #[arg(long, default_value = "2000")]
        pause_ms: u64,
    },
    /// Toggle the relay
    Relay {
        #[arg(long, default_value = "3")]
        count: u32,
        /// Time spent in each position
        #[arg(long, default_value = "1000")]
        hold_ms: u64,
    },
    /// Set volume and EQ, then play tracks one after another
    Audio {
        #[arg(long)]
        volume: Option<i64>,
        #[arg(long)]
        eq: Option<String>,
        /// Track numbers, comma separated
        #[arg(long, value_delimiter = ',', default_value = "1")]
        tracks: Vec<u8>,
        /// Delay after each track
        #[arg(long, default_value = "3000")]
        delay_ms: u64,
        /// Address tracks by file number instead of track index
        #[arg(long)]
        by_file: bool,
    },
    /// Send one transport command to the MP3 board
    Transport {
        #[arg(value_enum)]
        action: Transport,
    },
    /// Move a board to a new I2C address
    Readdress {
        #[arg(value_enum)]
        board: Board,
        /// New address, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_address)]
        to: i64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Transport {
    Pause,
    Next,
    Previous,
    Stop,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Board {
    Relay,
    Audio,
}

fn parse_address(s: &str) -> Result<i64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    let args = Args::parse();
    let config =
        Config::load_from_path(&args.config).context("failed to load configuration")?;
    let settings = config.validate().context("invalid configuration")?;
    let bus = putt_arcade::io::open_bus(settings.i2c_bus).context("failed to open I2C bus")?;

    info!(config_file = %config.config_file(), command = ?args.command, "hw_test_starting");

    match args.command {
        Command::Servo { count, pause_ms } => {
            let relay = QwiicRelay::new(bus, settings.relay_address);
            let servo = putt_arcade::io::open_servo(settings.servo_pin)
                .context("failed to open servo")?;
            let mut actuator =
                BallReleaseActuator::new(Box::new(relay), servo, settings.time_unit);
            actuator.park().context("failed to park obstructors")?;
            for cycle in 1..=count {
                actuator.launch().with_context(|| format!("release cycle {} failed", cycle))?;
                info!(cycle = cycle, "release_cycle_done");
                if cycle < count {
                    std::thread::sleep(Duration::from_millis(pause_ms));
                }
            }
        }
        Command::Relay { count, hold_ms } => {
            let mut relay = QwiicRelay::new(bus, settings.relay_address);
            let hold = Duration::from_millis(hold_ms);
            for toggle in 1..=count {
                relay.on().context("relay on failed")?;
                std::thread::sleep(hold);
                relay.off().context("relay off failed")?;
                info!(toggle = toggle, "relay_toggled");
                std::thread::sleep(hold);
            }
        }
        Command::Audio { volume, eq, tracks, delay_ms, by_file } => {
            let mut audio = Mp3Trigger::new(bus, settings.audio_address);
            let volume = match volume {
                Some(level) => Volume::new(level)?,
                None => settings.volume,
            };
            let eq: EqMode = match eq {
                Some(name) => name.parse()?,
                None => settings.eq,
            };
            audio.set_volume(volume).context("set volume failed")?;
            audio.set_eq(eq).context("set eq failed")?;

            for id in tracks {
                let Some(track) = TrackId::new(id) else {
                    bail!("track 0 does not exist");
                };
                let played = if by_file {
                    audio.play_file(track.get())
                } else {
                    audio.play_track(track)
                };
                played.with_context(|| format!("play track {} failed", id))?;
                info!(track = %track, "track_started");
                std::thread::sleep(Duration::from_millis(delay_ms));
            }
            audio.stop().context("stop failed")?;
        }
        Command::Transport { action } => {
            let mut audio = Mp3Trigger::new(bus, settings.audio_address);
            let sent = match action {
                Transport::Pause => audio.pause(),
                Transport::Next => audio.play_next(),
                Transport::Previous => audio.play_previous(),
                Transport::Stop => audio.stop(),
            };
            sent.with_context(|| format!("{:?} failed", action))?;
        }
        Command::Readdress { board, to } => match board {
            Board::Relay => {
                let mut relay = QwiicRelay::new(bus, settings.relay_address);
                relay.set_address(I2cAddress::new("relay", to)?)?;
            }
            Board::Audio => {
                let mut audio = Mp3Trigger::new(bus, settings.audio_address);
                audio.set_address(I2cAddress::new("audio", to)?)?;
            }
        },
    }

    info!("hw_test_done");
    Ok(())
}
