//! Qwiic relay and Qwiic MP3 trigger drivers
//!
//! Both boards are plain command/register devices on the I2C bus:
//! - Relay: `[cmd][0x01]`, OFF = 0x00, ON = 0x01
//! - MP3 trigger: one command byte, optionally followed by one data byte

use crate::domain::error::DeviceIoError;
use crate::domain::types::{EqMode, I2cAddress, TrackId, Volume};
use crate::io::devices::{AudioDevice, I2cBus, RelayDevice};
use std::time::Duration;
use tracing::{debug, info};

// Relay commands
const RELAY_OFF: u8 = 0x00;
const RELAY_ON: u8 = 0x01;
const RELAY_SET_ADDRESS: u8 = 0x03;
const RELAY_ARG: u8 = 0x01;

// MP3 trigger commands
const MP3_STOP: u8 = 0x00;
const MP3_PLAY_TRACK: u8 = 0x01;
const MP3_PLAY_FILENUMBER: u8 = 0x02;
const MP3_PAUSE: u8 = 0x03;
const MP3_PLAY_NEXT: u8 = 0x04;
const MP3_PLAY_PREVIOUS: u8 = 0x05;
const MP3_SET_EQ: u8 = 0x06;
const MP3_SET_VOLUME: u8 = 0x07;
const MP3_SET_ADDRESS: u8 = 0xC7;

/// Boards need this long to commit a new address to NVM
const ADDRESS_CHANGE_SETTLE: Duration = Duration::from_millis(50);

pub struct QwiicRelay<B: I2cBus> {
    bus: B,
    address: I2cAddress,
}

impl<B: I2cBus> QwiicRelay<B> {
    pub fn new(bus: B, address: I2cAddress) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> I2cAddress {
        self.address
    }

    /// Move the board to a new address; later commands use the new one
    pub fn set_address(&mut self, new_address: I2cAddress) -> Result<(), DeviceIoError> {
        self.bus.write_byte_data(self.address.get(), RELAY_SET_ADDRESS, new_address.get())?;
        std::thread::sleep(ADDRESS_CHANGE_SETTLE);
        info!(old = %self.address, new = %new_address, "relay_address_changed");
        self.address = new_address;
        Ok(())
    }
}

impl<B: I2cBus> RelayDevice for QwiicRelay<B> {
    fn on(&mut self) -> Result<(), DeviceIoError> {
        debug!(address = %self.address, "relay_on");
        self.bus.write_byte_data(self.address.get(), RELAY_ON, RELAY_ARG)
    }

    fn off(&mut self) -> Result<(), DeviceIoError> {
        debug!(address = %self.address, "relay_off");
        self.bus.write_byte_data(self.address.get(), RELAY_OFF, RELAY_ARG)
    }
}

pub struct Mp3Trigger<B: I2cBus> {
    bus: B,
    address: I2cAddress,
}

impl<B: I2cBus> Mp3Trigger<B> {
    pub fn new(bus: B, address: I2cAddress) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> I2cAddress {
        self.address
    }

    /// Play F<nnn>.mp3 from the card root
    pub fn play_file(&mut self, file_number: u8) -> Result<(), DeviceIoError> {
        self.bus.write_byte_data(self.address.get(), MP3_PLAY_FILENUMBER, file_number)
    }

    /// Pause if playing, resume if paused
    pub fn pause(&mut self) -> Result<(), DeviceIoError> {
        self.bus.write_byte(self.address.get(), MP3_PAUSE)
    }

    pub fn play_next(&mut self) -> Result<(), DeviceIoError> {
        self.bus.write_byte(self.address.get(), MP3_PLAY_NEXT)
    }

    pub fn play_previous(&mut self) -> Result<(), DeviceIoError> {
        self.bus.write_byte(self.address.get(), MP3_PLAY_PREVIOUS)
    }

    pub fn set_address(&mut self, new_address: I2cAddress) -> Result<(), DeviceIoError> {
        self.bus.write_byte_data(self.address.get(), MP3_SET_ADDRESS, new_address.get())?;
        std::thread::sleep(ADDRESS_CHANGE_SETTLE);
        info!(old = %self.address, new = %new_address, "mp3_address_changed");
        self.address = new_address;
        Ok(())
    }
}

impl<B: I2cBus> AudioDevice for Mp3Trigger<B> {
    fn set_volume(&mut self, level: Volume) -> Result<(), DeviceIoError> {
        self.bus.write_byte_data(self.address.get(), MP3_SET_VOLUME, level.get())
    }

    fn play_track(&mut self, track: TrackId) -> Result<(), DeviceIoError> {
        debug!(address = %self.address, track = %track, "mp3_play_track");
        self.bus.write_byte_data(self.address.get(), MP3_PLAY_TRACK, track.get())
    }

    fn stop(&mut self) -> Result<(), DeviceIoError> {
        self.bus.write_byte(self.address.get(), MP3_STOP)
    }

    fn set_eq(&mut self, mode: EqMode) -> Result<(), DeviceIoError> {
        self.bus.write_byte_data(self.address.get(), MP3_SET_EQ, mode.code())
    }
}
