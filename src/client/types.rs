//! Types returned by the Tinymovr client.
use std::fmt;

use semver::Version;
use strum_macros::{Display, FromRepr};

use crate::codec::Record;
use crate::Error;

/// Controller state
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum State {
    Idle = 0,
    Calibrate = 1,
    ClosedLoopControl = 2,
}

/// Control mode used while in [`State::ClosedLoopControl`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ControlMode {
    Current = 0,
    Velocity = 1,
    Position = 2,
}

/// Error codes reported in the `state` endpoint
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorId {
    NoError,
    InvalidState,
    ControlBlockReentered,
    VBusUndervoltage,
    OverCurrent,
    PwmLimitExceeded,
    PhaseResistanceOutOfRange,
    PhaseInductanceOutOfRange,
    InvalidPolePairs,
    EncoderReadingOutOfRange,
    EncoderReadingUnstable,

    NonStandard(u8),
}

impl From<u8> for ErrorId {
    fn from(val: u8) -> ErrorId {
        match val {
            0x00 => ErrorId::NoError,
            0x01 => ErrorId::InvalidState,
            0x02 => ErrorId::ControlBlockReentered,
            0x03 => ErrorId::VBusUndervoltage,
            0x04 => ErrorId::OverCurrent,
            0x05 => ErrorId::PwmLimitExceeded,
            0x06 => ErrorId::PhaseResistanceOutOfRange,
            0x07 => ErrorId::PhaseInductanceOutOfRange,
            0x08 => ErrorId::InvalidPolePairs,
            0x09 => ErrorId::EncoderReadingOutOfRange,
            0x0a => ErrorId::EncoderReadingUnstable,
            _ => ErrorId::NonStandard(val),
        }
    }
}

impl From<ErrorId> for u8 {
    fn from(val: ErrorId) -> u8 {
        match val {
            ErrorId::NoError => 0x00,
            ErrorId::InvalidState => 0x01,
            ErrorId::ControlBlockReentered => 0x02,
            ErrorId::VBusUndervoltage => 0x03,
            ErrorId::OverCurrent => 0x04,
            ErrorId::PwmLimitExceeded => 0x05,
            ErrorId::PhaseResistanceOutOfRange => 0x06,
            ErrorId::PhaseInductanceOutOfRange => 0x07,
            ErrorId::InvalidPolePairs => 0x08,
            ErrorId::EncoderReadingOutOfRange => 0x09,
            ErrorId::EncoderReadingUnstable => 0x0a,
            ErrorId::NonStandard(val) => val,
        }
    }
}

/// Byte of a `u8` field, missing fields read as 0
fn byte(record: &Record, label: &str) -> u8 {
    record.value(label).unwrap_or(0.0) as u8
}

/// Decoded `state` endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceState {
    pub state: State,
    pub mode: ControlMode,
    /// Active errors, empty when the device is healthy
    pub errors: Vec<ErrorId>,
}

impl TryFrom<&Record> for DeviceState {
    type Error = Error;
    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let state = State::from_repr(byte(record, "state")).ok_or(Error::MalformedFrame)?;
        let mode = ControlMode::from_repr(byte(record, "mode")).ok_or(Error::MalformedFrame)?;

        // Firmware before the error list only filled in the legacy error byte
        let mut errors: Vec<ErrorId> = ["error0", "error1", "error2", "error3", "error4"]
            .iter()
            .map(|label| ErrorId::from(byte(record, label)))
            .filter(|error| *error != ErrorId::NoError)
            .collect();
        let legacy = ErrorId::from(byte(record, "error"));
        if errors.is_empty() && legacy != ErrorId::NoError {
            errors.push(legacy);
        }

        Ok(Self { state, mode, errors })
    }
}

/// Decoded `device_info` endpoint
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    pub device_id: u32,
    pub fw_major: u8,
    pub fw_minor: u8,
    pub fw_patch: u8,
    /// MCU temperature in degrees Celsius
    pub temperature: u8,
}

impl DeviceInfo {
    pub fn firmware(&self) -> Version {
        Version::new(self.fw_major as u64, self.fw_minor as u64, self.fw_patch as u64)
    }
}

impl TryFrom<&Record> for DeviceInfo {
    type Error = Error;
    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let device_id = record.value("device_id").ok_or(Error::MalformedFrame)? as u32;

        Ok(Self {
            device_id,
            fw_major: byte(record, "fw_major"),
            fw_minor: byte(record, "fw_minor"),
            fw_patch: byte(record, "fw_patch"),
            temperature: byte(record, "temp"),
        })
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device ID {}, firmware {}, {}°C",
            self.device_id,
            self.firmware(),
            self.temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::endpoints::resolve;

    #[test]
    fn error_id_round_trip() {
        for code in 0..=0xff {
            assert_eq!(u8::from(ErrorId::from(code)), code);
        }
        assert_eq!(ErrorId::from(0x01), ErrorId::InvalidState);
        assert_eq!(ErrorId::from(0x42), ErrorId::NonStandard(0x42));
    }

    #[test]
    fn state_from_record() {
        let record = codec::decode(resolve("state").unwrap(), &[1, 2, 2, 1, 4, 0, 0, 0]).unwrap();
        let state = DeviceState::try_from(&record).unwrap();
        assert_eq!(state.state, State::ClosedLoopControl);
        assert_eq!(state.mode, ControlMode::Position);
        assert_eq!(state.errors, vec![ErrorId::InvalidState, ErrorId::OverCurrent]);
    }

    #[test]
    fn state_legacy_error_byte() {
        let record = codec::decode(resolve("state").unwrap(), &[1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let state = DeviceState::try_from(&record).unwrap();
        assert_eq!(state.state, State::Idle);
        assert_eq!(state.errors, vec![ErrorId::InvalidState]);
    }

    #[test]
    fn state_rejects_unknown_mode() {
        let record = codec::decode(resolve("state").unwrap(), &[0, 0, 9, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(DeviceState::try_from(&record), Err(Error::MalformedFrame));
    }

    #[test]
    fn device_info_firmware() {
        let record = codec::decode(resolve("device_info").unwrap(), &[1, 0, 0, 0, 0, 8, 4, 40]).unwrap();
        let info = DeviceInfo::try_from(&record).unwrap();
        assert_eq!(info.device_id, 1);
        assert_eq!(info.firmware(), Version::new(0, 8, 4));
        assert_eq!(info.to_string(), "Device ID 1, firmware 0.8.4, 40°C");
    }
}
