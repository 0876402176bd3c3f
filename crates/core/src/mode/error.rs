//! Mode transition and command error types

use super::descriptor::ModeId;

/// Reasons a mode transition or mode command was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    /// Mode needs a valid horizontal position and none is available
    PositionUnavailable {
        /// Mode that was requested
        mode: ModeId,
    },
    /// Home position has not been recorded
    HomeNotSet,
    /// Mission has no commands
    MissionEmpty,
    /// Mission storage is full
    MissionFull,
    /// Mission index out of bounds
    InvalidMissionIndex(u16),
    /// Command requires armed motors
    NotArmed,
    /// Command not accepted while the vehicle is on the ground
    Landed,
    /// Command not accepted while the vehicle is flying
    AlreadyFlying,
    /// Command addressed to a mode that is not active
    WrongMode {
        /// Mode the command belongs to
        expected: ModeId,
        /// Mode that is active
        actual: ModeId,
    },
    /// Ground-control mode number is not a known mode
    UnknownMode(u8),
}

impl core::fmt::Display for ModeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModeError::PositionUnavailable { mode } => {
                write!(f, "{} requires a position estimate", mode.name())
            }
            ModeError::HomeNotSet => write!(f, "home not set"),
            ModeError::MissionEmpty => write!(f, "mission empty"),
            ModeError::MissionFull => write!(f, "mission full"),
            ModeError::InvalidMissionIndex(index) => write!(f, "mission index {} out of bounds", index),
            ModeError::NotArmed => write!(f, "not armed"),
            ModeError::Landed => write!(f, "vehicle landed"),
            ModeError::AlreadyFlying => write!(f, "vehicle already flying"),
            ModeError::WrongMode { expected, actual } => {
                write!(f, "command for {} but {} active", expected.name(), actual.name())
            }
            ModeError::UnknownMode(number) => write!(f, "unknown mode number {}", number),
        }
    }
}

impl core::error::Error for ModeError {}

impl ModeError {
    /// Short static description for logging backends without `Display`
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeError::PositionUnavailable { .. } => "position unavailable",
            ModeError::HomeNotSet => "home not set",
            ModeError::MissionEmpty => "mission empty",
            ModeError::MissionFull => "mission full",
            ModeError::InvalidMissionIndex(_) => "invalid mission index",
            ModeError::NotArmed => "not armed",
            ModeError::Landed => "landed",
            ModeError::AlreadyFlying => "already flying",
            ModeError::WrongMode { .. } => "wrong mode",
            ModeError::UnknownMode(_) => "unknown mode",
        }
    }
}
