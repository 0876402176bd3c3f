//! Mission Management Types
//!
//! Mission command storage and the sequencer AUTO uses to walk it.
//!
//! # Mission Storage
//!
//! - Fixed-size command array (max 50 commands)
//! - In-memory storage (upload and persistence belong to the host)
//! - MAVLink command ids and parameters, positions in the local NEU frame

pub mod command;
pub mod executor;
pub mod sequencer;
pub mod state;

use heapless::Vec;
use nalgebra::Vector3;

use crate::mode::ModeError;

pub use command::{is_nav_command, CommandKind, MAV_CMD_DO_CHANGE_SPEED, MAV_CMD_NAV_LAST};
pub use executor::{CommandStartResult, MissionEvent, MissionExecutor};
pub use sequencer::MissionSequencer;
pub use state::MissionState;

/// Maximum number of commands in a mission
pub const MAX_COMMANDS: usize = 50;

/// Mission command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionCommand {
    /// MAVLink command id
    pub command: u16,
    /// PARAM1 (command-specific, e.g. hold time)
    pub param1: f32,
    /// PARAM2 (command-specific, e.g. speed for DO_CHANGE_SPEED)
    pub param2: f32,
    /// PARAM3 (command-specific, e.g. loiter radius)
    pub param3: f32,
    /// PARAM4 (command-specific, e.g. yaw)
    pub param4: f32,
    /// Target position (m, NEU relative to the EKF origin)
    pub position: Vector3<f32>,
}

impl MissionCommand {
    /// Command with all parameters zero
    pub fn new(command: u16, position: Vector3<f32>) -> Self {
        Self {
            command,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            position,
        }
    }

    /// NAV_WAYPOINT with no hold time
    pub fn waypoint(position: Vector3<f32>) -> Self {
        Self::new(command::MAV_CMD_NAV_WAYPOINT, position)
    }

    /// NAV_TAKEOFF to `altitude` (m)
    pub fn takeoff(altitude: f32) -> Self {
        Self::new(command::MAV_CMD_NAV_TAKEOFF, Vector3::new(0.0, 0.0, altitude))
    }

    /// NAV_LAND at a horizontal position; zero lands in place
    pub fn land(north: f32, east: f32) -> Self {
        Self::new(command::MAV_CMD_NAV_LAND, Vector3::new(north, east, 0.0))
    }

    /// NAV_RETURN_TO_LAUNCH
    pub fn return_to_launch() -> Self {
        Self::new(command::MAV_CMD_NAV_RETURN_TO_LAUNCH, Vector3::zeros())
    }

    /// DO_CHANGE_SPEED to `speed` (m/s)
    pub fn change_speed(speed: f32) -> Self {
        let mut cmd = Self::new(MAV_CMD_DO_CHANGE_SPEED, Vector3::zeros());
        cmd.param2 = speed;
        cmd
    }

    /// Decoded command
    pub fn kind(&self) -> CommandKind {
        CommandKind::from_command(self)
    }

    /// Returns true if the command drives navigation
    pub fn is_nav(&self) -> bool {
        is_nav_command(self.command)
    }
}

/// Mission storage
#[derive(Debug, Clone, Default)]
pub struct MissionStorage {
    commands: Vec<MissionCommand, MAX_COMMANDS>,
}

impl MissionStorage {
    /// Create a new empty mission storage
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Get number of commands
    pub fn count(&self) -> u16 {
        self.commands.len() as u16
    }

    /// Check if mission is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Clear all commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Append a command
    pub fn add_command(&mut self, cmd: MissionCommand) -> Result<(), ModeError> {
        self.commands.push(cmd).map_err(|_| ModeError::MissionFull)
    }

    /// Get a command by sequence number
    pub fn get(&self, seq: u16) -> Option<&MissionCommand> {
        self.commands.get(seq as usize)
    }

    /// Replace the command at `seq`
    pub fn set(&mut self, seq: u16, cmd: MissionCommand) -> Result<(), ModeError> {
        match self.commands.get_mut(seq as usize) {
            Some(slot) => {
                *slot = cmd;
                Ok(())
            }
            None => Err(ModeError::InvalidMissionIndex(seq)),
        }
    }

    /// Get all commands as slice
    pub fn commands(&self) -> &[MissionCommand] {
        &self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_storage_creation() {
        let storage = MissionStorage::new();
        assert_eq!(storage.count(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_add_and_get_command() {
        let mut storage = MissionStorage::new();
        storage.add_command(MissionCommand::takeoff(10.0)).unwrap();
        storage
            .add_command(MissionCommand::waypoint(Vector3::new(20.0, 0.0, 10.0)))
            .unwrap();

        assert_eq!(storage.count(), 2);
        assert_eq!(storage.get(1).unwrap().position.x, 20.0);
        assert!(storage.get(2).is_none());
    }

    #[test]
    fn test_set_command() {
        let mut storage = MissionStorage::new();
        storage.add_command(MissionCommand::takeoff(10.0)).unwrap();
        assert!(storage.set(0, MissionCommand::takeoff(20.0)).is_ok());
        assert_eq!(storage.get(0).unwrap().position.z, 20.0);
        assert_eq!(
            storage.set(5, MissionCommand::takeoff(20.0)),
            Err(ModeError::InvalidMissionIndex(5))
        );
    }

    #[test]
    fn test_clear_mission() {
        let mut storage = MissionStorage::new();
        storage.add_command(MissionCommand::takeoff(10.0)).unwrap();
        storage.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_mission_full() {
        let mut storage = MissionStorage::new();
        for _ in 0..MAX_COMMANDS {
            assert!(storage.add_command(MissionCommand::takeoff(10.0)).is_ok());
        }
        assert_eq!(
            storage.add_command(MissionCommand::takeoff(10.0)),
            Err(ModeError::MissionFull)
        );
    }

    #[test]
    fn test_command_constructors() {
        assert!(MissionCommand::takeoff(10.0).is_nav());
        assert!(!MissionCommand::change_speed(5.0).is_nav());
        assert_eq!(
            MissionCommand::change_speed(5.0).kind(),
            CommandKind::ChangeSpeed { speed: 5.0 }
        );
        assert_eq!(MissionCommand::return_to_launch().kind(), CommandKind::ReturnToLaunch);
    }
}
