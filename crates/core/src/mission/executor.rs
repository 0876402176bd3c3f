//! Mission Executor Trait and Event Types
//!
//! Defines the contract between the [`MissionSequencer`](super::MissionSequencer)
//! and the mode that physically flies mission commands. Modeled after
//! ArduPilot's AP_Mission 3-callback interface (cmd_start_fn, cmd_verify_fn,
//! mission_complete_fn).

use crate::mode::ModeContext;

use super::MissionCommand;

/// Result of starting a mission command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStartResult {
    /// Command accepted and executing (verify will be called each tick)
    Accepted,
    /// Command completed immediately (no verify needed)
    Complete,
    /// Command not recognized or not supported (skip)
    Unsupported,
}

/// Events emitted by the sequencer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionEvent {
    /// Current NAV command changed (seq index)
    CurrentChanged(u16),
    /// A mission item was reached after hold time (seq index)
    ItemReached(u16),
    /// Mission completed (no more NAV commands)
    MissionComplete,
}

/// Command execution contract between sequencer and flight mode.
pub trait MissionExecutor {
    /// Begin executing a mission command.
    ///
    /// NAV commands set a navigation target and return `Accepted`. DO
    /// commands apply their effect and return `Complete`.
    fn start_command(&mut self, ctx: &mut ModeContext<'_>, cmd: &MissionCommand) -> CommandStartResult;

    /// Check if a command has completed; called each tick for the active
    /// command.
    fn verify_command(&mut self, ctx: &mut ModeContext<'_>, cmd: &MissionCommand) -> bool;

    /// Called when no more NAV commands remain in the mission.
    fn on_mission_complete(&mut self, ctx: &mut ModeContext<'_>);
}
