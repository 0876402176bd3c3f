//! Mission Sequencer
//!
//! Platform-agnostic state machine that walks the mission: it loads NAV
//! commands one at a time, runs the DO commands that follow each NAV
//! command immediately, applies waypoint hold times and reports progress.
//! Modeled after ArduPilot's AP_Mission.
//!
//! The sequencer never flies anything itself. It drives physical execution
//! through the [`MissionExecutor`] trait.

use heapless::Vec;

use crate::mode::{ModeContext, ModeError};

use super::executor::{CommandStartResult, MissionEvent, MissionExecutor};
use super::state::MissionState;
use super::{CommandKind, MissionStorage, MAX_COMMANDS};

/// Maximum mission events emitted per update cycle.
///
/// One cycle can reach every stored item, then load a NAV command and
/// complete the mission.
pub const MAX_MISSION_EVENTS: usize = MAX_COMMANDS + 2;

/// Mission sequencer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionSequencer {
    state: MissionState,
    /// Index of the active NAV command
    nav_cmd_index: u16,
    nav_cmd_loaded: bool,
    /// Seconds spent holding at the reached NAV command
    holding_for: Option<f32>,
    /// Speed override from DO_CHANGE_SPEED
    mission_speed: Option<f32>,
}

impl MissionSequencer {
    /// Create a new sequencer in Idle state.
    pub const fn new() -> Self {
        Self {
            state: MissionState::Idle,
            nav_cmd_index: 0,
            nav_cmd_loaded: false,
            holding_for: None,
            mission_speed: None,
        }
    }

    /// Get current mission state.
    pub fn state(&self) -> MissionState {
        self.state
    }

    /// Index of the active NAV command
    pub fn current_nav_index(&self) -> u16 {
        self.nav_cmd_index
    }

    /// Speed override from DO_CHANGE_SPEED (None = use default).
    pub fn mission_speed(&self) -> Option<f32> {
        self.mission_speed
    }

    /// Returns true while waiting out a waypoint hold time
    pub fn is_holding(&self) -> bool {
        self.holding_for.is_some()
    }

    /// Start mission execution from index 0.
    ///
    /// Returns no events if the mission has no NAV command (state stays
    /// Idle).
    pub fn start(
        &mut self,
        executor: &mut dyn MissionExecutor,
        ctx: &mut ModeContext<'_>,
    ) -> Vec<MissionEvent, MAX_MISSION_EVENTS> {
        let mut events = Vec::new();
        self.holding_for = None;
        self.mission_speed = None;
        self.nav_cmd_loaded = false;

        if self.load_nav_from(0, executor, ctx, &mut events) {
            self.state = MissionState::Running;
        } else {
            self.state = MissionState::Idle;
        }
        events
    }

    /// Stop mission execution, preserving the index for a later resume.
    pub fn stop(&mut self) {
        self.state = MissionState::Idle;
        self.nav_cmd_loaded = false;
        self.holding_for = None;
    }

    /// Restart execution at `index` (MISSION_SET_CURRENT).
    pub fn set_current(
        &mut self,
        index: u16,
        executor: &mut dyn MissionExecutor,
        ctx: &mut ModeContext<'_>,
    ) -> Result<Vec<MissionEvent, MAX_MISSION_EVENTS>, ModeError> {
        if index >= ctx.mission.count() {
            return Err(ModeError::InvalidMissionIndex(index));
        }

        let mut events = Vec::new();
        self.holding_for = None;
        self.nav_cmd_loaded = false;
        if self.load_nav_from(index, executor, ctx, &mut events) {
            self.state = MissionState::Running;
        }
        Ok(events)
    }

    /// Main tick: verify the active NAV command and advance when done.
    pub fn update(
        &mut self,
        executor: &mut dyn MissionExecutor,
        ctx: &mut ModeContext<'_>,
    ) -> Vec<MissionEvent, MAX_MISSION_EVENTS> {
        let mut events = Vec::new();

        if self.state != MissionState::Running || !self.nav_cmd_loaded {
            return events;
        }

        let storage: &MissionStorage = ctx.mission;
        let Some(cmd) = storage.get(self.nav_cmd_index) else {
            self.complete(executor, ctx, &mut events);
            return events;
        };

        if self.holding_for.is_none() && !executor.verify_command(ctx, cmd) {
            return events;
        }

        let hold_time = cmd.kind().hold_time();
        if hold_time > 0.0 {
            let held = self.holding_for.unwrap_or(0.0);
            if self.holding_for.is_none() || held < hold_time {
                self.holding_for = Some(held + ctx.dt);
                return events;
            }
        }

        let _ = events.push(MissionEvent::ItemReached(self.nav_cmd_index));
        self.holding_for = None;
        self.nav_cmd_loaded = false;
        let next = self.nav_cmd_index + 1;
        if !self.load_nav_from(next, executor, ctx, &mut events) {
            self.complete(executor, ctx, &mut events);
        }
        events
    }

    fn complete(
        &mut self,
        executor: &mut dyn MissionExecutor,
        ctx: &mut ModeContext<'_>,
        events: &mut Vec<MissionEvent, MAX_MISSION_EVENTS>,
    ) {
        self.state = MissionState::Completed;
        self.nav_cmd_loaded = false;
        executor.on_mission_complete(ctx);
        let _ = events.push(MissionEvent::MissionComplete);
    }

    /// Load the first NAV command at or after `start_index`, then run the
    /// DO commands up to the following NAV command.
    ///
    /// Returns true if a NAV command was loaded.
    fn load_nav_from(
        &mut self,
        start_index: u16,
        executor: &mut dyn MissionExecutor,
        ctx: &mut ModeContext<'_>,
        events: &mut Vec<MissionEvent, MAX_MISSION_EVENTS>,
    ) -> bool {
        let storage: &MissionStorage = ctx.mission;
        let mut index = start_index;

        while let Some(cmd) = storage.get(index) {
            if cmd.is_nav() {
                match executor.start_command(ctx, cmd) {
                    CommandStartResult::Accepted => {
                        self.nav_cmd_index = index;
                        self.nav_cmd_loaded = true;
                        let _ = events.push(MissionEvent::CurrentChanged(index));
                        self.run_do_commands(index + 1, executor, ctx);
                        return true;
                    }
                    CommandStartResult::Complete => {
                        let _ = events.push(MissionEvent::ItemReached(index));
                    }
                    CommandStartResult::Unsupported => {
                        log_warn!("mission: skipping unsupported command {}", cmd.command);
                    }
                }
            }
            index += 1;
        }
        false
    }

    /// Run DO commands from `start_index` up to the next NAV command
    fn run_do_commands(&mut self, start_index: u16, executor: &mut dyn MissionExecutor, ctx: &mut ModeContext<'_>) {
        let storage: &MissionStorage = ctx.mission;
        let mut index = start_index;

        while let Some(cmd) = storage.get(index) {
            if cmd.is_nav() {
                return;
            }
            if let CommandKind::ChangeSpeed { speed } = cmd.kind() {
                if speed > 0.0 && speed.is_finite() {
                    self.mission_speed = Some(speed);
                }
            }
            if executor.start_command(ctx, cmd) == CommandStartResult::Unsupported {
                log_warn!("mission: skipping unsupported command {}", cmd.command);
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::command::MAV_CMD_NAV_GUIDED_ENABLE;
    use crate::mission::{CommandKind, MissionCommand, MissionStorage};
    use crate::mode::FlightSystems;
    use crate::parameters::FlightConfig;
    use nalgebra::Vector3;

    /// Executor that reports a NAV command reached after `verify_after` calls
    struct MockExecutor {
        started: std::vec::Vec<u16>,
        verify_calls: u32,
        verify_after: u32,
        completed: bool,
        /// NAV command ids that finish as soon as they start
        instant: std::vec::Vec<u16>,
    }

    impl MockExecutor {
        fn new(verify_after: u32) -> Self {
            Self {
                started: std::vec::Vec::new(),
                verify_calls: 0,
                verify_after,
                completed: false,
                instant: std::vec::Vec::new(),
            }
        }
    }

    impl MissionExecutor for MockExecutor {
        fn start_command(&mut self, _ctx: &mut ModeContext<'_>, cmd: &MissionCommand) -> CommandStartResult {
            self.started.push(cmd.command);
            self.verify_calls = 0;
            if let CommandKind::Unsupported(_) = cmd.kind() {
                CommandStartResult::Unsupported
            } else if self.instant.contains(&cmd.command) {
                CommandStartResult::Complete
            } else if cmd.is_nav() {
                CommandStartResult::Accepted
            } else {
                CommandStartResult::Complete
            }
        }

        fn verify_command(&mut self, _ctx: &mut ModeContext<'_>, _cmd: &MissionCommand) -> bool {
            self.verify_calls += 1;
            self.verify_calls >= self.verify_after
        }

        fn on_mission_complete(&mut self, _ctx: &mut ModeContext<'_>) {
            self.completed = true;
        }
    }

    fn systems_with(commands: &[MissionCommand]) -> FlightSystems {
        let mut mission = MissionStorage::new();
        for cmd in commands {
            mission.add_command(*cmd).unwrap();
        }
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.mission = mission;
        systems
    }

    #[test]
    fn test_start_empty_mission_stays_idle() {
        let mut systems = systems_with(&[]);
        let mut ctx = systems.context(0.01);
        let mut exec = MockExecutor::new(1);
        let mut seq = MissionSequencer::new();

        let events = seq.start(&mut exec, &mut ctx);
        assert!(events.is_empty());
        assert_eq!(seq.state(), MissionState::Idle);
    }

    #[test]
    fn test_start_runs_do_commands_after_first_nav() {
        let mut systems = systems_with(&[
            MissionCommand::takeoff(10.0),
            MissionCommand::change_speed(4.0),
            MissionCommand::waypoint(Vector3::new(10.0, 0.0, 10.0)),
        ]);
        let mut ctx = systems.context(0.01);
        let mut exec = MockExecutor::new(1);
        let mut seq = MissionSequencer::new();

        let events = seq.start(&mut exec, &mut ctx);
        assert_eq!(events.as_slice(), &[MissionEvent::CurrentChanged(0)]);
        assert_eq!(seq.state(), MissionState::Running);
        assert_eq!(seq.mission_speed(), Some(4.0));
        assert_eq!(exec.started.as_slice(), &[22, 178]);
    }

    #[test]
    fn test_run_of_instant_nav_commands_keeps_every_event() {
        let mut commands = std::vec::Vec::new();
        commands.push(MissionCommand::waypoint(Vector3::new(10.0, 0.0, 10.0)));
        for _ in 0..6 {
            commands.push(MissionCommand::new(MAV_CMD_NAV_GUIDED_ENABLE, Vector3::zeros()));
        }
        commands.push(MissionCommand::waypoint(Vector3::new(50.0, 0.0, 10.0)));
        let mut systems = systems_with(&commands);
        let mut ctx = systems.context(0.01);
        let mut exec = MockExecutor::new(1);
        exec.instant.push(MAV_CMD_NAV_GUIDED_ENABLE);
        let mut seq = MissionSequencer::new();
        seq.start(&mut exec, &mut ctx);

        let events = seq.update(&mut exec, &mut ctx);
        assert_eq!(seq.current_nav_index(), 7);
        assert_eq!(events.len(), 8);
        let reached: std::vec::Vec<MissionEvent> = (0..7).map(MissionEvent::ItemReached).collect();
        assert_eq!(&events[..7], reached.as_slice());
        assert_eq!(events.last(), Some(&MissionEvent::CurrentChanged(7)));
    }

    #[test]
    fn test_advance_and_complete() {
        let mut systems = systems_with(&[
            MissionCommand::takeoff(10.0),
            MissionCommand::waypoint(Vector3::new(10.0, 0.0, 10.0)),
        ]);
        let mut ctx = systems.context(0.01);
        let mut exec = MockExecutor::new(2);
        let mut seq = MissionSequencer::new();
        seq.start(&mut exec, &mut ctx);

        assert!(seq.update(&mut exec, &mut ctx).is_empty());
        let events = seq.update(&mut exec, &mut ctx);
        assert_eq!(
            events.as_slice(),
            &[MissionEvent::ItemReached(0), MissionEvent::CurrentChanged(1)]
        );
        assert_eq!(seq.current_nav_index(), 1);

        seq.update(&mut exec, &mut ctx);
        let events = seq.update(&mut exec, &mut ctx);
        assert_eq!(
            events.as_slice(),
            &[MissionEvent::ItemReached(1), MissionEvent::MissionComplete]
        );
        assert_eq!(seq.state(), MissionState::Completed);
        assert!(exec.completed);
    }

    #[test]
    fn test_waypoint_hold_time() {
        let mut wp = MissionCommand::waypoint(Vector3::new(10.0, 0.0, 10.0));
        wp.param1 = 0.05;
        let mut systems = systems_with(&[wp, MissionCommand::land(0.0, 0.0)]);
        let mut ctx = systems.context(0.01);
        let mut exec = MockExecutor::new(1);
        let mut seq = MissionSequencer::new();
        seq.start(&mut exec, &mut ctx);

        let mut cycles = 0;
        while seq.current_nav_index() == 0 {
            seq.update(&mut exec, &mut ctx);
            cycles += 1;
            assert!(cycles < 100);
        }
        // Reached on the first tick, then 0.05 s of holding at 0.01 s per tick
        assert!(cycles >= 6);
        assert!(!seq.is_holding());
    }

    #[test]
    fn test_unsupported_nav_command_skipped() {
        let mut systems = systems_with(&[
            // NAV_LOITER_TO_ALT is not flown
            MissionCommand::new(31, Vector3::zeros()),
            MissionCommand::waypoint(Vector3::new(10.0, 0.0, 10.0)),
        ]);
        let mut ctx = systems.context(0.01);
        let mut exec = MockExecutor::new(1);
        let mut seq = MissionSequencer::new();

        let events = seq.start(&mut exec, &mut ctx);
        assert_eq!(events.as_slice(), &[MissionEvent::CurrentChanged(1)]);
        assert_eq!(exec.started.as_slice(), &[31, 16]);
    }

    #[test]
    fn test_set_current_out_of_bounds() {
        let mut systems = systems_with(&[MissionCommand::takeoff(10.0)]);
        let mut ctx = systems.context(0.01);
        let mut exec = MockExecutor::new(1);
        let mut seq = MissionSequencer::new();
        assert_eq!(
            seq.set_current(3, &mut exec, &mut ctx),
            Err(ModeError::InvalidMissionIndex(3))
        );
        assert!(seq.set_current(0, &mut exec, &mut ctx).is_ok());
        assert_eq!(seq.state(), MissionState::Running);
    }
}
