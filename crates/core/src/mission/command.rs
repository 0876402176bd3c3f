//! Mission Command Classification
//!
//! MAVLink command ids flown by AUTO and helpers for classifying them as
//! NAV (navigation) or DO (immediate action) following ArduPilot's
//! convention where command IDs <= MAV_CMD_NAV_LAST (95) are NAV commands.

use super::MissionCommand;

/// MAV_CMD_NAV_LAST: command IDs at or below this value are NAV commands.
pub const MAV_CMD_NAV_LAST: u16 = 95;

pub const MAV_CMD_NAV_WAYPOINT: u16 = 16;
pub const MAV_CMD_NAV_LOITER_UNLIM: u16 = 17;
pub const MAV_CMD_NAV_LOITER_TURNS: u16 = 18;
pub const MAV_CMD_NAV_LOITER_TIME: u16 = 19;
pub const MAV_CMD_NAV_RETURN_TO_LAUNCH: u16 = 20;
pub const MAV_CMD_NAV_LAND: u16 = 21;
pub const MAV_CMD_NAV_TAKEOFF: u16 = 22;
pub const MAV_CMD_NAV_SPLINE_WAYPOINT: u16 = 82;
pub const MAV_CMD_NAV_GUIDED_ENABLE: u16 = 92;
pub const MAV_CMD_NAV_PAYLOAD_PLACE: u16 = 94;
pub const MAV_CMD_DO_CHANGE_SPEED: u16 = 178;

/// Classify a command as NAV (drives navigation) or DO (immediate action).
pub fn is_nav_command(command_id: u16) -> bool {
    command_id <= MAV_CMD_NAV_LAST
}

/// Decoded mission command
///
/// Parameters are interpreted per MAVLink; positions are metres in the
/// north-east-up frame of the EKF origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    /// Fly to a point, then hold for `hold_time` seconds
    Waypoint { hold_time: f32 },
    /// Spline waypoint, flown as a straight segment
    SplineWaypoint { hold_time: f32 },
    /// Loiter at a point until the mode changes
    LoiterUnlimited,
    /// Circle a point `turns` times
    LoiterTurns { turns: f32, radius: f32 },
    /// Loiter at a point for `time` seconds
    LoiterTime { time: f32 },
    /// Return to launch
    ReturnToLaunch,
    /// Land at a point (or in place when no horizontal position is given)
    Land,
    /// Climb to the command altitude
    Takeoff,
    /// Hand control to an external guidance source (`enable` false ends it)
    GuidedEnable { enable: bool, time_limit: f32 },
    /// Lower a payload until touchdown, release, and climb back
    PayloadPlace { max_descent: f32 },
    /// Change horizontal speed
    ChangeSpeed { speed: f32 },
    /// Any other command id
    Unsupported(u16),
}

impl CommandKind {
    /// Decode a stored command
    pub fn from_command(cmd: &MissionCommand) -> Self {
        match cmd.command {
            MAV_CMD_NAV_WAYPOINT => CommandKind::Waypoint {
                hold_time: cmd.param1.max(0.0),
            },
            MAV_CMD_NAV_SPLINE_WAYPOINT => CommandKind::SplineWaypoint {
                hold_time: cmd.param1.max(0.0),
            },
            MAV_CMD_NAV_LOITER_UNLIM => CommandKind::LoiterUnlimited,
            MAV_CMD_NAV_LOITER_TURNS => CommandKind::LoiterTurns {
                turns: cmd.param1.max(0.0),
                radius: cmd.param3.abs(),
            },
            MAV_CMD_NAV_LOITER_TIME => CommandKind::LoiterTime {
                time: cmd.param1.max(0.0),
            },
            MAV_CMD_NAV_RETURN_TO_LAUNCH => CommandKind::ReturnToLaunch,
            MAV_CMD_NAV_LAND => CommandKind::Land,
            MAV_CMD_NAV_TAKEOFF => CommandKind::Takeoff,
            MAV_CMD_NAV_GUIDED_ENABLE => CommandKind::GuidedEnable {
                enable: cmd.param1 > 0.5,
                time_limit: cmd.param2.max(0.0),
            },
            MAV_CMD_NAV_PAYLOAD_PLACE => CommandKind::PayloadPlace {
                max_descent: cmd.param1.max(0.0),
            },
            MAV_CMD_DO_CHANGE_SPEED => CommandKind::ChangeSpeed { speed: cmd.param2 },
            other => CommandKind::Unsupported(other),
        }
    }

    /// Hold time applied by the sequencer after the command is reached
    pub fn hold_time(&self) -> f32 {
        match self {
            CommandKind::Waypoint { hold_time } | CommandKind::SplineWaypoint { hold_time } => *hold_time,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_is_nav_command_at_boundary() {
        assert!(is_nav_command(MAV_CMD_NAV_WAYPOINT));
        assert!(is_nav_command(95));
        assert!(!is_nav_command(96));
        assert!(!is_nav_command(MAV_CMD_DO_CHANGE_SPEED));
    }

    #[test]
    fn test_decode_loiter_turns() {
        let mut cmd = MissionCommand::new(MAV_CMD_NAV_LOITER_TURNS, Vector3::new(0.0, 0.0, 10.0));
        cmd.param1 = 2.0;
        cmd.param3 = -5.0;
        assert_eq!(
            CommandKind::from_command(&cmd),
            CommandKind::LoiterTurns {
                turns: 2.0,
                radius: 5.0
            }
        );
    }

    #[test]
    fn test_decode_hold_time() {
        let mut cmd = MissionCommand::waypoint(Vector3::new(10.0, 0.0, 10.0));
        cmd.param1 = 3.0;
        assert_eq!(CommandKind::from_command(&cmd).hold_time(), 3.0);

        let cmd = MissionCommand::new(MAV_CMD_NAV_LOITER_TIME, Vector3::zeros());
        assert_eq!(CommandKind::from_command(&cmd).hold_time(), 0.0);
    }

    #[test]
    fn test_decode_unsupported() {
        let cmd = MissionCommand::new(201, Vector3::zeros());
        assert_eq!(CommandKind::from_command(&cmd), CommandKind::Unsupported(201));
    }
}
