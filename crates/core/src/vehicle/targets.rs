//! Control targets produced by the active flight mode
//!
//! The host feeds `FlightTargets` to its attitude and throttle controllers
//! after every cycle.

use nalgebra::Vector2;

/// Attitude demand (radians, rad/s)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttitudeTarget {
    /// Roll angle target
    pub roll: f32,
    /// Pitch angle target
    pub pitch: f32,
    /// Yaw rate target
    pub yaw_rate: f32,
}

/// Vertical command from the axis position controller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisCommand {
    /// Target position (m)
    pub position: f32,
    /// Velocity command (m/s)
    pub velocity: f32,
    /// Acceleration command (m/s/s)
    pub acceleration: f32,
}

/// Horizontal command from the waypoint navigator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalCommand {
    /// Target position (m, NE)
    pub position: Vector2<f32>,
    /// Velocity command (m/s, NE)
    pub velocity: Vector2<f32>,
    /// Acceleration command (m/s/s, NE)
    pub acceleration: Vector2<f32>,
}

impl Default for HorizontalCommand {
    fn default() -> Self {
        Self {
            position: Vector2::zeros(),
            velocity: Vector2::zeros(),
            acceleration: Vector2::zeros(),
        }
    }
}

/// Throttle demand
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ThrottleDemand {
    /// Motors at idle / spool down
    #[default]
    Idle,
    /// Direct pilot throttle (0..1)
    Manual(f32),
    /// Closed-loop climb from the axis position controller
    Climb(AxisCommand),
}

/// Complete per-cycle output of the flight core
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlightTargets {
    /// Attitude demand
    pub attitude: AttitudeTarget,
    /// Throttle demand
    pub throttle: ThrottleDemand,
    /// Horizontal command, when the mode controls position
    pub horizontal: Option<HorizontalCommand>,
}

impl FlightTargets {
    /// Level attitude with motors at idle
    pub fn idle() -> Self {
        Self::default()
    }
}
