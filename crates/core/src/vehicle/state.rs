//! Vehicle state snapshot
//!
//! `VehicleState` is refreshed by the host from its sensor-fusion and motor
//! output collaborators before every control cycle. The flight core only
//! reads it.
//!
//! All positions are in metres in a north-east-up frame relative to the EKF
//! origin; `position.z` is altitude above the origin.

use nalgebra::{Vector2, Vector3};

/// Attitude estimate (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Attitude {
    /// Roll angle (positive right wing down)
    pub roll: f32,
    /// Pitch angle (positive nose up)
    pub pitch: f32,
    /// Heading (0 = north, positive clockwise)
    pub yaw: f32,
}

/// EKF origin and reset status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EkfStatus {
    /// EKF origin is set and the position estimate is usable
    pub origin_valid: bool,
    /// Incremented whenever the estimate is discontinuously re-anchored
    pub reset_epoch: u32,
    /// Total shift applied by the most recent reset (m)
    pub reset_offset: Vector3<f32>,
}

impl Default for EkfStatus {
    fn default() -> Self {
        Self {
            origin_valid: false,
            reset_epoch: 0,
            reset_offset: Vector3::zeros(),
        }
    }
}

/// Motor saturation flags reported by the motor output stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorLimits {
    /// Motors at minimum thrust (cannot descend faster)
    pub throttle_lower: bool,
    /// Motors at maximum thrust (cannot climb faster)
    pub throttle_upper: bool,
}

/// Normalized pilot stick input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PilotInput {
    /// Roll stick (-1..1)
    pub roll: f32,
    /// Pitch stick (-1..1, positive pulls back)
    pub pitch: f32,
    /// Yaw stick (-1..1)
    pub yaw: f32,
    /// Throttle stick (0..1)
    pub throttle: f32,
}

impl Default for PilotInput {
    fn default() -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            throttle: 0.5,
        }
    }
}

/// Vehicle state consumed by the flight core each cycle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Attitude estimate
    pub attitude: Attitude,
    /// Position estimate (m, NEU)
    pub position: Vector3<f32>,
    /// Velocity estimate (m/s, NEU)
    pub velocity: Vector3<f32>,
    /// Horizontal position estimate is valid (GPS or equivalent)
    pub position_valid: bool,
    /// EKF origin and reset status
    pub ekf: EkfStatus,
    /// Motors armed
    pub armed: bool,
    /// Land detector reports the vehicle on the ground
    pub landed: bool,
    /// Motor saturation flags
    pub motors: MotorLimits,
    /// Pilot stick input
    pub pilot: PilotInput,
    /// Home position, if recorded
    pub home: Option<Vector3<f32>>,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            attitude: Attitude::default(),
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            position_valid: false,
            ekf: EkfStatus::default(),
            armed: false,
            landed: true,
            motors: MotorLimits::default(),
            pilot: PilotInput::default(),
            home: None,
        }
    }
}

impl VehicleState {
    /// Returns true if a horizontal position source is usable
    pub fn position_ok(&self) -> bool {
        self.position_valid && self.ekf.origin_valid
    }

    /// Altitude above the EKF origin (m)
    pub fn altitude(&self) -> f32 {
        self.position.z
    }

    /// Climb rate (m/s, positive up)
    pub fn climb_rate(&self) -> f32 {
        self.velocity.z
    }

    /// Horizontal position (m)
    pub fn position_xy(&self) -> Vector2<f32> {
        self.position.xy()
    }

    /// Horizontal velocity (m/s)
    pub fn velocity_xy(&self) -> Vector2<f32> {
        self.velocity.xy()
    }

    /// Altitude above home, or above the origin when home is not set (m)
    pub fn altitude_above_home(&self) -> f32 {
        match self.home {
            Some(home) => self.position.z - home.z,
            None => self.position.z,
        }
    }

    /// Armed and not on the ground
    pub fn is_flying(&self) -> bool {
        self.armed && !self.landed
    }
}
