//! Trajectory shaping and position control
//!
//! - [`shaping`]: kinematic shaper and bounded-rate corrector
//! - [`pos_z`]: vertical axis position controller
//! - [`wpnav`]: horizontal waypoint navigator

pub mod pos_z;
pub mod shaping;
pub mod wpnav;

pub use pos_z::{AltitudeLimits, AxisPositionController, AxisTargetState, OVERSPEED_GAIN_Z};
pub use shaping::{
    settling_distance, shape_pos_vel_accel_xy, shape_step, shape_vel_accel, sqrt_controller,
    ShapingLimits, VelAccel,
};
pub use wpnav::{accel_to_lean_angles, NavRequest, WaypointNav};
