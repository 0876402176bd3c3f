//! Pilot input shaping
//!
//! Free functions that turn normalized stick positions into control
//! demands. Modes reach them through [`ModeContext`](super::ModeContext).

use libm::{cosf, sinf, sqrtf};
use nalgebra::Vector2;

/// Throttle stick position treated as "hold altitude"
pub const THROTTLE_MID: f32 = 0.5;

/// Scale roll and pitch so the combined lean stays inside `angle_max`
pub fn limit_lean_angles(roll: f32, pitch: f32, angle_max: f32) -> (f32, f32) {
    let total = sqrtf(roll * roll + pitch * pitch);
    if total > angle_max && total > 0.0 {
        let ratio = angle_max / total;
        (roll * ratio, pitch * ratio)
    } else {
        (roll, pitch)
    }
}

/// Lean angles (rad) from roll/pitch sticks in -1..1
///
/// Full deflection on both sticks is limited to `angle_max` overall.
pub fn lean_angles(roll_in: f32, pitch_in: f32, angle_max: f32) -> (f32, f32) {
    let roll = roll_in.clamp(-1.0, 1.0) * angle_max;
    let pitch = pitch_in.clamp(-1.0, 1.0) * angle_max;
    limit_lean_angles(roll, pitch, angle_max)
}

/// Yaw rate (rad/s) from the yaw stick in -1..1
pub fn yaw_rate(yaw_in: f32, max_rate: f32) -> f32 {
    yaw_in.clamp(-1.0, 1.0) * max_rate
}

/// Climb rate (m/s) from the throttle stick in 0..1
///
/// Mid stick plus or minus the dead zone holds altitude; the rest of each
/// half maps linearly to the climb or descent limit.
pub fn climb_rate(throttle: f32, speed_up: f32, speed_down: f32, deadzone: f32) -> f32 {
    let throttle = throttle.clamp(0.0, 1.0);
    let deadzone = deadzone.clamp(0.0, THROTTLE_MID * 0.9);
    let upper = THROTTLE_MID + deadzone;
    let lower = THROTTLE_MID - deadzone;

    if throttle > upper {
        speed_up * (throttle - upper) / (1.0 - upper)
    } else if throttle < lower {
        -speed_down.abs() * (lower - throttle) / lower
    } else {
        0.0
    }
}

/// Motor throttle from the throttle stick in 0..1
///
/// Applies an expo so mid stick produces `hover` throttle.
pub fn manual_throttle(throttle: f32, hover: f32) -> f32 {
    let throttle = throttle.clamp(0.0, 1.0);
    let expo = (-(hover - 0.5) / 0.375).clamp(-0.5, 1.0);
    throttle * (1.0 - expo) + expo * throttle * throttle * throttle
}

/// Earth-frame horizontal velocity (m/s) from roll/pitch sticks
///
/// Pitch forward (negative stick) flies toward the heading.
pub fn velocity_xy(roll_in: f32, pitch_in: f32, yaw: f32, max_speed: f32) -> Vector2<f32> {
    let forward = -pitch_in.clamp(-1.0, 1.0) * max_speed;
    let right = roll_in.clamp(-1.0, 1.0) * max_speed;
    let (sin_yaw, cos_yaw) = (sinf(yaw), cosf(yaw));

    let vel = Vector2::new(forward * cos_yaw - right * sin_yaw, forward * sin_yaw + right * cos_yaw);
    let speed = vel.norm();
    if speed > max_speed && speed > 0.0 {
        vel * (max_speed / speed)
    } else {
        vel
    }
}
