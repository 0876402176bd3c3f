//! Vertical axis position controller
//!
//! Owns the vertical target state (position, velocity, acceleration) and
//! advances it once per control cycle from a desired climb rate. Altitude
//! limits, overspeed compensation, EKF reset handling and motor-limit
//! anti-windup are applied here so that every mode gets them for free.
//!
//! Invalid configuration never faults: a non-positive time constant
//! disables shaping and inconsistent altitude limits disable limiting.

use crate::parameters::PosControlParams;
use crate::vehicle::{AxisCommand, VehicleState};

use super::shaping::{
    constrain_float, is_valid_time_constant, pos_correction_vel, shape_vel_accel,
    sqrt_controller, update_pos_vel_accel, AxisLimit, ShapingLimits,
};

/// Acceleration-limit gain applied when the desired velocity is already
/// beyond the configured envelope
pub const OVERSPEED_GAIN_Z: f32 = 2.0;

/// Largest altitude limit magnitude accepted as sane (m)
pub const ALT_LIMIT_SANE_ABS: f32 = 1000.0;

/// Altitude limits relative to the EKF origin (m)
///
/// Both zero means "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AltitudeLimits {
    /// Lower limit
    pub min: f32,
    /// Upper limit
    pub max: f32,
}

impl AltitudeLimits {
    /// No altitude limits
    pub const DISABLED: Self = Self { min: 0.0, max: 0.0 };

    /// Create limits
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns true if the limits are consistent and should be enforced
    pub fn is_enabled(&self) -> bool {
        if self.min == 0.0 && self.max == 0.0 {
            return false;
        }
        self.min.is_finite()
            && self.max.is_finite()
            && self.min < self.max
            && self.min.abs() <= ALT_LIMIT_SANE_ABS
            && self.max.abs() <= ALT_LIMIT_SANE_ABS
    }

    /// Returns true if `position` lies outside enabled limits
    pub fn is_outside(&self, position: f32) -> bool {
        self.is_enabled() && (position < self.min || position > self.max)
    }
}

/// Target kinematic state of one axis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisTargetState {
    /// Target position (m)
    pub position: f32,
    /// Target velocity (m/s)
    pub velocity: f32,
    /// Target acceleration (m/s/s)
    pub acceleration: f32,
    /// EKF reset epoch the target was last aligned to
    pub last_ekf_reset_epoch: u32,
    /// Altitude limits
    pub alt_limits: AltitudeLimits,
}

/// Acceleration limit after overspeed compensation
///
/// `vel_max_down` is negative. When `vel_desired` already exceeds the
/// envelope the limit is scaled by `OVERSPEED_GAIN_Z * vel_desired / limit`
/// so the target can be brought back faster than it was allowed to leave.
pub fn overspeed_accel_limit(vel_desired: f32, vel_max_down: f32, vel_max_up: f32, accel_max: f32) -> f32 {
    let mut accel = accel_max;
    if vel_max_down != 0.0 && vel_desired < vel_max_down {
        accel *= OVERSPEED_GAIN_Z * vel_desired / vel_max_down;
    }
    if vel_max_up != 0.0 && vel_desired > vel_max_up {
        accel *= OVERSPEED_GAIN_Z * vel_desired / vel_max_up;
    }
    accel
}

/// Vertical position controller
#[derive(Debug, Clone, PartialEq)]
pub struct AxisPositionController {
    target: AxisTargetState,
    /// Maximum descent rate (m/s, negative)
    vel_max_down: f32,
    /// Maximum climb rate (m/s)
    vel_max_up: f32,
    /// Acceleration limit (m/s/s)
    accel_max: f32,
    /// Shaping time constant (s)
    tc: f32,
    pos_p: f32,
    vel_p: f32,
}

impl AxisPositionController {
    /// Create a controller from the vertical control parameters
    pub fn new(params: &PosControlParams) -> Self {
        Self {
            target: AxisTargetState {
                alt_limits: AltitudeLimits::new(params.alt_min, params.alt_max),
                ..AxisTargetState::default()
            },
            vel_max_down: -params.pilot_speed_dn.abs(),
            vel_max_up: params.pilot_speed_up,
            accel_max: params.accel_z,
            tc: params.tc_z,
            pos_p: params.pos_z_p,
            vel_p: params.vel_z_p,
        }
    }

    /// Current target state
    pub fn target(&self) -> &AxisTargetState {
        &self.target
    }

    /// Maximum descent rate (m/s, negative)
    pub fn max_speed_down(&self) -> f32 {
        self.vel_max_down
    }

    /// Maximum climb rate (m/s)
    pub fn max_speed_up(&self) -> f32 {
        self.vel_max_up
    }

    /// Acceleration limit (m/s/s)
    pub fn max_accel(&self) -> f32 {
        self.accel_max
    }

    /// Vertical position P gain
    pub fn pos_p(&self) -> f32 {
        self.pos_p
    }

    /// Set the speed envelope and acceleration limit
    ///
    /// `speed_down` and `speed_up` are magnitudes.
    pub fn set_max_speed_accel_z(&mut self, speed_down: f32, speed_up: f32, accel: f32) {
        self.vel_max_down = -speed_down.abs();
        self.vel_max_up = speed_up.abs();
        self.accel_max = accel.abs();
    }

    /// Replace the altitude limits
    pub fn set_alt_limits(&mut self, limits: AltitudeLimits) {
        self.target.alt_limits = limits;
    }

    /// Align the target with the current estimate
    ///
    /// Called on mode entry so the new mode starts without a step.
    pub fn init_z_controller(&mut self, state: &VehicleState) {
        self.target.position = state.altitude();
        self.target.velocity = state.climb_rate();
        self.target.acceleration = 0.0;
        self.target.last_ekf_reset_epoch = state.ekf.reset_epoch;
    }

    /// Set the target position without shaping
    pub fn set_pos_target_z(&mut self, position: f32) {
        self.target.position = position;
    }

    /// Shift the stored target if the EKF re-anchored since the last call
    ///
    /// Returns true if a shift was applied.
    pub fn handle_ekf_reset(&mut self, state: &VehicleState) -> bool {
        if state.ekf.reset_epoch == self.target.last_ekf_reset_epoch {
            return false;
        }
        self.target.position += state.ekf.reset_offset.z;
        self.target.last_ekf_reset_epoch = state.ekf.reset_epoch;
        log_debug!("pos_z: ekf reset, target shifted by {}", state.ekf.reset_offset.z);
        true
    }

    /// Advance the target toward a desired velocity and acceleration
    ///
    /// `vel` is updated in place to the input velocity projected forward by
    /// `accel * dt`. `force_descend` lets the target keep descending while
    /// the motors report minimum thrust (used when landing).
    pub fn input_vel_accel_z(
        &mut self,
        vel: &mut f32,
        accel: f32,
        force_descend: bool,
        state: &VehicleState,
        dt: f32,
    ) {
        self.handle_ekf_reset(state);

        let limits = self.target.alt_limits;
        if limits.is_outside(self.target.position) {
            let toward_min = sqrt_controller(limits.min - self.target.position, self.pos_p, self.accel_max, 0.0);
            let toward_max = sqrt_controller(limits.max - self.target.position, self.pos_p, self.accel_max, 0.0);
            *vel = constrain_float(*vel, toward_min, toward_max);
        }

        let accel_limit = overspeed_accel_limit(
            self.target.velocity,
            self.vel_max_down,
            self.vel_max_up,
            self.accel_max,
        );

        let motor_limit = AxisLimit {
            negative: state.motors.throttle_lower && !force_descend,
            positive: state.motors.throttle_upper,
        };
        let pos_error = self.target.position - state.altitude();
        let vel_error = self.target.velocity - state.climb_rate();
        update_pos_vel_accel(
            &mut self.target.position,
            &mut self.target.velocity,
            self.target.acceleration,
            dt,
            motor_limit,
            pos_error,
            vel_error,
        );

        if limits.is_enabled() {
            if self.target.position <= limits.min {
                self.target.position = limits.min;
                self.target.velocity = self.target.velocity.max(0.0);
                self.target.acceleration = self.target.acceleration.max(0.0);
            } else if self.target.position >= limits.max {
                self.target.position = limits.max;
                self.target.velocity = self.target.velocity.min(0.0);
                self.target.acceleration = self.target.acceleration.min(0.0);
            }
        }

        if is_valid_time_constant(self.tc) {
            let shaping = ShapingLimits {
                vel_min: self.vel_max_down,
                vel_max: self.vel_max_up,
                accel_min: -accel_limit,
                accel_max: accel_limit,
            };
            self.target.acceleration = shape_vel_accel(
                *vel,
                accel,
                self.target.velocity,
                self.target.acceleration,
                &shaping,
                self.tc,
                dt,
            );
        } else {
            self.target.velocity = constrain_float(*vel, self.vel_max_down, self.vel_max_up);
            self.target.acceleration = accel;
        }

        *vel += accel * dt;
    }

    /// Advance the target toward a climb rate (m/s)
    pub fn set_pos_target_z_from_climb_rate(
        &mut self,
        climb_rate: f32,
        force_descend: bool,
        state: &VehicleState,
        dt: f32,
    ) {
        let mut vel = climb_rate;
        self.input_vel_accel_z(&mut vel, 0.0, force_descend, state, dt);
    }

    /// Advance the target toward an altitude (m)
    ///
    /// The climb rate toward `position` is limited to `speed_down` and
    /// `speed_up` (magnitudes) and then shaped like any other climb rate.
    pub fn input_pos_z(
        &mut self,
        position: f32,
        speed_down: f32,
        speed_up: f32,
        state: &VehicleState,
        dt: f32,
    ) {
        self.handle_ekf_reset(state);
        let climb_rate = pos_correction_vel(
            position,
            self.target.position,
            self.target.velocity,
            self.target.acceleration,
            self.accel_max,
            self.tc,
            self.pos_p,
            dt,
        );
        let mut vel = constrain_float(climb_rate, -speed_down.abs(), speed_up.abs());
        self.input_vel_accel_z(&mut vel, 0.0, false, state, dt);
    }

    /// Run the position and velocity loops against the current estimate
    pub fn update_z_controller(&mut self, state: &VehicleState, dt: f32) -> AxisCommand {
        self.handle_ekf_reset(state);

        let pos_error = self.target.position - state.altitude();
        let velocity = self.target.velocity + sqrt_controller(pos_error, self.pos_p, self.accel_max, dt);
        let acceleration = self.target.acceleration + self.vel_p * (velocity - state.climb_rate());

        AxisCommand {
            position: self.target.position,
            velocity,
            acceleration,
        }
    }
}
