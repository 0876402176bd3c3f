//! Horizontal waypoint navigator
//!
//! Keeps the horizontal target state and shapes it per axis with the
//! kinematic shaper. Modes drive it with one of four requests: hold
//! position, fly to a destination, follow a velocity, or track a position
//! computed by the mode itself (circle). Destinations carry an altitude
//! which is handed to the vertical controller.

use libm::{atanf, cosf, sinf};
use nalgebra::{Vector2, Vector3};

use crate::parameters::WpnavParams;
use crate::vehicle::{HorizontalCommand, VehicleState};

use super::pos_z::AxisPositionController;
use super::shaping::{
    is_valid_time_constant, shape_pos_vel_accel_xy, shape_vel_accel, sqrt_controller,
    update_pos_vel_accel, AxisLimit, ShapingLimits,
};

/// Standard gravity (m/s/s)
pub const GRAVITY_MSS: f32 = 9.80665;

/// Altitude error accepted when checking whether a destination is reached (m)
pub const WP_ALT_TOLERANCE: f32 = 1.0;

/// What the navigator is currently asked to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavRequest {
    /// Bring the target to a smooth stop
    Hold,
    /// Fly a straight line to a destination (m, NEU)
    Destination(Vector3<f32>),
    /// Follow a horizontal velocity (m/s, NE)
    Velocity(Vector2<f32>),
    /// Track a position set by the caller every cycle
    Position,
}

/// Horizontal navigator
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointNav {
    request: NavRequest,
    pos_target: Vector2<f32>,
    vel_target: Vector2<f32>,
    accel_target: Vector2<f32>,
    speed: f32,
    speed_up: f32,
    speed_down: f32,
    accel: f32,
    radius: f32,
    tc: f32,
    pos_p: f32,
    vel_p: f32,
    last_ekf_reset_epoch: u32,
    reached: bool,
}

impl WaypointNav {
    /// Create a navigator from the navigation parameters
    pub fn new(params: &WpnavParams) -> Self {
        Self {
            request: NavRequest::Hold,
            pos_target: Vector2::zeros(),
            vel_target: Vector2::zeros(),
            accel_target: Vector2::zeros(),
            speed: params.speed,
            speed_up: params.speed_up,
            speed_down: params.speed_down,
            accel: params.accel,
            radius: params.radius,
            tc: params.tc_xy,
            pos_p: params.pos_xy_p,
            vel_p: params.vel_xy_p,
            last_ekf_reset_epoch: 0,
            reached: false,
        }
    }

    /// Align the target with the current estimate and hold
    pub fn init(&mut self, state: &VehicleState) {
        self.pos_target = state.position_xy();
        self.vel_target = state.velocity_xy();
        self.accel_target = Vector2::zeros();
        self.last_ekf_reset_epoch = state.ekf.reset_epoch;
        self.request = NavRequest::Hold;
        self.reached = false;
    }

    /// Current request
    pub fn request(&self) -> NavRequest {
        self.request
    }

    /// Current horizontal target position (m, NE)
    pub fn pos_target(&self) -> Vector2<f32> {
        self.pos_target
    }

    /// Current horizontal target velocity (m/s, NE)
    pub fn vel_target(&self) -> Vector2<f32> {
        self.vel_target
    }

    /// Horizontal speed used for destinations (m/s)
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Horizontal acceleration limit (m/s/s)
    pub fn accel(&self) -> f32 {
        self.accel
    }

    /// Change the destination speed (m/s)
    pub fn set_speed(&mut self, speed: f32) {
        if speed > 0.0 && speed.is_finite() {
            self.speed = speed;
        }
    }

    /// Bring the target to a smooth stop
    pub fn hold(&mut self) {
        self.request = NavRequest::Hold;
    }

    /// Fly to `destination` (m, NEU)
    pub fn set_destination(&mut self, destination: Vector3<f32>) {
        self.request = NavRequest::Destination(destination);
        self.reached = false;
    }

    /// Follow a horizontal velocity (m/s, NE)
    pub fn set_desired_velocity(&mut self, velocity: Vector2<f32>) {
        self.request = NavRequest::Velocity(velocity);
    }

    /// Track a position computed by the caller, with velocity feed-forward
    pub fn set_position_target(&mut self, position: Vector2<f32>, velocity: Vector2<f32>) {
        self.request = NavRequest::Position;
        self.pos_target = position;
        self.vel_target = velocity;
        self.accel_target = Vector2::zeros();
    }

    /// Destination of the current request, if any
    pub fn destination(&self) -> Option<Vector3<f32>> {
        match self.request {
            NavRequest::Destination(dest) => Some(dest),
            _ => None,
        }
    }

    /// Returns true once the vehicle is within the acceptance radius of the
    /// destination
    pub fn reached_destination(&self) -> bool {
        self.reached
    }

    /// Horizontal point the vehicle would stop at from its current velocity
    pub fn stopping_point(&self, state: &VehicleState) -> Vector2<f32> {
        let vel = state.velocity_xy();
        let speed = vel.norm();
        if speed <= 0.0 || self.accel <= 0.0 {
            return state.position_xy();
        }
        let stopping_distance = speed * speed / (2.0 * self.accel);
        state.position_xy() + vel * (stopping_distance / speed)
    }

    fn handle_ekf_reset(&mut self, state: &VehicleState) {
        if state.ekf.reset_epoch != self.last_ekf_reset_epoch {
            self.pos_target += state.ekf.reset_offset.xy();
            if let NavRequest::Destination(dest) = &mut self.request {
                *dest += state.ekf.reset_offset;
            }
            self.last_ekf_reset_epoch = state.ekf.reset_epoch;
        }
    }

    /// Advance the horizontal target one cycle and run the xy controller
    ///
    /// Destination altitude is tracked through `pos_z`.
    pub fn update(
        &mut self,
        pos_z: &mut AxisPositionController,
        state: &VehicleState,
        dt: f32,
    ) -> HorizontalCommand {
        self.handle_ekf_reset(state);

        match self.request {
            NavRequest::Hold => self.advance_vel(Vector2::zeros(), dt),
            NavRequest::Velocity(vel) => self.advance_vel(vel, dt),
            NavRequest::Position => {}
            NavRequest::Destination(dest) => {
                pos_z.input_pos_z(dest.z, self.speed_down, self.speed_up, state, dt);
                self.advance_to(dest.xy(), dt);

                let vehicle_dist = (dest.xy() - state.position_xy()).norm();
                let alt_reached = (dest.z - state.altitude()).abs() <= WP_ALT_TOLERANCE;
                if vehicle_dist <= self.radius && alt_reached {
                    self.reached = true;
                }
            }
        }

        self.run_xy_controller(state)
    }

    fn integrate(&mut self, dt: f32) {
        for axis in 0..2 {
            update_pos_vel_accel(
                &mut self.pos_target[axis],
                &mut self.vel_target[axis],
                self.accel_target[axis],
                dt,
                AxisLimit::NONE,
                0.0,
                0.0,
            );
        }
    }

    fn advance_vel(&mut self, desired_vel: Vector2<f32>, dt: f32) {
        self.integrate(dt);
        if !is_valid_time_constant(self.tc) {
            self.vel_target = desired_vel;
            self.accel_target = Vector2::zeros();
            return;
        }

        let limits = ShapingLimits::symmetric(f32::INFINITY, self.accel);
        for axis in 0..2 {
            self.accel_target[axis] = shape_vel_accel(
                desired_vel[axis],
                0.0,
                self.vel_target[axis],
                self.accel_target[axis],
                &limits,
                self.tc,
                dt,
            );
        }
    }

    fn advance_to(&mut self, destination: Vector2<f32>, dt: f32) {
        self.integrate(dt);
        if !is_valid_time_constant(self.tc) {
            let error = destination - self.pos_target;
            let distance = error.norm();
            self.vel_target = if distance > 0.0 {
                let speed = sqrt_controller(distance, self.pos_p, self.accel, dt).min(self.speed);
                error * (speed / distance)
            } else {
                Vector2::zeros()
            };
            self.accel_target = Vector2::zeros();
            return;
        }

        self.accel_target = shape_pos_vel_accel_xy(
            destination,
            Vector2::zeros(),
            self.pos_target,
            self.vel_target,
            self.accel_target,
            self.speed,
            self.accel,
            self.tc,
            dt,
        );
    }

    /// Position and velocity loops against the current estimate
    pub fn run_xy_controller(&self, state: &VehicleState) -> HorizontalCommand {
        let pos_error = self.pos_target - state.position_xy();
        let velocity = self.vel_target + pos_error * self.pos_p;
        let acceleration = self.accel_target + (velocity - state.velocity_xy()) * self.vel_p;

        HorizontalCommand {
            position: self.pos_target,
            velocity,
            acceleration,
        }
    }
}

/// Convert a north-east acceleration into roll and pitch angles (rad)
///
/// Positive pitch is nose up, so accelerating forward pitches down.
pub fn accel_to_lean_angles(accel_ne: Vector2<f32>, yaw: f32) -> (f32, f32) {
    let (sin_yaw, cos_yaw) = (sinf(yaw), cosf(yaw));
    let accel_forward = accel_ne.x * cos_yaw + accel_ne.y * sin_yaw;
    let accel_right = -accel_ne.x * sin_yaw + accel_ne.y * cos_yaw;

    let pitch = -atanf(accel_forward / GRAVITY_MSS);
    let roll = atanf(accel_right * cosf(pitch) / GRAVITY_MSS);
    (roll, pitch)
}
