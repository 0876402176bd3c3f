//! Circle Mode
//!
//! Orbits a center point at `CIRCLE_RADIUS` and `CIRCLE_RATE`, nose
//! following the path. The center is placed one radius ahead of the
//! vehicle so the orbit starts from the current position.
//!
//! The angular rate ramps up at the navigator's acceleration limit and is
//! capped so the centripetal acceleration stays within it.

use core::f32::consts::PI;

use libm::{atan2f, cosf, sinf, sqrtf};
use nalgebra::Vector2;

use crate::vehicle::VehicleState;

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::traits::Mode;

/// Angular acceleration used when the radius is zero (rad/s/s)
const CIRCLE_ANGULAR_ACCEL_ZERO_RADIUS: f32 = PI / 2.0;

/// Circular path generator
#[derive(Debug, Clone, PartialEq)]
pub struct CirclePath {
    center: Vector2<f32>,
    radius: f32,
    /// Requested rate (rad/s, positive clockwise seen from above)
    rate: f32,
    angular_vel: f32,
    angular_accel: f32,
    angle: f32,
    angle_total: f32,
}

impl CirclePath {
    /// Path centered `radius` ahead of the vehicle
    pub fn ahead_of(state: &VehicleState, radius: f32, rate: f32, accel: f32) -> Self {
        let yaw = state.attitude.yaw;
        let radius = radius.max(0.0);
        let center = state.position_xy() + Vector2::new(cosf(yaw), sinf(yaw)) * radius;
        Self::new(center, radius, rate, accel, yaw + PI)
    }

    /// Path around `center`, starting at the vehicle's bearing from it
    pub fn around(state: &VehicleState, center: Vector2<f32>, radius: f32, rate: f32, accel: f32) -> Self {
        let offset = state.position_xy() - center;
        let angle = if offset.norm() > 0.0 {
            atan2f(offset.y, offset.x)
        } else {
            state.attitude.yaw + PI
        };
        Self::new(center, radius.max(0.0), rate, accel, angle)
    }

    fn new(center: Vector2<f32>, radius: f32, rate: f32, accel: f32, angle: f32) -> Self {
        let (rate, angular_accel) = if radius > 0.0 {
            let max_rate = sqrtf(accel.abs() / radius);
            (rate.clamp(-max_rate, max_rate), accel.abs() / radius)
        } else {
            (rate, CIRCLE_ANGULAR_ACCEL_ZERO_RADIUS)
        };
        Self {
            center,
            radius,
            rate,
            angular_vel: 0.0,
            angular_accel,
            angle,
            angle_total: 0.0,
        }
    }

    /// Circle center (m, NE)
    pub fn center(&self) -> Vector2<f32> {
        self.center
    }

    /// Circle radius (m)
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Requested angular rate after limiting (rad/s)
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Current angular velocity (rad/s)
    pub fn angular_velocity(&self) -> f32 {
        self.angular_vel
    }

    /// Completed turns
    pub fn turns(&self) -> f32 {
        self.angle_total.abs() / (2.0 * PI)
    }

    /// Point on the circle at the current angle
    pub fn position(&self) -> Vector2<f32> {
        self.center + Vector2::new(cosf(self.angle), sinf(self.angle)) * self.radius
    }

    /// Advance the path one cycle and return the target position and
    /// velocity
    pub fn update(&mut self, dt: f32) -> (Vector2<f32>, Vector2<f32>) {
        let step = self.angular_accel * dt;
        self.angular_vel += (self.rate - self.angular_vel).clamp(-step, step);

        let delta = self.angular_vel * dt;
        self.angle += delta;
        self.angle_total += delta;
        if self.angle > PI {
            self.angle -= 2.0 * PI;
        } else if self.angle < -PI {
            self.angle += 2.0 * PI;
        }

        let velocity = Vector2::new(-sinf(self.angle), cosf(self.angle)) * (self.radius * self.angular_vel);
        (self.position(), velocity)
    }
}

/// Circle mode
#[derive(Debug, Clone, PartialEq)]
pub struct CircleMode {
    path: Option<CirclePath>,
}

impl Default for CircleMode {
    fn default() -> Self {
        Self::new()
    }
}

impl CircleMode {
    /// Create circle mode
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Active path
    pub fn path(&self) -> Option<&CirclePath> {
        self.path.as_ref()
    }
}

impl Mode for CircleMode {
    fn id(&self) -> ModeId {
        ModeId::Circle
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError> {
        if !ignore_checks && !ctx.state.position_ok() {
            return Err(ModeError::PositionUnavailable { mode: ModeId::Circle });
        }
        ctx.init_controllers();
        let wpnav = &ctx.config.wpnav;
        self.path = Some(CirclePath::ahead_of(
            ctx.state,
            wpnav.circle_radius,
            wpnav.circle_rate,
            ctx.wp_nav.accel(),
        ));
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        let Some(path) = self.path.as_mut() else {
            ctx.run_degraded_alt_hold(true);
            return;
        };
        if !ctx.state.position_ok() {
            ctx.run_degraded_alt_hold(true);
            return;
        }

        let climb_rate = ctx.pilot_climb_rate();
        if !ctx.state.is_flying() {
            ctx.wp_nav.init(ctx.state);
            ctx.run_nav(climb_rate, 0.0);
            return;
        }

        let (position, velocity) = path.update(ctx.dt);
        ctx.wp_nav.set_position_target(position, velocity);
        ctx.run_nav(climb_rate, path.angular_velocity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FlightSystems;
    use crate::parameters::FlightConfig;
    use nalgebra::Vector3;

    #[test]
    fn test_center_ahead_of_vehicle() {
        let mut state = VehicleState::default();
        state.position = Vector3::new(1.0, 2.0, 10.0);
        state.attitude.yaw = PI / 2.0;

        let path = CirclePath::ahead_of(&state, 10.0, 0.2, 2.5);
        assert!((path.center() - Vector2::new(1.0, 12.0)).norm() < 1e-4);
        assert!((path.position() - state.position_xy()).norm() < 1e-4);
    }

    #[test]
    fn test_rate_limited_by_centripetal_accel() {
        let state = VehicleState::default();
        let path = CirclePath::ahead_of(&state, 10.0, 5.0, 2.5);
        assert!((path.rate() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_path_stays_on_circle_and_counts_turns() {
        let state = VehicleState::default();
        let mut path = CirclePath::ahead_of(&state, 5.0, 0.4, 2.5);
        for _ in 0..2000 {
            let (position, _) = path.update(0.01);
            assert!(((position - path.center()).norm() - 5.0).abs() < 1e-3);
        }
        assert!((path.angular_velocity() - 0.4).abs() < 1e-5);
        // 20 s at up to 0.4 rad/s
        assert!(path.turns() > 1.0 && path.turns() < 1.3);
    }

    #[test]
    fn test_circle_mode_requires_position() {
        let mut systems = FlightSystems::new(FlightConfig::default());
        let mut mode = CircleMode::new();
        let mut ctx = systems.context(0.0);
        assert_eq!(
            mode.enter(&mut ctx, false),
            Err(ModeError::PositionUnavailable { mode: ModeId::Circle })
        );
        assert!(mode.path().is_none());
    }

    #[test]
    fn test_circle_mode_tracks_path() {
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.state.armed = true;
        systems.state.landed = false;
        systems.state.position_valid = true;
        systems.state.ekf.origin_valid = true;
        systems.state.position = Vector3::new(0.0, 0.0, 10.0);

        let mut mode = CircleMode::new();
        let mut ctx = systems.context(0.01);
        mode.enter(&mut ctx, false).unwrap();
        for _ in 0..100 {
            mode.update(&mut ctx);
        }

        let path = mode.path().unwrap();
        assert!((systems.wp_nav.pos_target() - path.position()).norm() < 1e-4);
        assert!(systems.targets.attitude.yaw_rate > 0.0);
    }
}
