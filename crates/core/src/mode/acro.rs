//! Acro Mode
//!
//! Rate-controlled manual flight: sticks command body rates which are
//! integrated into roll/pitch targets, with no self-leveling and no angle
//! limit. Throttle is manual.

use core::f32::consts::PI;

use crate::vehicle::{AttitudeTarget, FlightTargets, ThrottleDemand};

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::traits::Mode;

/// Wrap an angle to [-PI, PI]
fn wrap_pi(angle: f32) -> f32 {
    let mut wrapped = angle;
    while wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    while wrapped < -PI {
        wrapped += 2.0 * PI;
    }
    wrapped
}

/// Acro mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcroMode {
    roll_target: f32,
    pitch_target: f32,
}

impl AcroMode {
    /// Create acro mode
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mode for AcroMode {
    fn id(&self) -> ModeId {
        ModeId::Acro
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, _ignore_checks: bool) -> Result<(), ModeError> {
        self.roll_target = ctx.state.attitude.roll;
        self.pitch_target = ctx.state.attitude.pitch;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        let pilot = ctx.state.pilot;
        let rate = ctx.config.pos_control.acro_rp_rate;

        let throttle = if !ctx.state.armed || (ctx.state.landed && pilot.throttle <= 0.0) {
            // Hold the current attitude on the ground so the targets do not wind up
            self.roll_target = ctx.state.attitude.roll;
            self.pitch_target = ctx.state.attitude.pitch;
            ThrottleDemand::Idle
        } else {
            self.roll_target = wrap_pi(self.roll_target + pilot.roll.clamp(-1.0, 1.0) * rate * ctx.dt);
            self.pitch_target = wrap_pi(self.pitch_target + pilot.pitch.clamp(-1.0, 1.0) * rate * ctx.dt);
            ThrottleDemand::Manual(ctx.pilot_manual_throttle())
        };

        let yaw_rate = ctx.pilot_yaw_rate();
        ctx.pos_z.init_z_controller(ctx.state);
        *ctx.targets = FlightTargets {
            attitude: AttitudeTarget {
                roll: self.roll_target,
                pitch: self.pitch_target,
                yaw_rate,
            },
            throttle,
            horizontal: None,
        };
    }
}
