//! Stabilize Mode
//!
//! Self-leveling manual flight.
//!
//! # Behavior
//!
//! - Roll/pitch sticks command lean angles limited to `ANGLE_MAX`
//! - Yaw stick commands a yaw rate
//! - Throttle stick drives the motors directly through the hover expo
//!
//! The vertical target is kept on the estimate so a switch to an
//! altitude-controlled mode starts without a step.

use crate::vehicle::{AttitudeTarget, FlightTargets, ThrottleDemand};

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::traits::Mode;

/// Stabilize mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StabilizeMode;

impl StabilizeMode {
    /// Create stabilize mode
    pub fn new() -> Self {
        Self
    }
}

impl Mode for StabilizeMode {
    fn id(&self) -> ModeId {
        ModeId::Stabilize
    }

    fn enter(&mut self, _ctx: &mut ModeContext<'_>, _ignore_checks: bool) -> Result<(), ModeError> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        let (roll, pitch) = ctx.pilot_lean_angles();
        let yaw_rate = ctx.pilot_yaw_rate();

        let throttle = if !ctx.state.armed || (ctx.state.landed && ctx.state.pilot.throttle <= 0.0) {
            ThrottleDemand::Idle
        } else {
            ThrottleDemand::Manual(ctx.pilot_manual_throttle())
        };

        ctx.pos_z.init_z_controller(ctx.state);
        *ctx.targets = FlightTargets {
            attitude: AttitudeTarget {
                roll,
                pitch,
                yaw_rate,
            },
            throttle,
            horizontal: None,
        };
    }
}
