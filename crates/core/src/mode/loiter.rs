//! Loiter Mode
//!
//! Position hold with pilot repositioning.
//!
//! # Behavior
//!
//! - On entry: requires a position estimate (unless forced)
//! - Roll/pitch sticks request a horizontal velocity up to `LOIT_SPEED`;
//!   centered sticks brake to a stop and hold
//! - Throttle stick commands a climb rate
//! - On position loss: altitude hold with pilot lean angles until the
//!   estimate returns

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::pilot;
use super::traits::Mode;

/// Loiter mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoiterMode {
    degraded: bool,
}

impl LoiterMode {
    /// Create loiter mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while flying without a position estimate
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

impl Mode for LoiterMode {
    fn id(&self) -> ModeId {
        ModeId::Loiter
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError> {
        if !ignore_checks && !ctx.state.position_ok() {
            return Err(ModeError::PositionUnavailable { mode: ModeId::Loiter });
        }
        ctx.init_controllers();
        self.degraded = !ctx.state.position_ok();
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        if !ctx.state.position_ok() {
            if !self.degraded {
                log_warn!("loiter: position lost");
                self.degraded = true;
            }
            ctx.run_degraded_alt_hold(true);
            return;
        }
        if self.degraded {
            log_info!("loiter: position recovered");
            ctx.wp_nav.init(ctx.state);
            self.degraded = false;
        }

        let input = ctx.state.pilot;
        let velocity = pilot::velocity_xy(
            input.roll,
            input.pitch,
            ctx.state.attitude.yaw,
            ctx.config.wpnav.loiter_speed,
        );
        ctx.wp_nav.set_desired_velocity(velocity);

        let climb_rate = ctx.pilot_climb_rate();
        let yaw_rate = ctx.pilot_yaw_rate();
        ctx.run_nav(climb_rate, yaw_rate);
    }
}
