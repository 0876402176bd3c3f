//! Brake Mode
//!
//! Stops the vehicle as quickly as the navigator's acceleration limit
//! allows and holds position. Ignores pilot input. An optional timeout
//! hands over to LOITER through the arbiter.

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::reason::ModeReason;
use super::traits::Mode;

/// Brake mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrakeMode {
    timeout: Option<f32>,
    elapsed: f32,
    loiter_requested: bool,
}

impl BrakeMode {
    /// Create brake mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Request LOITER after `seconds` in BRAKE
    pub fn set_timeout_to_loiter(&mut self, seconds: f32) {
        self.timeout = Some(seconds.max(0.0));
        self.elapsed = 0.0;
        self.loiter_requested = false;
    }

    /// Time spent in the mode (s)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Mode for BrakeMode {
    fn id(&self) -> ModeId {
        ModeId::Brake
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError> {
        if !ignore_checks && !ctx.state.position_ok() {
            return Err(ModeError::PositionUnavailable { mode: ModeId::Brake });
        }
        ctx.init_controllers();
        self.timeout = None;
        self.elapsed = 0.0;
        self.loiter_requested = false;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        self.elapsed += ctx.dt;

        if ctx.state.position_ok() {
            ctx.wp_nav.hold();
            ctx.run_nav(0.0, 0.0);
        } else {
            ctx.run_degraded_alt_hold(false);
        }

        if let Some(timeout) = self.timeout {
            if !self.loiter_requested && self.elapsed >= timeout {
                self.loiter_requested = true;
                ctx.request_mode(ModeId::Loiter, ModeReason::BrakeTimeout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FlightSystems;
    use crate::parameters::FlightConfig;
    use nalgebra::Vector3;

    fn moving_systems() -> FlightSystems {
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.state.armed = true;
        systems.state.landed = false;
        systems.state.position_valid = true;
        systems.state.ekf.origin_valid = true;
        systems.state.position = Vector3::new(0.0, 0.0, 10.0);
        systems.state.velocity = Vector3::new(5.0, 0.0, 0.0);
        systems
    }

    #[test]
    fn test_brake_decelerates_target() {
        let mut systems = moving_systems();
        let mut mode = BrakeMode::new();
        let mut ctx = systems.context(0.01);
        mode.enter(&mut ctx, false).unwrap();
        for _ in 0..50 {
            mode.update(&mut ctx);
        }

        let vel = systems.wp_nav.vel_target().x;
        assert!(vel < 5.0 && vel >= 0.0);
        assert!(systems.targets.horizontal.is_some());
    }

    #[test]
    fn test_brake_timeout_requests_loiter_once() {
        let mut systems = moving_systems();
        let mut mode = BrakeMode::new();
        {
            let mut ctx = systems.context(0.1);
            mode.enter(&mut ctx, false).unwrap();
            mode.set_timeout_to_loiter(0.25);
            for _ in 0..2 {
                mode.update(&mut ctx);
            }
        }
        assert!(systems.request.is_none());

        {
            let mut ctx = systems.context(0.1);
            mode.update(&mut ctx);
        }
        assert_eq!(systems.request.map(|request| request.mode), Some(ModeId::Loiter));

        systems.request = None;
        {
            let mut ctx = systems.context(0.1);
            mode.update(&mut ctx);
        }
        assert!(systems.request.is_none());
    }
}
