//! Altitude Hold Mode
//!
//! Self-leveling flight with the throttle stick commanding a climb rate.
//! Centered throttle holds altitude through the axis position controller.

use crate::vehicle::{AttitudeTarget, FlightTargets};

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::traits::Mode;

/// Altitude hold mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AltHoldMode;

impl AltHoldMode {
    /// Create altitude hold mode
    pub fn new() -> Self {
        Self
    }
}

impl Mode for AltHoldMode {
    fn id(&self) -> ModeId {
        ModeId::AltHold
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, _ignore_checks: bool) -> Result<(), ModeError> {
        ctx.pos_z.init_z_controller(ctx.state);
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        let (roll, pitch) = ctx.pilot_lean_angles();
        let yaw_rate = ctx.pilot_yaw_rate();
        let climb_rate = ctx.pilot_climb_rate();
        let throttle = ctx.run_climb_rate(climb_rate, false);

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FlightSystems;
    use crate::parameters::FlightConfig;
    use crate::vehicle::ThrottleDemand;
    use nalgebra::Vector3;

    #[test]
    fn test_althold_holds_altitude_with_centered_stick() {
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.state.armed = true;
        systems.state.landed = false;
        systems.state.position = Vector3::new(0.0, 0.0, 20.0);

        let mut mode = AltHoldMode::new();
        let mut ctx = systems.context(0.01);
        mode.enter(&mut ctx, false).unwrap();
        for _ in 0..50 {
            mode.update(&mut ctx);
        }

        match systems.targets.throttle {
            ThrottleDemand::Climb(command) => {
                assert!((command.position - 20.0).abs() < 1e-3);
                assert!(command.velocity.abs() < 1e-3);
            }
            other => panic!("unexpected throttle {:?}", other),
        }
    }

    #[test]
    fn test_althold_climbs_with_raised_stick() {
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.state.armed = true;
        systems.state.landed = false;
        systems.state.position = Vector3::new(0.0, 0.0, 20.0);
        systems.state.pilot.throttle = 1.0;

        let mut mode = AltHoldMode::new();
        let mut ctx = systems.context(0.01);
        mode.enter(&mut ctx, false).unwrap();
        for _ in 0..100 {
            mode.update(&mut ctx);
        }

        assert!(systems.pos_z.target().position > 20.0);
        assert!(systems.pos_z.target().velocity > 0.0);
    }

    #[test]
    fn test_althold_idles_on_ground() {
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.state.armed = true;

        let mut mode = AltHoldMode::new();
        let mut ctx = systems.context(0.01);
        mode.enter(&mut ctx, false).unwrap();
        mode.update(&mut ctx);
        assert_eq!(systems.targets.throttle, ThrottleDemand::Idle);
    }
}
