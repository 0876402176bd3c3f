//! Guided Mode
//!
//! Flies position and velocity targets sent by a ground station or
//! companion computer.
//!
//! # Sub-modes
//!
//! - `TakeOff`: climb to a target height above the take-off point
//! - `Position`: fly to (and hold) a destination
//! - `Velocity`: follow a velocity; the vehicle stops if no new velocity
//!   arrives within [`GUIDED_VELOCITY_TIMEOUT`]
//!
//! On entry the vehicle holds its stopping point. Losing the position
//! estimate requests LAND.

use nalgebra::{Vector2, Vector3};

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::event::VehicleEvent;
use super::reason::ModeReason;
use super::traits::Mode;

/// Time after which a velocity command is considered stale (s)
pub const GUIDED_VELOCITY_TIMEOUT: f32 = 3.0;

/// Guided sub-mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuidedSubMode {
    /// Climbing to `altitude` (m, absolute)
    TakeOff { altitude: f32 },
    /// Flying to or holding a destination
    Position,
    /// Following a velocity (m/s, NEU)
    Velocity { velocity: Vector3<f32>, age: f32 },
}

impl GuidedSubMode {
    /// Sub-mode name for logging
    pub fn name(&self) -> &'static str {
        match self {
            GuidedSubMode::TakeOff { .. } => "TakeOff",
            GuidedSubMode::Position => "Position",
            GuidedSubMode::Velocity { .. } => "Velocity",
        }
    }
}

/// External guidance target handling shared by GUIDED and AUTO's
/// NAV_GUIDED_ENABLE
#[derive(Debug, Clone, PartialEq)]
pub struct GuidedController {
    sub_mode: GuidedSubMode,
    owner: ModeId,
}

impl GuidedController {
    /// Controller reporting its sub-mode changes as `owner`
    pub const fn new(owner: ModeId) -> Self {
        Self {
            sub_mode: GuidedSubMode::Position,
            owner,
        }
    }

    /// Hold the stopping point
    pub fn start(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.init_controllers();
        let stop = ctx.wp_nav.stopping_point(ctx.state);
        ctx.wp_nav
            .set_destination(Vector3::new(stop.x, stop.y, ctx.pos_z.target().position));
        self.sub_mode = GuidedSubMode::Position;
    }

    /// Current sub-mode
    pub fn sub_mode(&self) -> GuidedSubMode {
        self.sub_mode
    }

    fn set_sub_mode(&mut self, ctx: &mut ModeContext<'_>, sub_mode: GuidedSubMode) {
        if core::mem::discriminant(&self.sub_mode) != core::mem::discriminant(&sub_mode) {
            log_info!("guided: {}", sub_mode.name());
            ctx.log_event(VehicleEvent::SubModeChanged {
                mode: self.owner,
                sub_mode: sub_mode.name(),
            });
        }
        self.sub_mode = sub_mode;
    }

    fn check_flying(&self, ctx: &ModeContext<'_>) -> Result<(), ModeError> {
        if !ctx.state.position_ok() {
            return Err(ModeError::PositionUnavailable { mode: self.owner });
        }
        if !ctx.state.armed {
            return Err(ModeError::NotArmed);
        }
        if ctx.state.landed {
            return Err(ModeError::Landed);
        }
        Ok(())
    }

    /// Fly to `destination` (m, NEU)
    pub fn set_destination(&mut self, ctx: &mut ModeContext<'_>, destination: Vector3<f32>) -> Result<(), ModeError> {
        self.check_flying(ctx)?;
        ctx.wp_nav.set_destination(destination);
        self.set_sub_mode(ctx, GuidedSubMode::Position);
        Ok(())
    }

    /// Follow `velocity` (m/s, NEU)
    pub fn set_velocity(&mut self, ctx: &mut ModeContext<'_>, velocity: Vector3<f32>) -> Result<(), ModeError> {
        self.check_flying(ctx)?;
        ctx.wp_nav.set_desired_velocity(velocity.xy());
        self.set_sub_mode(ctx, GuidedSubMode::Velocity { velocity, age: 0.0 });
        Ok(())
    }

    /// Take off to `height` metres above the current position
    pub fn takeoff_start(&mut self, ctx: &mut ModeContext<'_>, height: f32) -> Result<(), ModeError> {
        if !ctx.state.position_ok() {
            return Err(ModeError::PositionUnavailable { mode: self.owner });
        }
        if !ctx.state.armed {
            return Err(ModeError::NotArmed);
        }
        if !ctx.state.landed {
            return Err(ModeError::AlreadyFlying);
        }

        let altitude = ctx.state.altitude() + height.max(0.0);
        ctx.init_controllers();
        let here = ctx.state.position_xy();
        ctx.wp_nav.set_destination(Vector3::new(here.x, here.y, altitude));
        log_info!("guided: takeoff to {}", altitude);
        self.set_sub_mode(ctx, GuidedSubMode::TakeOff { altitude });
        Ok(())
    }

    /// Run one cycle
    pub fn update(&mut self, ctx: &mut ModeContext<'_>) {
        match self.sub_mode {
            GuidedSubMode::TakeOff { .. } => {
                ctx.run_nav(0.0, 0.0);
                if ctx.wp_nav.reached_destination() {
                    self.set_sub_mode(ctx, GuidedSubMode::Position);
                }
            }
            GuidedSubMode::Position => {
                if ctx.state.landed {
                    ctx.wp_nav.init(ctx.state);
                    ctx.write_idle();
                    return;
                }
                ctx.run_nav(0.0, 0.0);
            }
            GuidedSubMode::Velocity { mut velocity, age } => {
                let age = age + ctx.dt;
                if age > GUIDED_VELOCITY_TIMEOUT && velocity != Vector3::zeros() {
                    log_warn!("guided: velocity command timed out");
                    velocity = Vector3::zeros();
                }
                self.sub_mode = GuidedSubMode::Velocity { velocity, age };
                ctx.wp_nav.set_desired_velocity(Vector2::new(velocity.x, velocity.y));
                ctx.run_nav(velocity.z, 0.0);
            }
        }
    }
}

/// Guided mode
#[derive(Debug, Clone, PartialEq)]
pub struct GuidedMode {
    controller: GuidedController,
    land_requested: bool,
}

impl Default for GuidedMode {
    fn default() -> Self {
        Self::new()
    }
}

impl GuidedMode {
    /// Create guided mode
    pub fn new() -> Self {
        Self {
            controller: GuidedController::new(ModeId::Guided),
            land_requested: false,
        }
    }

    /// Current sub-mode
    pub fn sub_mode(&self) -> GuidedSubMode {
        self.controller.sub_mode()
    }

    /// Fly to `destination` (m, NEU)
    pub fn set_destination(&mut self, ctx: &mut ModeContext<'_>, destination: Vector3<f32>) -> Result<(), ModeError> {
        self.controller.set_destination(ctx, destination)
    }

    /// Follow `velocity` (m/s, NEU)
    pub fn set_velocity(&mut self, ctx: &mut ModeContext<'_>, velocity: Vector3<f32>) -> Result<(), ModeError> {
        self.controller.set_velocity(ctx, velocity)
    }

    /// Take off to `height` metres above the current position
    pub fn takeoff_start(&mut self, ctx: &mut ModeContext<'_>, height: f32) -> Result<(), ModeError> {
        self.controller.takeoff_start(ctx, height)
    }
}

impl Mode for GuidedMode {
    fn id(&self) -> ModeId {
        ModeId::Guided
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError> {
        if !ignore_checks && !ctx.state.position_ok() {
            return Err(ModeError::PositionUnavailable { mode: ModeId::Guided });
        }
        self.controller.start(ctx);
        self.land_requested = false;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        if !ctx.state.position_ok() {
            if !self.land_requested {
                log_warn!("guided: position lost, landing");
                ctx.request_mode(ModeId::Land, ModeReason::EkfFailsafe);
                self.land_requested = true;
            }
            ctx.run_degraded_alt_hold(false);
            return;
        }
        if !ctx.state.armed {
            ctx.wp_nav.init(ctx.state);
            ctx.write_idle();
            return;
        }
        self.controller.update(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FlightSystems;
    use crate::parameters::FlightConfig;
    use crate::vehicle::ThrottleDemand;

    fn ready_systems(landed: bool) -> FlightSystems {
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.state.armed = true;
        systems.state.landed = landed;
        systems.state.position_valid = true;
        systems.state.ekf.origin_valid = true;
        systems.state.position = Vector3::new(0.0, 0.0, if landed { 0.0 } else { 10.0 });
        systems
    }

    #[test]
    fn test_guided_takeoff_errors() {
        let mut systems = ready_systems(false);
        let mut mode = GuidedMode::new();
        let mut ctx = systems.context(0.0);
        mode.enter(&mut ctx, false).unwrap();
        assert_eq!(mode.takeoff_start(&mut ctx, 5.0), Err(ModeError::AlreadyFlying));

        let mut systems = ready_systems(true);
        systems.state.armed = false;
        let mut mode = GuidedMode::new();
        let mut ctx = systems.context(0.0);
        mode.enter(&mut ctx, false).unwrap();
        assert_eq!(mode.takeoff_start(&mut ctx, 5.0), Err(ModeError::NotArmed));
    }

    #[test]
    fn test_guided_destination_rejected_on_ground() {
        let mut systems = ready_systems(true);
        let mut mode = GuidedMode::new();
        let mut ctx = systems.context(0.0);
        mode.enter(&mut ctx, false).unwrap();
        assert_eq!(
            mode.set_destination(&mut ctx, Vector3::new(10.0, 0.0, 10.0)),
            Err(ModeError::Landed)
        );
    }

    #[test]
    fn test_guided_takeoff_climbs_then_holds() {
        let mut systems = ready_systems(true);
        let mut mode = GuidedMode::new();
        {
            let mut ctx = systems.context(0.0);
            mode.enter(&mut ctx, false).unwrap();
            mode.takeoff_start(&mut ctx, 5.0).unwrap();
        }
        assert_eq!(mode.sub_mode(), GuidedSubMode::TakeOff { altitude: 5.0 });

        // Perfect tracking of the vertical target
        for _ in 0..3000 {
            {
                let mut ctx = systems.context(0.01);
                mode.update(&mut ctx);
            }
            let target = *systems.pos_z.target();
            systems.state.position.z = target.position;
            systems.state.velocity.z = target.velocity;
            systems.state.landed = false;
            if mode.sub_mode() == GuidedSubMode::Position {
                break;
            }
        }

        assert_eq!(mode.sub_mode(), GuidedSubMode::Position);
        assert!((systems.state.position.z - 5.0).abs() <= 1.0);
        assert!(matches!(systems.targets.throttle, ThrottleDemand::Climb(_)));
    }

    #[test]
    fn test_guided_velocity_times_out() {
        let mut systems = ready_systems(false);
        let mut mode = GuidedMode::new();
        let mut ctx = systems.context(0.1);
        mode.enter(&mut ctx, false).unwrap();
        mode.set_velocity(&mut ctx, Vector3::new(2.0, 0.0, 0.0)).unwrap();

        for _ in 0..31 {
            mode.update(&mut ctx);
        }
        match mode.sub_mode() {
            GuidedSubMode::Velocity { velocity, .. } => assert_eq!(velocity, Vector3::zeros()),
            other => panic!("unexpected sub-mode {:?}", other),
        }
    }

    #[test]
    fn test_guided_requests_land_on_position_loss() {
        let mut systems = ready_systems(false);
        let mut mode = GuidedMode::new();
        {
            let mut ctx = systems.context(0.01);
            mode.enter(&mut ctx, false).unwrap();
        }
        systems.state.position_valid = false;
        {
            let mut ctx = systems.context(0.01);
            mode.update(&mut ctx);
        }
        assert_eq!(
            systems.request.map(|request| (request.mode, request.reason)),
            Some((ModeId::Land, ModeReason::EkfFailsafe))
        );
    }
}
