//! RTL (Return to Launch) Mode
//!
//! Climbs to a safe altitude, flies home, loiters and then lands or holds
//! at `RTL_ALT_FINAL`.
//!
//! # Sub-modes
//!
//! 1. `InitialClimb`: climb in place to the return altitude
//! 2. `ReturnHome`: fly to home at the return altitude and `RTL_SPEED`
//! 3. `LoiterAtHome`: hold above home for `RTL_LOIT_TIME`
//! 4. `FinalDescent`: descend to `RTL_ALT_FINAL` and hold (only when set)
//! 5. `Land`: descend to touchdown
//!
//! The return altitude is the higher of `RTL_ALT` above home and the
//! current altitude plus `RTL_CLIMB_MIN`, kept one metre under an enabled
//! altitude ceiling.
//!
//! On entry: requires a position estimate and a home position (unless
//! forced). Forced entry without either lands in place. Losing the
//! position estimate mid-return switches to the land sub-mode.

use nalgebra::Vector3;

use crate::control::AltitudeLimits;
use crate::parameters::FlightConfig;
use crate::vehicle::VehicleState;

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::event::VehicleEvent;
use super::land::LandController;
use super::traits::Mode;

/// Margin kept below an enabled altitude ceiling (m)
pub const RTL_ALT_CEILING_MARGIN: f32 = 1.0;

/// Cached return path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtlPath {
    /// Top of the initial climb (m, NEU)
    pub climb_target: Vector3<f32>,
    /// Point above home at the return altitude
    pub return_target: Vector3<f32>,
    /// Point above home at `RTL_ALT_FINAL`
    pub descent_target: Vector3<f32>,
    /// Land after loitering (false holds at the descent target)
    pub land: bool,
}

impl RtlPath {
    /// Build the path from the current position back to `home`
    pub fn build(state: &VehicleState, home: Vector3<f32>, config: &FlightConfig, limits: AltitudeLimits) -> Self {
        let current = state.position;
        let rtl = &config.rtl;

        let mut return_alt = (home.z + rtl.altitude)
            .max(current.z + rtl.climb_min)
            .max(current.z);
        if limits.is_enabled() {
            return_alt = return_alt.min(limits.max - RTL_ALT_CEILING_MARGIN);
        }

        let land = rtl.altitude_final <= 0.0;
        let final_alt = if land {
            home.z
        } else {
            (home.z + rtl.altitude_final).min(return_alt)
        };

        Self {
            climb_target: Vector3::new(current.x, current.y, return_alt),
            return_target: Vector3::new(home.x, home.y, return_alt),
            descent_target: Vector3::new(home.x, home.y, final_alt),
            land,
        }
    }
}

/// RTL sub-mode
#[derive(Debug, Clone, PartialEq)]
pub enum RtlSubMode {
    /// Climbing in place
    InitialClimb,
    /// Flying home
    ReturnHome,
    /// Loitering above home (seconds elapsed)
    LoiterAtHome { elapsed: f32 },
    /// Descending to, then holding at, the final altitude
    FinalDescent,
    /// Landing
    Land(LandController),
}

impl RtlSubMode {
    /// Sub-mode name for logging
    pub fn name(&self) -> &'static str {
        match self {
            RtlSubMode::InitialClimb => "InitialClimb",
            RtlSubMode::ReturnHome => "ReturnHome",
            RtlSubMode::LoiterAtHome { .. } => "LoiterAtHome",
            RtlSubMode::FinalDescent => "FinalDescent",
            RtlSubMode::Land(_) => "Land",
        }
    }
}

/// RTL sub-state machine, shared with AUTO's NAV_RETURN_TO_LAUNCH
#[derive(Debug, Clone, PartialEq)]
pub struct RtlSequence {
    owner: ModeId,
    sub_mode: RtlSubMode,
    path: Option<RtlPath>,
}

impl RtlSequence {
    /// Start the return, or land in place without home or position
    pub fn start(ctx: &mut ModeContext<'_>, owner: ModeId) -> Self {
        let mut sequence = Self {
            owner,
            sub_mode: RtlSubMode::InitialClimb,
            path: None,
        };

        match ctx.state.home {
            Some(home) if ctx.state.position_ok() && ctx.state.is_flying() => {
                let limits = ctx.pos_z.target().alt_limits;
                let path = RtlPath::build(ctx.state, home, ctx.config, limits);
                sequence.path = Some(path);
                ctx.init_controllers();
                sequence.climb_start(ctx, &path);
            }
            _ => sequence.land_start(ctx),
        }
        sequence
    }

    /// Current sub-mode
    pub fn sub_mode(&self) -> &RtlSubMode {
        &self.sub_mode
    }

    /// Cached path
    pub fn path(&self) -> Option<&RtlPath> {
        self.path.as_ref()
    }

    /// Returns true once landed, or once holding at the final altitude
    pub fn is_complete(&self, ctx: &ModeContext<'_>) -> bool {
        match &self.sub_mode {
            RtlSubMode::Land(land) => land.is_complete(),
            RtlSubMode::FinalDescent => ctx.wp_nav.reached_destination(),
            _ => false,
        }
    }

    fn set_sub_mode(&mut self, ctx: &mut ModeContext<'_>, sub_mode: RtlSubMode) {
        log_info!("rtl: {}", sub_mode.name());
        ctx.log_event(VehicleEvent::SubModeChanged {
            mode: self.owner,
            sub_mode: sub_mode.name(),
        });
        self.sub_mode = sub_mode;
    }

    fn climb_start(&mut self, ctx: &mut ModeContext<'_>, path: &RtlPath) {
        ctx.wp_nav.set_destination(path.climb_target);
        self.set_sub_mode(ctx, RtlSubMode::InitialClimb);
    }

    fn return_start(&mut self, ctx: &mut ModeContext<'_>, path: &RtlPath) {
        ctx.wp_nav.set_speed(ctx.config.rtl_speed());
        ctx.wp_nav.set_destination(path.return_target);
        self.set_sub_mode(ctx, RtlSubMode::ReturnHome);
    }

    fn loiterathome_start(&mut self, ctx: &mut ModeContext<'_>) {
        self.set_sub_mode(ctx, RtlSubMode::LoiterAtHome { elapsed: 0.0 });
    }

    fn descent_start(&mut self, ctx: &mut ModeContext<'_>, path: &RtlPath) {
        ctx.wp_nav.set_destination(path.descent_target);
        self.set_sub_mode(ctx, RtlSubMode::FinalDescent);
    }

    fn land_start(&mut self, ctx: &mut ModeContext<'_>) {
        let land = LandController::start(ctx);
        self.set_sub_mode(ctx, RtlSubMode::Land(land));
    }

    /// Run one cycle of the active sub-mode and advance when it is done
    pub fn update(&mut self, ctx: &mut ModeContext<'_>) {
        let path = match self.path {
            Some(path) if ctx.state.position_ok() => path,
            _ => {
                if !matches!(self.sub_mode, RtlSubMode::Land(_)) {
                    log_warn!("rtl: position lost, landing");
                    self.land_start(ctx);
                }
                if let RtlSubMode::Land(land) = &mut self.sub_mode {
                    land.update(ctx);
                }
                return;
            }
        };

        match &mut self.sub_mode {
            RtlSubMode::InitialClimb => {
                ctx.run_nav(0.0, 0.0);
                if ctx.wp_nav.reached_destination() {
                    self.return_start(ctx, &path);
                }
            }
            RtlSubMode::ReturnHome => {
                ctx.run_nav(0.0, 0.0);
                if ctx.wp_nav.reached_destination() {
                    self.loiterathome_start(ctx);
                }
            }
            RtlSubMode::LoiterAtHome { elapsed } => {
                *elapsed += ctx.dt;
                let done = *elapsed >= ctx.config.rtl.loiter_time;
                ctx.run_nav(0.0, 0.0);
                if done {
                    if path.land {
                        self.land_start(ctx);
                    } else {
                        self.descent_start(ctx, &path);
                    }
                }
            }
            RtlSubMode::FinalDescent => ctx.run_nav(0.0, 0.0),
            RtlSubMode::Land(land) => land.update(ctx),
        }
    }
}

/// RTL mode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RtlMode {
    sequence: Option<RtlSequence>,
}

impl RtlMode {
    /// Create RTL mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Active sub-state machine
    pub fn sequence(&self) -> Option<&RtlSequence> {
        self.sequence.as_ref()
    }

    /// Name of the active sub-mode
    pub fn sub_mode_name(&self) -> Option<&'static str> {
        self.sequence.as_ref().map(|sequence| sequence.sub_mode().name())
    }
}

impl Mode for RtlMode {
    fn id(&self) -> ModeId {
        ModeId::Rtl
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError> {
        if !ignore_checks {
            if !ctx.state.position_ok() {
                return Err(ModeError::PositionUnavailable { mode: ModeId::Rtl });
            }
            if ctx.state.home.is_none() {
                return Err(ModeError::HomeNotSet);
            }
        }
        self.sequence = Some(RtlSequence::start(ctx, ModeId::Rtl));
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        match self.sequence.as_mut() {
            Some(sequence) => sequence.update(ctx),
            None => ctx.write_idle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FlightSystems;

    fn returning_systems() -> FlightSystems {
        let mut systems = FlightSystems::new(FlightConfig::default());
        systems.state.armed = true;
        systems.state.landed = false;
        systems.state.position_valid = true;
        systems.state.ekf.origin_valid = true;
        systems.state.position = Vector3::new(30.0, 40.0, 10.0);
        systems.state.home = Some(Vector3::zeros());
        systems
    }

    #[test]
    fn test_path_return_altitude() {
        let config = FlightConfig::default();
        let mut state = VehicleState::default();
        state.position = Vector3::new(30.0, 40.0, 10.0);

        let path = RtlPath::build(&state, Vector3::zeros(), &config, AltitudeLimits::DISABLED);
        assert!((path.climb_target.z - config.rtl.altitude).abs() < 1e-5);
        assert_eq!(path.climb_target.xy(), state.position.xy());
        assert_eq!(path.return_target.xy(), Vector3::<f32>::zeros().xy());
        assert!(path.land);

        // Already above RTL_ALT: return at the current altitude
        state.position.z = 40.0;
        let path = RtlPath::build(&state, Vector3::zeros(), &config, AltitudeLimits::DISABLED);
        assert!((path.return_target.z - 40.0).abs() < 1e-5);
    }

    #[test]
    fn test_path_respects_ceiling_and_final_altitude() {
        let mut config = FlightConfig::default();
        config.rtl.altitude_final = 5.0;
        let mut state = VehicleState::default();
        state.position = Vector3::new(0.0, 0.0, 2.0);

        let path = RtlPath::build(&state, Vector3::zeros(), &config, AltitudeLimits::new(-10.0, 12.0));
        assert!((path.return_target.z - 11.0).abs() < 1e-5);
        assert!(!path.land);
        assert!((path.descent_target.z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_rtl_entry_checks() {
        let mut systems = returning_systems();
        systems.state.home = None;
        let mut mode = RtlMode::new();
        let mut ctx = systems.context(0.0);
        assert_eq!(mode.enter(&mut ctx, false), Err(ModeError::HomeNotSet));
        assert!(mode.sequence().is_none());

        // Forced entry without home lands in place
        assert!(mode.enter(&mut ctx, true).is_ok());
        assert_eq!(mode.sub_mode_name(), Some("Land"));
    }

    #[test]
    fn test_rtl_starts_with_initial_climb() {
        let mut systems = returning_systems();
        let mut mode = RtlMode::new();
        let mut ctx = systems.context(0.0);
        mode.enter(&mut ctx, false).unwrap();
        assert_eq!(mode.sub_mode_name(), Some("InitialClimb"));
        assert_eq!(
            ctx.wp_nav.destination(),
            Some(mode.sequence().unwrap().path().unwrap().climb_target)
        );
    }

    #[test]
    fn test_rtl_lands_on_position_loss() {
        let mut systems = returning_systems();
        let mut mode = RtlMode::new();
        {
            let mut ctx = systems.context(0.01);
            mode.enter(&mut ctx, false).unwrap();
            mode.update(&mut ctx);
        }
        systems.state.position_valid = false;
        {
            let mut ctx = systems.context(0.01);
            mode.update(&mut ctx);
        }
        assert_eq!(mode.sub_mode_name(), Some("Land"));
        assert!(systems.targets.horizontal.is_none());
    }
}
