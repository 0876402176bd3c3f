//! Land Mode
//!
//! Controlled descent to touchdown. Shared by LAND, the final stage of RTL
//! and AUTO's NAV_LAND.
//!
//! # Behavior
//!
//! - Descends at `LAND_SPEED_HIGH` (or `WPNAV_SPEED_DN`) above
//!   `LAND_ALT_LOW`, then at `LAND_SPEED`
//! - With a position estimate the horizontal target holds the stopping
//!   point; without one the pilot controls lean angles
//! - Losing the position estimate mid-descent switches to pilot lean
//!   without interrupting the descent
//! - Touchdown is reported once, after which the motors idle
//!
//! Entry never fails.

use crate::vehicle::{AttitudeTarget, FlightTargets, VehicleState};

use super::context::ModeContext;
use super::descriptor::ModeId;
use super::error::ModeError;
use super::event::VehicleEvent;
use super::traits::Mode;

/// Climb rate magnitude below which the vehicle may be on the ground (m/s)
pub const LAND_DETECTOR_CLIMB_RATE_MAX: f32 = 0.3;

/// Time the ground condition must hold before touchdown is declared (s)
pub const LAND_DETECTOR_TRIGGER_SEC: f32 = 1.0;

/// Descent rate for the current height above home (m/s, negative)
pub fn land_descent_rate(ctx: &ModeContext<'_>) -> f32 {
    let land = &ctx.config.land;
    if ctx.state.altitude_above_home() > land.alt_low {
        -ctx.config.land_speed_high()
    } else {
        -land.speed
    }
}

/// Touchdown detector
///
/// Declares the vehicle landed when the host reports it, or when the
/// motors sit at their lower limit with no vertical motion for
/// [`LAND_DETECTOR_TRIGGER_SEC`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandDetector {
    ground_time: f32,
}

impl LandDetector {
    /// Create a detector with no accumulated ground time
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one cycle; returns true once touchdown is detected
    pub fn update(&mut self, state: &VehicleState, dt: f32) -> bool {
        if state.landed {
            return true;
        }
        if state.motors.throttle_lower && state.climb_rate().abs() < LAND_DETECTOR_CLIMB_RATE_MAX {
            self.ground_time += dt;
        } else {
            self.ground_time = 0.0;
        }
        self.ground_time >= LAND_DETECTOR_TRIGGER_SEC
    }
}

/// Descent-to-touchdown controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandController {
    detector: LandDetector,
    complete: bool,
    using_position: bool,
}

impl LandController {
    /// Start a descent from the current state
    pub fn start(ctx: &mut ModeContext<'_>) -> Self {
        ctx.pos_z.init_z_controller(ctx.state);
        ctx.wp_nav.init(ctx.state);
        Self {
            detector: LandDetector::new(),
            complete: false,
            using_position: ctx.state.position_ok(),
        }
    }

    /// Returns true once touchdown has been detected
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns true while the horizontal position is held by the navigator
    pub fn is_using_position(&self) -> bool {
        self.using_position
    }

    /// Run one cycle of the descent
    pub fn update(&mut self, ctx: &mut ModeContext<'_>) {
        if self.complete || !ctx.state.armed {
            ctx.write_idle();
            return;
        }

        if self.detector.update(ctx.state, ctx.dt) {
            self.complete = true;
            log_info!("land: touchdown");
            ctx.log_event(VehicleEvent::LandComplete);
            ctx.write_idle();
            return;
        }

        if self.using_position && !ctx.state.position_ok() {
            self.using_position = false;
            log_warn!("land: position lost, pilot controls lean");
        }

        let climb_rate = land_descent_rate(ctx);
        let yaw_rate = ctx.pilot_yaw_rate();

        if self.using_position {
            ctx.wp_nav.hold();
            ctx.run_nav_descend(climb_rate, yaw_rate);
        } else {
            let (roll, pitch) = ctx.pilot_lean_angles();
            let throttle = ctx.run_climb_rate(climb_rate, true);
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
}

/// Land mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandMode {
    controller: LandController,
}

impl LandMode {
    /// Create land mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once touchdown has been detected
    pub fn is_complete(&self) -> bool {
        self.controller.is_complete()
    }

    /// Returns true while the GPS variant is flying
    pub fn is_using_position(&self) -> bool {
        self.controller.is_using_position()
    }
}

impl Mode for LandMode {
    fn id(&self) -> ModeId {
        ModeId::Land
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, _ignore_checks: bool) -> Result<(), ModeError> {
        self.controller = LandController::start(ctx);
        if !self.controller.is_using_position() {
            log_info!("land: no position, pilot controls lean");
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        self.controller.update(ctx);
    }
}
