//! Capability-scoped context handed to modes
//!
//! Built by the arbiter for every `enter`/`update`/`exit` call. A mode sees
//! the shared vehicle state read-only, drives the shared controllers, writes
//! its targets and may ask the arbiter for a fallback transition. It never
//! sees the arbiter itself.

use crate::control::{accel_to_lean_angles, AxisPositionController, WaypointNav};
use crate::mission::MissionStorage;
use crate::parameters::FlightConfig;
use crate::vehicle::{AttitudeTarget, FlightTargets, HorizontalCommand, ThrottleDemand, VehicleState};

use super::descriptor::ModeId;
use super::event::{EventQueue, VehicleEvent};
use super::pilot;
use super::reason::ModeReason;

/// Transition requested by a mode from inside `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRequest {
    /// Requested mode
    pub mode: ModeId,
    /// Provenance
    pub reason: ModeReason,
}

/// Per-call mode context
pub struct ModeContext<'a> {
    /// Vehicle state for this cycle
    pub state: &'a VehicleState,
    /// Flight configuration
    pub config: &'a FlightConfig,
    /// Vertical position controller
    pub pos_z: &'a mut AxisPositionController,
    /// Horizontal navigator
    pub wp_nav: &'a mut WaypointNav,
    /// Mission storage
    pub mission: &'a MissionStorage,
    /// Output targets
    pub targets: &'a mut FlightTargets,
    /// Cycle period (s); zero outside `update`
    pub dt: f32,
    events: &'a mut EventQueue,
    request: &'a mut Option<ModeRequest>,
}

impl<'a> ModeContext<'a> {
    /// Assemble a context from the arbiter's systems
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        state: &'a VehicleState,
        config: &'a FlightConfig,
        pos_z: &'a mut AxisPositionController,
        wp_nav: &'a mut WaypointNav,
        mission: &'a MissionStorage,
        targets: &'a mut FlightTargets,
        events: &'a mut EventQueue,
        request: &'a mut Option<ModeRequest>,
        dt: f32,
    ) -> Self {
        Self {
            state,
            config,
            pos_z,
            wp_nav,
            mission,
            targets,
            dt,
            events,
            request,
        }
    }

    /// Ask the arbiter to switch mode after this update
    ///
    /// The request goes through the normal validated transition path in
    /// the same cycle. A later request in the same update replaces an
    /// earlier one.
    pub fn request_mode(&mut self, mode: ModeId, reason: ModeReason) {
        *self.request = Some(ModeRequest { mode, reason });
    }

    /// Record an event for the host
    pub fn log_event(&mut self, event: VehicleEvent) {
        self.events.push(event);
    }

    /// Pilot lean angles limited to `ANGLE_MAX` (rad)
    pub fn pilot_lean_angles(&self) -> (f32, f32) {
        let pilot = &self.state.pilot;
        pilot::lean_angles(pilot.roll, pilot.pitch, self.config.pos_control.angle_max)
    }

    /// Pilot yaw rate (rad/s)
    pub fn pilot_yaw_rate(&self) -> f32 {
        pilot::yaw_rate(self.state.pilot.yaw, self.config.pos_control.pilot_yaw_rate)
    }

    /// Pilot climb rate (m/s)
    pub fn pilot_climb_rate(&self) -> f32 {
        let params = &self.config.pos_control;
        pilot::climb_rate(
            self.state.pilot.throttle,
            params.pilot_speed_up,
            params.pilot_speed_dn,
            params.throttle_deadzone,
        )
    }

    /// Pilot throttle through the hover expo curve
    pub fn pilot_manual_throttle(&self) -> f32 {
        pilot::manual_throttle(self.state.pilot.throttle, self.config.pos_control.throttle_hover)
    }

    /// Align both position controllers with the current estimate
    pub fn init_controllers(&mut self) {
        self.pos_z.init_z_controller(self.state);
        self.wp_nav.init(self.state);
    }

    /// Drive the vertical controller at `climb_rate` and return the throttle
    /// demand
    ///
    /// On the ground with no climb demand the motors idle and the target is
    /// kept on the estimate so take-off starts without a step.
    pub fn run_climb_rate(&mut self, climb_rate: f32, force_descend: bool) -> ThrottleDemand {
        if !self.state.armed {
            self.pos_z.init_z_controller(self.state);
            return ThrottleDemand::Idle;
        }
        if self.state.landed && climb_rate <= 0.0 {
            self.pos_z.init_z_controller(self.state);
            return ThrottleDemand::Idle;
        }
        self.pos_z
            .set_pos_target_z_from_climb_rate(climb_rate, force_descend, self.state, self.dt);
        ThrottleDemand::Climb(self.pos_z.update_z_controller(self.state, self.dt))
    }

    /// Close the vertical loop on the current target without moving it
    pub fn run_z_controller(&mut self) -> ThrottleDemand {
        if !self.state.armed {
            self.pos_z.init_z_controller(self.state);
            return ThrottleDemand::Idle;
        }
        ThrottleDemand::Climb(self.pos_z.update_z_controller(self.state, self.dt))
    }

    /// Attitude that realizes a horizontal command, limited to `ANGLE_MAX`
    pub fn attitude_from_nav(&self, command: &HorizontalCommand, yaw_rate: f32) -> AttitudeTarget {
        let (roll, pitch) = accel_to_lean_angles(command.acceleration, self.state.attitude.yaw);
        let (roll, pitch) = pilot::limit_lean_angles(roll, pitch, self.config.pos_control.angle_max);
        AttitudeTarget {
            roll,
            pitch,
            yaw_rate,
        }
    }

    /// Motors at idle with the vertical target kept on the estimate
    pub fn write_idle(&mut self) {
        self.pos_z.init_z_controller(self.state);
        *self.targets = FlightTargets::idle();
    }

    /// Advance the navigator one cycle and write the resulting targets
    ///
    /// When the navigator flies to a destination it owns the vertical
    /// target; otherwise the vertical axis follows `climb_rate`. On the
    /// ground the horizontal target is held on the vehicle.
    pub fn run_nav(&mut self, climb_rate: f32, yaw_rate: f32) {
        self.run_nav_inner(climb_rate, false, yaw_rate);
    }

    /// As [`run_nav`](Self::run_nav), but keeps descending while the motors
    /// report minimum thrust (landing, payload placement)
    pub fn run_nav_descend(&mut self, climb_rate: f32, yaw_rate: f32) {
        self.run_nav_inner(climb_rate, true, yaw_rate);
    }

    fn run_nav_inner(&mut self, climb_rate: f32, force_descend: bool, yaw_rate: f32) {
        let command = self.wp_nav.update(self.pos_z, self.state, self.dt);
        let throttle = if self.wp_nav.destination().is_some() {
            self.run_z_controller()
        } else {
            self.run_climb_rate(climb_rate, force_descend)
        };

        if throttle == ThrottleDemand::Idle {
            if self.wp_nav.destination().is_none() {
                self.wp_nav.init(self.state);
            }
            *self.targets = FlightTargets {
                attitude: AttitudeTarget {
                    roll: 0.0,
                    pitch: 0.0,
                    yaw_rate,
                },
                throttle,
                horizontal: None,
            };
            return;
        }

        *self.targets = FlightTargets {
            attitude: self.attitude_from_nav(&command, yaw_rate),
            throttle,
            horizontal: Some(command),
        };
    }

    /// Conservative behavior without a position estimate: pilot (or level)
    /// attitude with altitude hold
    pub fn run_degraded_alt_hold(&mut self, use_pilot_lean: bool) {
        let (roll, pitch) = if use_pilot_lean {
            self.pilot_lean_angles()
        } else {
            (0.0, 0.0)
        };
        let yaw_rate = self.pilot_yaw_rate();
        let climb = self.pilot_climb_rate();
        let throttle = self.run_climb_rate(climb, false);
        *self.targets = FlightTargets {
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
