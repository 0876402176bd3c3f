//! Mode Arbiter
//!
//! Owns the single active flight mode together with the shared systems the
//! modes drive, validates transition requests and runs the active mode once
//! per control cycle.
//!
//! ## Responsibilities
//!
//! - Run the active mode's `update` exactly once per cycle
//! - Handle transitions: gate, enter new mode, exit old mode, swap
//! - Resolve fallback requests raised by a mode in the same cycle
//! - Record every transition outcome in the event queue
//!
//! ## Safety
//!
//! - A transition commits only if the new mode's `enter` succeeds
//! - A rejected transition leaves the active mode and all shared state as
//!   they were
//! - There is no "no mode" state; the initial mode is entered forced

use nalgebra::Vector3;

use crate::control::{AxisPositionController, WaypointNav};
use crate::mission::MissionStorage;
use crate::parameters::FlightConfig;
use crate::vehicle::{FlightTargets, VehicleState};

use super::context::{ModeContext, ModeRequest};
use super::descriptor::{ModeDescriptor, ModeId};
use super::error::ModeError;
use super::event::{EventQueue, VehicleEvent};
use super::reason::ModeReason;
use super::traits::Mode;
use super::FlightMode;

/// Shared systems the modes operate on
#[derive(Debug, Clone)]
pub(crate) struct FlightSystems {
    pub(crate) state: VehicleState,
    pub(crate) config: FlightConfig,
    pub(crate) pos_z: AxisPositionController,
    pub(crate) wp_nav: WaypointNav,
    pub(crate) mission: MissionStorage,
    pub(crate) targets: FlightTargets,
    pub(crate) events: EventQueue,
    pub(crate) request: Option<ModeRequest>,
}

impl FlightSystems {
    pub(crate) fn new(config: FlightConfig) -> Self {
        Self {
            state: VehicleState::default(),
            pos_z: AxisPositionController::new(&config.pos_control),
            wp_nav: WaypointNav::new(&config.wpnav),
            config,
            mission: MissionStorage::new(),
            targets: FlightTargets::idle(),
            events: EventQueue::new(),
            request: None,
        }
    }

    /// Split the systems into a mode context
    pub(crate) fn context(&mut self, dt: f32) -> ModeContext<'_> {
        ModeContext::new(
            &self.state,
            &self.config,
            &mut self.pos_z,
            &mut self.wp_nav,
            &self.mission,
            &mut self.targets,
            &mut self.events,
            &mut self.request,
            dt,
        )
    }
}

/// Mode arbiter
#[derive(Debug, Clone)]
pub struct ModeArbiter {
    mode: FlightMode,
    systems: FlightSystems,
}

impl ModeArbiter {
    /// Create the arbiter and enter `initial` (forced)
    ///
    /// STABILIZE is used if the initial mode cannot be entered.
    pub fn new(config: FlightConfig, initial: ModeId) -> Self {
        let mut systems = FlightSystems::new(config);
        let mut mode = FlightMode::new(initial);

        let result = {
            let mut ctx = systems.context(0.0);
            mode.enter(&mut ctx, true)
        };
        if let Err(error) = result {
            log_error!("arbiter: failed to enter {}: {}", initial.name(), error.as_str());
            mode = FlightMode::new(ModeId::Stabilize);
            let mut ctx = systems.context(0.0);
            // Stabilize entry has no failure path
            let _ = mode.enter(&mut ctx, true);
        }
        log_info!("arbiter: initial mode {}", mode.name());

        Self { mode, systems }
    }

    /// Vehicle state
    pub fn state(&self) -> &VehicleState {
        &self.systems.state
    }

    /// Vehicle state, refreshed by the host before every [`run`](Self::run)
    pub fn state_mut(&mut self) -> &mut VehicleState {
        &mut self.systems.state
    }

    /// Flight configuration
    pub fn config(&self) -> &FlightConfig {
        &self.systems.config
    }

    /// Active mode identity
    pub fn current_mode(&self) -> ModeId {
        self.mode.id()
    }

    /// Capability flags of the active mode
    pub fn descriptor(&self) -> &'static ModeDescriptor {
        self.mode.descriptor()
    }

    /// Active mode instance
    pub fn mode(&self) -> &FlightMode {
        &self.mode
    }

    /// Active mode instance, for mode-specific settings
    pub fn mode_mut(&mut self) -> &mut FlightMode {
        &mut self.mode
    }

    /// Vertical position controller
    pub fn pos_z(&self) -> &AxisPositionController {
        &self.systems.pos_z
    }

    /// Horizontal navigator
    pub fn wp_nav(&self) -> &WaypointNav {
        &self.systems.wp_nav
    }

    /// Stored mission
    pub fn mission(&self) -> &MissionStorage {
        &self.systems.mission
    }

    /// Stored mission, for upload
    pub fn mission_mut(&mut self) -> &mut MissionStorage {
        &mut self.systems.mission
    }

    /// Targets written by the last cycle
    pub fn targets(&self) -> &FlightTargets {
        &self.systems.targets
    }

    /// Returns true if the active mode allows arming
    pub fn allows_arming(&self, from_gcs: bool) -> bool {
        self.descriptor().allows_arming(from_gcs)
    }

    /// Remove and return the oldest recorded event
    pub fn pop_event(&mut self) -> Option<VehicleEvent> {
        self.systems.events.pop()
    }

    /// Remove and return all recorded events
    pub fn drain_events(&mut self) -> impl Iterator<Item = VehicleEvent> + '_ {
        core::iter::from_fn(move || self.systems.events.pop())
    }

    /// Number of events dropped because the queue was full
    pub fn dropped_events(&self) -> u32 {
        self.systems.events.dropped()
    }

    fn reject(&mut self, target: ModeId, reason: ModeReason, error: ModeError) {
        log_warn!(
            "arbiter: {} -> {} rejected ({}): {}",
            self.mode.name(),
            target.name(),
            reason.as_str(),
            error.as_str()
        );
        self.systems.events.push(VehicleEvent::ModeChangeRejected {
            target,
            reason,
            error,
        });
    }

    /// Request a transition to `target`
    ///
    /// Requesting the active mode succeeds without re-entering it. With
    /// `ignore_checks` the sensor gate is skipped and the new mode must
    /// enter in a degraded form rather than fail.
    pub fn request_mode_change(
        &mut self,
        target: ModeId,
        reason: ModeReason,
        ignore_checks: bool,
    ) -> Result<(), ModeError> {
        let current = self.mode.id();
        if target == current {
            return Ok(());
        }

        let state = &self.systems.state;
        if !ignore_checks && state.armed && target.descriptor().requires_gps && !state.position_ok() {
            let error = ModeError::PositionUnavailable { mode: target };
            self.reject(target, reason, error);
            return Err(error);
        }

        let saved_pos_z = self.systems.pos_z.clone();
        let saved_wp_nav = self.systems.wp_nav.clone();
        let saved_targets = self.systems.targets;

        let mut next = FlightMode::new(target);
        let result = {
            let mut ctx = self.systems.context(0.0);
            next.enter(&mut ctx, ignore_checks)
        };

        match result {
            Ok(()) => {
                {
                    let mut ctx = self.systems.context(0.0);
                    self.mode.exit(&mut ctx);
                }
                self.mode = next;
                log_info!("arbiter: {} -> {} ({})", current.name(), target.name(), reason.as_str());
                self.systems.events.push(VehicleEvent::ModeChanged {
                    from: current,
                    to: target,
                    reason,
                });
                Ok(())
            }
            Err(error) => {
                self.systems.pos_z = saved_pos_z;
                self.systems.wp_nav = saved_wp_nav;
                self.systems.targets = saved_targets;
                self.reject(target, reason, error);
                Err(error)
            }
        }
    }

    /// Run one control cycle
    ///
    /// The host refreshes [`state_mut`](Self::state_mut) first. A fallback
    /// requested by the mode is resolved before returning; failsafe
    /// requests skip the sensor gate.
    pub fn run(&mut self, dt: f32) -> &FlightTargets {
        {
            let mut ctx = self.systems.context(dt);
            self.mode.update(&mut ctx);
        }

        if let Some(request) = self.systems.request.take() {
            let _ = self.request_mode_change(request.mode, request.reason, request.reason.is_failsafe());
        }

        &self.systems.targets
    }

    /// Guided destination (m, NEU); GUIDED, or AUTO during NAV_GUIDED_ENABLE
    pub fn guided_set_destination(&mut self, destination: Vector3<f32>) -> Result<(), ModeError> {
        let mut ctx = self.systems.context(0.0);
        match &mut self.mode {
            FlightMode::Guided(mode) => mode.set_destination(&mut ctx, destination),
            FlightMode::Auto(mode) => mode.guided_set_destination(&mut ctx, destination),
            other => Err(ModeError::WrongMode {
                expected: ModeId::Guided,
                actual: other.id(),
            }),
        }
    }

    /// Guided velocity (m/s, NEU); GUIDED, or AUTO during NAV_GUIDED_ENABLE
    pub fn guided_set_velocity(&mut self, velocity: Vector3<f32>) -> Result<(), ModeError> {
        let mut ctx = self.systems.context(0.0);
        match &mut self.mode {
            FlightMode::Guided(mode) => mode.set_velocity(&mut ctx, velocity),
            FlightMode::Auto(mode) => mode.guided_set_velocity(&mut ctx, velocity),
            other => Err(ModeError::WrongMode {
                expected: ModeId::Guided,
                actual: other.id(),
            }),
        }
    }

    /// Guided take-off to `height` metres above the current position
    pub fn guided_takeoff(&mut self, height: f32) -> Result<(), ModeError> {
        let mut ctx = self.systems.context(0.0);
        match &mut self.mode {
            FlightMode::Guided(mode) => mode.takeoff_start(&mut ctx, height),
            other => Err(ModeError::WrongMode {
                expected: ModeId::Guided,
                actual: other.id(),
            }),
        }
    }
}
