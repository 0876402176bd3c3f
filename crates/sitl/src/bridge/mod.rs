//! SITL bridge.
//!
//! Plays the role of the fixed-rate flight scheduler against a simulator
//! adapter: each lockstep step refreshes the vehicle state from the sensor
//! data, runs the mode arbiter once, mixes the resulting targets into
//! actuator commands and advances the simulation.

use copter_core::mode::{ModeArbiter, ModeId, ModeReason};
use copter_core::parameters::FlightConfig;
use copter_core::vehicle::{FlightTargets, PilotInput, ThrottleDemand};

use crate::adapter::lightweight::GRAVITY_MSS;
use crate::adapter::SimulatorAdapter;
use crate::error::SimulatorError;
use crate::types::{ActuatorCommands, SensorData, VehicleId};

/// Smallest tilt factor used when compensating thrust for lean.
const MIN_TILT_FACTOR: f32 = 0.5;

/// SITL bridge orchestrator.
///
/// Owns one simulator adapter and the flight core driving it. This is the
/// main entry point for SITL operations.
pub struct SitlBridge<A> {
    adapter: A,
    arbiter: ModeArbiter,
    vehicle_id: VehicleId,
    sim_time_us: u64,
}

impl<A: SimulatorAdapter> SitlBridge<A> {
    pub fn new(adapter: A, vehicle_id: VehicleId, config: FlightConfig, initial: ModeId) -> Self {
        Self {
            adapter,
            arbiter: ModeArbiter::new(config, initial),
            vehicle_id,
            sim_time_us: 0,
        }
    }

    /// Connect the adapter and load the first sensor sample.
    pub async fn start(&mut self) -> Result<(), SimulatorError> {
        self.adapter.connect().await?;
        self.refresh_state().await?;
        Ok(())
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn arbiter(&self) -> &ModeArbiter {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut ModeArbiter {
        &mut self.arbiter
    }

    /// Get the current simulation time in microseconds.
    pub fn sim_time_us(&self) -> u64 {
        self.sim_time_us
    }

    /// Arm the motors, recording home at the current position if unset.
    pub fn arm(&mut self, from_gcs: bool) -> Result<(), SimulatorError> {
        if !self.arbiter.allows_arming(from_gcs) {
            return Err(SimulatorError::ArmingRefused {
                mode: self.arbiter.current_mode(),
            });
        }
        let state = self.arbiter.state_mut();
        if state.home.is_none() && state.position_ok() {
            state.home = Some(state.position);
        }
        state.armed = true;
        Ok(())
    }

    pub fn disarm(&mut self) {
        self.arbiter.state_mut().armed = false;
    }

    /// Set the pilot stick input used from the next step on.
    pub fn set_pilot(&mut self, pilot: PilotInput) {
        self.arbiter.state_mut().pilot = pilot;
    }

    /// Request a mode change as a ground station would.
    pub fn set_mode(&mut self, mode: ModeId) -> Result<(), SimulatorError> {
        self.arbiter.request_mode_change(mode, ModeReason::GcsCommand, false)?;
        Ok(())
    }

    /// Run one lockstep cycle.
    pub async fn step(&mut self) -> Result<FlightTargets, SimulatorError> {
        let dt = self.adapter.step_size_us() as f32 / 1_000_000.0;
        let targets = *self.arbiter.run(dt);

        let commands = self.mix(&targets);
        self.adapter.send_actuators(&commands).await?;
        self.adapter.step().await?;
        self.sim_time_us = self.adapter.sim_time_us();

        self.refresh_state().await?;
        Ok(targets)
    }

    /// Run for `seconds` of simulation time.
    pub async fn run_for(&mut self, seconds: f32) -> Result<(), SimulatorError> {
        let steps = (seconds * 1_000_000.0 / self.adapter.step_size_us() as f32).ceil() as u64;
        for _ in 0..steps {
            self.step().await?;
        }
        Ok(())
    }

    /// Step until `done` returns true or `timeout_s` elapses.
    ///
    /// Returns whether the condition was met.
    pub async fn run_until<F>(&mut self, timeout_s: f32, mut done: F) -> Result<bool, SimulatorError>
    where
        F: FnMut(&Self) -> bool,
    {
        let steps = (timeout_s * 1_000_000.0 / self.adapter.step_size_us() as f32).ceil() as u64;
        for _ in 0..steps {
            if done(self) {
                return Ok(true);
            }
            self.step().await?;
        }
        Ok(done(self))
    }

    async fn refresh_state(&mut self) -> Result<(), SimulatorError> {
        let sensors = self
            .adapter
            .receive_sensors()
            .await?
            .ok_or(SimulatorError::NoSensorData)?;
        self.apply_sensors(&sensors);
        Ok(())
    }

    fn apply_sensors(&mut self, sensors: &SensorData) {
        let state = self.arbiter.state_mut();
        match sensors.position {
            Some(position) => {
                state.position = position;
                state.position_valid = true;
                // The origin stays set once the first fix arrived
                state.ekf.origin_valid = true;
            }
            None => {
                state.position.z = sensors.altitude_m;
                state.position_valid = false;
            }
        }
        state.velocity = sensors.velocity;
        state.attitude = sensors.attitude;
        state.ekf.reset_epoch = sensors.reset.epoch;
        state.ekf.reset_offset = sensors.reset.offset;
        state.motors = sensors.motor_limits;
        state.landed = sensors.on_ground;
    }

    /// Convert flight targets into actuator commands.
    fn mix(&self, targets: &FlightTargets) -> ActuatorCommands {
        let attitude = targets.attitude;
        let thrust = if !self.arbiter.state().armed {
            0.0
        } else {
            match targets.throttle {
                ThrottleDemand::Idle => 0.0,
                ThrottleDemand::Manual(throttle) => throttle,
                ThrottleDemand::Climb(command) => {
                    let hover = self.arbiter.config().pos_control.throttle_hover;
                    let tilt = (attitude.roll.cos() * attitude.pitch.cos()).max(MIN_TILT_FACTOR);
                    hover * (1.0 + command.acceleration / GRAVITY_MSS) / tilt
                }
            }
        };

        ActuatorCommands {
            timestamp_us: self.sim_time_us,
            vehicle_id: self.vehicle_id,
            roll: attitude.roll,
            pitch: attitude.pitch,
            yaw_rate: attitude.yaw_rate,
            thrust,
        }
    }
}
