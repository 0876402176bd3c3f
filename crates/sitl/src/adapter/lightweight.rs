//! Lightweight multicopter simulator adapter.
//!
//! Built-in point-mass physics with no external dependencies, suitable for
//! CI testing and rapid iteration. Attitude follows the commanded lean
//! angles exactly; collective thrust saturates at the motor limits and the
//! ground stops descent. Sensor noise is seeded for deterministic runs, and
//! GPS loss and estimate resets can be injected.

use async_trait::async_trait;
use copter_core::vehicle::{Attitude, MotorLimits};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::adapter::SimulatorAdapter;
use crate::error::SimulatorError;
use crate::types::{ActuatorCommands, EstimateReset, SensorData, VehicleId};

/// Standard gravity in m/s².
pub const GRAVITY_MSS: f32 = 9.80665;

/// Configuration for the lightweight simulator.
#[derive(Debug, Clone)]
pub struct LightweightConfig {
    /// Thrust (0..1) that balances gravity when level.
    pub hover_thrust: f32,
    /// Thrust while armed at zero demand (motor spin minimum).
    pub thrust_min: f32,
    /// Linear drag coefficient in 1/s.
    pub drag: f32,
    /// Position noise standard deviation in meters.
    pub position_noise_m: f32,
    /// Velocity noise standard deviation in m/s.
    pub velocity_noise_ms: f32,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
    /// Simulation step size in microseconds.
    pub step_size_us: u64,
    /// Initial position in meters (NEU).
    pub start_position: Vector3<f32>,
}

impl Default for LightweightConfig {
    fn default() -> Self {
        Self {
            hover_thrust: 0.35,
            thrust_min: 0.05,
            drag: 0.1,
            position_noise_m: 0.05,
            velocity_noise_ms: 0.02,
            seed: None,
            step_size_us: 10_000, // 100 Hz
            start_position: Vector3::zeros(),
        }
    }
}

/// Internal vehicle state for integration.
#[derive(Debug, Clone)]
struct VehicleState {
    /// True position in meters (NEU).
    position: Vector3<f32>,
    /// True velocity in m/s (NEU).
    velocity: Vector3<f32>,
    /// Attitude in radians.
    attitude: Attitude,
    /// Commanded yaw rate in rad/s.
    yaw_rate: f32,
    /// Applied thrust (0..1).
    thrust: f32,
    /// Saturation flags from the last command.
    limits: MotorLimits,
    /// Resting on the ground.
    on_ground: bool,
}

impl VehicleState {
    fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            attitude: Attitude::default(),
            yaw_rate: 0.0,
            thrust: 0.0,
            limits: MotorLimits::default(),
            on_ground: position.z <= 0.0,
        }
    }
}

/// Lightweight simulator adapter with built-in point-mass multicopter physics.
///
/// Provides a self-contained simulation without external dependencies,
/// suitable for CI and unit testing.
pub struct LightweightAdapter {
    config: LightweightConfig,
    name: String,
    vehicle_id: VehicleId,
    state: VehicleState,
    rng: StdRng,
    sim_time_us: u64,
    connected: bool,
    gps_available: bool,
    estimate_offset: Vector3<f32>,
    reset: EstimateReset,
}

impl LightweightAdapter {
    /// Create a new lightweight adapter with the given configuration.
    pub fn new(name: &str, vehicle_id: VehicleId, config: LightweightConfig) -> Result<Self, SimulatorError> {
        if !(config.hover_thrust > 0.0 && config.hover_thrust < 1.0) {
            return Err(SimulatorError::InvalidConfig(format!(
                "hover_thrust {} outside (0, 1)",
                config.hover_thrust
            )));
        }
        if config.step_size_us == 0 {
            return Err(SimulatorError::InvalidConfig("step_size_us is zero".to_string()));
        }
        Ok(Self::build(name, vehicle_id, config))
    }

    /// Create with default configuration.
    pub fn with_defaults(vehicle_id: VehicleId) -> Self {
        Self::build("lightweight", vehicle_id, LightweightConfig::default())
    }

    fn build(name: &str, vehicle_id: VehicleId, config: LightweightConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: VehicleState::new(config.start_position),
            config,
            name: name.to_string(),
            vehicle_id,
            rng,
            sim_time_us: 0,
            connected: false,
            gps_available: true,
            estimate_offset: Vector3::zeros(),
            reset: EstimateReset::default(),
        }
    }

    /// Simulator configuration.
    pub fn config(&self) -> &LightweightConfig {
        &self.config
    }

    /// Enable or disable the position source.
    pub fn set_gps_available(&mut self, available: bool) {
        self.gps_available = available;
    }

    /// Re-anchor the position estimate by `offset` meters (NEU).
    ///
    /// The true vehicle position is unchanged; every later position report
    /// is shifted and the reset epoch is incremented.
    pub fn inject_estimate_reset(&mut self, offset: Vector3<f32>) {
        self.estimate_offset += offset;
        self.reset = EstimateReset {
            epoch: self.reset.epoch.wrapping_add(1),
            offset,
        };
    }

    /// Integrate point-mass dynamics for one time step.
    fn integrate(&mut self, dt: f32) {
        let attitude = self.state.attitude;
        let tilt = attitude.roll.cos() * attitude.pitch.cos();
        let lift = self.state.thrust / self.config.hover_thrust * GRAVITY_MSS;

        // Horizontal acceleration from lean, body forward/right to north/east
        let accel_forward = -GRAVITY_MSS * attitude.pitch.tan();
        let accel_right = GRAVITY_MSS * attitude.roll.tan() / attitude.pitch.cos();
        let (sin_yaw, cos_yaw) = attitude.yaw.sin_cos();
        let mut accel = Vector3::new(
            accel_forward * cos_yaw - accel_right * sin_yaw,
            accel_forward * sin_yaw + accel_right * cos_yaw,
            lift * tilt - GRAVITY_MSS,
        );
        accel -= self.state.velocity * self.config.drag;

        if self.state.on_ground && accel.z <= 0.0 {
            self.state.velocity = Vector3::zeros();
            self.state.position.z = 0.0;
            return;
        }

        self.state.on_ground = false;
        self.state.velocity += accel * dt;
        self.state.position += self.state.velocity * dt;

        // Ground contact
        if self.state.position.z <= 0.0 {
            self.state.position.z = 0.0;
            self.state.velocity = Vector3::zeros();
            self.state.on_ground = true;
        }
    }

    /// Synthesize sensor data from current vehicle state.
    fn synthesize_sensors(&mut self) -> SensorData {
        let position = if self.gps_available {
            let noise = Vector3::new(
                self.gaussian_noise(self.config.position_noise_m),
                self.gaussian_noise(self.config.position_noise_m),
                self.gaussian_noise(self.config.position_noise_m),
            );
            Some(self.state.position + self.estimate_offset + noise)
        } else {
            None
        };
        let altitude_m =
            self.state.position.z + self.estimate_offset.z + self.gaussian_noise(self.config.position_noise_m);
        let velocity_noise = Vector3::new(
            self.gaussian_noise(self.config.velocity_noise_ms),
            self.gaussian_noise(self.config.velocity_noise_ms),
            self.gaussian_noise(self.config.velocity_noise_ms),
        );

        SensorData {
            timestamp_us: self.sim_time_us,
            vehicle_id: self.vehicle_id,
            position,
            altitude_m,
            velocity: self.state.velocity + velocity_noise,
            attitude: self.state.attitude,
            reset: self.reset,
            motor_limits: self.state.limits,
            on_ground: self.state.on_ground,
        }
    }

    /// Generate Gaussian noise using Box-Muller transform.
    fn gaussian_noise(&mut self, stddev: f32) -> f32 {
        if stddev == 0.0 {
            return 0.0;
        }
        let u1: f32 = self.rng.gen::<f32>().max(f32::EPSILON);
        let u2: f32 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        z * stddev
    }

    /// Get the true position in meters (NEU).
    pub fn position(&self) -> Vector3<f32> {
        self.state.position
    }

    /// Get the true velocity in m/s (NEU).
    pub fn velocity(&self) -> Vector3<f32> {
        self.state.velocity
    }

    /// Get the current heading in radians.
    pub fn heading(&self) -> f32 {
        self.state.attitude.yaw
    }

    /// Get the applied thrust (0..1).
    pub fn thrust(&self) -> f32 {
        self.state.thrust
    }

    /// Returns true while resting on the ground.
    pub fn on_ground(&self) -> bool {
        self.state.on_ground
    }
}

impl std::fmt::Debug for LightweightAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightweightAdapter")
            .field("name", &self.name)
            .field("vehicle_id", &self.vehicle_id)
            .field("connected", &self.connected)
            .field("sim_time_us", &self.sim_time_us)
            .finish()
    }
}

#[async_trait]
impl SimulatorAdapter for LightweightAdapter {
    fn adapter_type(&self) -> &'static str {
        "lightweight"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self) -> Result<(), SimulatorError> {
        // Reset state on connect
        self.state = VehicleState::new(self.config.start_position);
        self.sim_time_us = 0;
        self.gps_available = true;
        self.estimate_offset = Vector3::zeros();
        self.reset = EstimateReset::default();
        self.rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SimulatorError> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn receive_sensors(&mut self) -> Result<Option<SensorData>, SimulatorError> {
        if !self.connected {
            return Err(SimulatorError::NotConnected);
        }
        Ok(Some(self.synthesize_sensors()))
    }

    async fn send_actuators(&mut self, commands: &ActuatorCommands) -> Result<(), SimulatorError> {
        if !self.connected {
            return Err(SimulatorError::NotConnected);
        }
        let thrust = commands.thrust.clamp(0.0, 1.0);
        self.state.limits = MotorLimits {
            throttle_lower: commands.thrust <= self.config.thrust_min,
            throttle_upper: commands.thrust >= 1.0,
        };
        self.state.thrust = thrust;
        self.state.attitude.roll = commands.roll;
        self.state.attitude.pitch = commands.pitch;
        self.state.yaw_rate = commands.yaw_rate;
        Ok(())
    }

    async fn step(&mut self) -> Result<(), SimulatorError> {
        if !self.connected {
            return Err(SimulatorError::NotConnected);
        }
        let dt = self.config.step_size_us as f32 / 1_000_000.0;
        self.state.attitude.yaw = normalize_angle(self.state.attitude.yaw + self.state.yaw_rate * dt);
        self.integrate(dt);
        self.sim_time_us += self.config.step_size_us;
        Ok(())
    }

    fn sim_time_us(&self) -> u64 {
        self.sim_time_us
    }

    fn step_size_us(&self) -> u64 {
        self.config.step_size_us
    }
}

/// Normalize angle to [-pi, pi].
fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * std::f32::consts::PI);
    if a > std::f32::consts::PI {
        a -= 2.0 * std::f32::consts::PI;
    } else if a < -std::f32::consts::PI {
        a += 2.0 * std::f32::consts::PI;
    }
    a
}
