use core::fmt;

use copter_core::vehicle::{Attitude, MotorLimits};
use nalgebra::Vector3;

/// Vehicle identifier (matches MAVLink system ID range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub u8);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vehicle({})", self.0)
    }
}

/// Navigation estimate reset reported with the sensor data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateReset {
    /// Incremented on every reset.
    pub epoch: u32,
    /// Shift applied by the most recent reset in meters (NEU).
    pub offset: Vector3<f32>,
}

impl Default for EstimateReset {
    fn default() -> Self {
        Self {
            epoch: 0,
            offset: Vector3::zeros(),
        }
    }
}

/// Aggregated sensor data from a simulator.
#[derive(Debug, Clone)]
pub struct SensorData {
    /// Timestamp in microseconds (simulation time).
    pub timestamp_us: u64,
    /// Vehicle that produced this data.
    pub vehicle_id: VehicleId,
    /// Position estimate in meters (NEU). `None` while GPS is unavailable.
    pub position: Option<Vector3<f32>>,
    /// Barometric altitude in meters, available without GPS.
    pub altitude_m: f32,
    /// Velocity estimate in m/s (NEU).
    pub velocity: Vector3<f32>,
    /// Attitude in radians.
    pub attitude: Attitude,
    /// Estimate reset status.
    pub reset: EstimateReset,
    /// Thrust saturation flags from the motor stage.
    pub motor_limits: MotorLimits,
    /// Vehicle is resting on the ground.
    pub on_ground: bool,
}

/// Actuator commands sent to a simulator.
#[derive(Debug, Clone)]
pub struct ActuatorCommands {
    /// Timestamp in microseconds (simulation time).
    pub timestamp_us: u64,
    /// Target vehicle.
    pub vehicle_id: VehicleId,
    /// Roll angle demand in radians.
    pub roll: f32,
    /// Pitch angle demand in radians.
    pub pitch: f32,
    /// Yaw rate demand in rad/s.
    pub yaw_rate: f32,
    /// Collective thrust demand, normalized 0.0 to 1.0 (may exceed the
    /// range; the simulator saturates it).
    pub thrust: f32,
}
