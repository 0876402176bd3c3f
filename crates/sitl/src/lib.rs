pub mod adapter;
pub mod bridge;
pub mod error;
pub mod types;

pub use adapter::{LightweightAdapter, LightweightConfig, SimulatorAdapter};
pub use bridge::SitlBridge;
pub use error::SimulatorError;
pub use types::{ActuatorCommands, EstimateReset, SensorData, VehicleId};
