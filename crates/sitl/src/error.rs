use copter_core::mode::{ModeError, ModeId};

/// Errors that can occur during simulator operations.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Simulator not connected")]
    NotConnected,

    #[error("No sensor data available")]
    NoSensorData,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Arming refused in {}", .mode.name())]
    ArmingRefused { mode: ModeId },

    #[error("Mode change rejected: {0}")]
    ModeRejected(#[from] ModeError),
}
