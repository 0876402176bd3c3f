//! Vehicle state consumed by, and targets produced by, the flight core

pub mod state;
pub mod targets;

pub use state::{Attitude, EkfStatus, MotorLimits, PilotInput, VehicleState};
pub use targets::{AttitudeTarget, AxisCommand, FlightTargets, HorizontalCommand, ThrottleDemand};
