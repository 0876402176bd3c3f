//! Parameter management types
//!
//! This module provides the in-memory parameter store and the typed
//! parameter groups the flight core is configured from. Persistence of the
//! store is owned by the host.

pub mod config;
pub mod error;
pub mod land;
pub mod pos_control;
pub mod rtl;
pub mod storage;
pub mod wpnav;

pub use config::FlightConfig;
pub use error::ParameterError;
pub use land::LandParams;
pub use pos_control::PosControlParams;
pub use rtl::RtlParams;
pub use storage::{ParamFlags, ParamMetadata, ParamValue, ParameterStore, MAX_PARAMS, PARAM_NAME_LEN};
pub use wpnav::WpnavParams;
