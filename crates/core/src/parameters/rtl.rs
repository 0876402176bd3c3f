//! Return-To-Launch Parameter Definitions
//!
//! # Parameters
//!
//! - `RTL_ALT` - Minimum return altitude above home (m)
//! - `RTL_CLIMB_MIN` - Minimum climb before returning (m)
//! - `RTL_LOIT_TIME` - Loiter time above home before descending (s)
//! - `RTL_ALT_FINAL` - Final altitude above home; 0 lands (m)
//! - `RTL_SPEED` - Return speed; 0 uses `WPNAV_SPEED` (m/s)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

const DEFAULT_ALT: f32 = 15.0;
const DEFAULT_CLIMB_MIN: f32 = 0.0;
const DEFAULT_LOIT_TIME: f32 = 5.0;
const DEFAULT_ALT_FINAL: f32 = 0.0;
const DEFAULT_SPEED: f32 = 0.0;

const MIN_ALT: f32 = 2.0;
const MAX_ALT: f32 = 300.0;
const MAX_CLIMB_MIN: f32 = 30.0;
const MAX_LOIT_TIME: f32 = 60.0;
const MAX_SPEED: f32 = 20.0;

/// RTL parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct RtlParams {
    /// Minimum return altitude above home (m)
    pub altitude: f32,
    /// Minimum climb before returning (m)
    pub climb_min: f32,
    /// Loiter time above home (s)
    pub loiter_time: f32,
    /// Final altitude above home; 0 lands (m)
    pub altitude_final: f32,
    /// Return speed; 0 uses the waypoint speed (m/s)
    pub speed: f32,
}

impl Default for RtlParams {
    fn default() -> Self {
        Self {
            altitude: DEFAULT_ALT,
            climb_min: DEFAULT_CLIMB_MIN,
            loiter_time: DEFAULT_LOIT_TIME,
            altitude_final: DEFAULT_ALT_FINAL,
            speed: DEFAULT_SPEED,
        }
    }
}

impl RtlParams {
    /// Register RTL parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("RTL_ALT", ParamValue::Float(DEFAULT_ALT), ParamFlags::empty())?;
        store.register(
            "RTL_CLIMB_MIN",
            ParamValue::Float(DEFAULT_CLIMB_MIN),
            ParamFlags::empty(),
        )?;
        store.register(
            "RTL_LOIT_TIME",
            ParamValue::Float(DEFAULT_LOIT_TIME),
            ParamFlags::empty(),
        )?;
        store.register(
            "RTL_ALT_FINAL",
            ParamValue::Float(DEFAULT_ALT_FINAL),
            ParamFlags::empty(),
        )?;
        store.register("RTL_SPEED", ParamValue::Float(DEFAULT_SPEED), ParamFlags::empty())?;
        Ok(())
    }

    /// Load RTL parameters from parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            altitude: store.get_f32_clamped("RTL_ALT", DEFAULT_ALT, MIN_ALT, MAX_ALT),
            climb_min: store.get_f32_clamped("RTL_CLIMB_MIN", DEFAULT_CLIMB_MIN, 0.0, MAX_CLIMB_MIN),
            loiter_time: store.get_f32_clamped("RTL_LOIT_TIME", DEFAULT_LOIT_TIME, 0.0, MAX_LOIT_TIME),
            altitude_final: store.get_f32_clamped("RTL_ALT_FINAL", DEFAULT_ALT_FINAL, 0.0, MAX_ALT),
            speed: store.get_f32_clamped("RTL_SPEED", DEFAULT_SPEED, 0.0, MAX_SPEED),
        }
    }

    /// Validate RTL parameters
    pub fn is_valid(&self) -> bool {
        self.altitude >= MIN_ALT
            && self.altitude <= MAX_ALT
            && self.climb_min >= 0.0
            && self.loiter_time >= 0.0
            && self.altitude_final >= 0.0
            && self.speed >= 0.0
    }
}
