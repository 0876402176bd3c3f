//! Landing Parameter Definitions
//!
//! # Parameters
//!
//! - `LAND_SPEED` - Final descent speed (m/s)
//! - `LAND_SPEED_HIGH` - Descent speed above `LAND_ALT_LOW`; 0 uses `WPNAV_SPEED_DN` (m/s)
//! - `LAND_ALT_LOW` - Altitude below which the final descent speed is used (m)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

const DEFAULT_SPEED: f32 = 0.5;
const DEFAULT_SPEED_HIGH: f32 = 0.0;
const DEFAULT_ALT_LOW: f32 = 10.0;

const MIN_SPEED: f32 = 0.3;
const MAX_SPEED: f32 = 2.0;
const MAX_SPEED_HIGH: f32 = 5.0;
const MAX_ALT_LOW: f32 = 100.0;

/// Landing parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct LandParams {
    /// Final descent speed (m/s)
    pub speed: f32,
    /// Descent speed above `alt_low`; 0 uses the waypoint descent speed (m/s)
    pub speed_high: f32,
    /// Altitude below which `speed` is used (m)
    pub alt_low: f32,
}

impl Default for LandParams {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            speed_high: DEFAULT_SPEED_HIGH,
            alt_low: DEFAULT_ALT_LOW,
        }
    }
}

impl LandParams {
    /// Register landing parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register("LAND_SPEED", ParamValue::Float(DEFAULT_SPEED), ParamFlags::empty())?;
        store.register(
            "LAND_SPEED_HIGH",
            ParamValue::Float(DEFAULT_SPEED_HIGH),
            ParamFlags::empty(),
        )?;
        store.register(
            "LAND_ALT_LOW",
            ParamValue::Float(DEFAULT_ALT_LOW),
            ParamFlags::empty(),
        )?;
        Ok(())
    }

    /// Load landing parameters from parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            speed: store.get_f32_clamped("LAND_SPEED", DEFAULT_SPEED, MIN_SPEED, MAX_SPEED),
            speed_high: store.get_f32_clamped("LAND_SPEED_HIGH", DEFAULT_SPEED_HIGH, 0.0, MAX_SPEED_HIGH),
            alt_low: store.get_f32_clamped("LAND_ALT_LOW", DEFAULT_ALT_LOW, 1.0, MAX_ALT_LOW),
        }
    }

    /// Validate landing parameters
    pub fn is_valid(&self) -> bool {
        self.speed >= MIN_SPEED && self.speed <= MAX_SPEED && self.speed_high >= 0.0
    }
}
