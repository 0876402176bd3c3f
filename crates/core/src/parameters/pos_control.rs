//! Vertical Position Control and Pilot Parameter Definitions
//!
//! Defines the vertical position controller and pilot input parameters
//! following the conventional names. Values are stored in SI units (metres,
//! seconds) and degrees for angles; angles are converted to radians on load.
//!
//! # Parameters
//!
//! - `PILOT_SPEED_UP` / `PILOT_SPEED_DN` - Maximum pilot climb/descent rate (m/s)
//! - `PILOT_ACCEL_Z` - Vertical acceleration limit (m/s/s)
//! - `PSC_TC_Z` - Vertical shaping time constant (s)
//! - `PSC_POSZ_P` / `PSC_VELZ_P` - Vertical position and velocity gains
//! - `FENCE_ALT_MIN` / `FENCE_ALT_MAX` - Altitude limits (m, both 0 = disabled)
//! - `ANGLE_MAX` - Maximum lean angle (deg)
//! - `PILOT_Y_RATE` - Pilot yaw rate at full stick (deg/s)
//! - `ACRO_RP_RATE` - Acro roll/pitch rate at full stick (deg/s)
//! - `THR_DZ` - Throttle dead zone around mid stick (fraction of full range)
//! - `MOT_THST_HOVER` - Hover throttle (0..1)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

const DEFAULT_SPEED_UP: f32 = 2.5;
const DEFAULT_SPEED_DN: f32 = 1.5;
const DEFAULT_ACCEL_Z: f32 = 2.5;
const DEFAULT_TC_Z: f32 = 1.0;
const DEFAULT_POSZ_P: f32 = 1.0;
const DEFAULT_VELZ_P: f32 = 5.0;
const DEFAULT_ANGLE_MAX_DEG: f32 = 30.0;
const DEFAULT_YAW_RATE_DEG: f32 = 202.5;
const DEFAULT_ACRO_RATE_DEG: f32 = 360.0;
const DEFAULT_THR_DZ: f32 = 0.1;
const DEFAULT_HOVER: f32 = 0.35;

const MAX_SPEED: f32 = 20.0;
const MIN_ACCEL: f32 = 0.5;
const MAX_ACCEL: f32 = 10.0;
const MAX_TC: f32 = 5.0;
const MAX_GAIN: f32 = 20.0;
const MIN_ANGLE_DEG: f32 = 10.0;
const MAX_ANGLE_DEG: f32 = 80.0;
const MAX_RATE_DEG: f32 = 720.0;
const MAX_THR_DZ: f32 = 0.3;
const MIN_HOVER: f32 = 0.125;
const MAX_HOVER: f32 = 0.6875;
const MAX_ALT_ABS: f32 = 1000.0;

/// Vertical control and pilot input parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct PosControlParams {
    /// Maximum pilot climb rate (m/s)
    pub pilot_speed_up: f32,
    /// Maximum pilot descent rate (m/s, positive)
    pub pilot_speed_dn: f32,
    /// Vertical acceleration limit (m/s/s)
    pub accel_z: f32,
    /// Vertical shaping time constant (s); non-positive disables shaping
    pub tc_z: f32,
    /// Vertical position P gain
    pub pos_z_p: f32,
    /// Vertical velocity P gain
    pub vel_z_p: f32,
    /// Lower altitude limit (m)
    pub alt_min: f32,
    /// Upper altitude limit (m)
    pub alt_max: f32,
    /// Maximum lean angle (rad)
    pub angle_max: f32,
    /// Pilot yaw rate at full stick (rad/s)
    pub pilot_yaw_rate: f32,
    /// Acro roll/pitch rate at full stick (rad/s)
    pub acro_rp_rate: f32,
    /// Throttle dead zone around mid stick (fraction)
    pub throttle_deadzone: f32,
    /// Hover throttle (0..1)
    pub throttle_hover: f32,
}

impl Default for PosControlParams {
    fn default() -> Self {
        Self {
            pilot_speed_up: DEFAULT_SPEED_UP,
            pilot_speed_dn: DEFAULT_SPEED_DN,
            accel_z: DEFAULT_ACCEL_Z,
            tc_z: DEFAULT_TC_Z,
            pos_z_p: DEFAULT_POSZ_P,
            vel_z_p: DEFAULT_VELZ_P,
            alt_min: 0.0,
            alt_max: 0.0,
            angle_max: DEFAULT_ANGLE_MAX_DEG.to_radians(),
            pilot_yaw_rate: DEFAULT_YAW_RATE_DEG.to_radians(),
            acro_rp_rate: DEFAULT_ACRO_RATE_DEG.to_radians(),
            throttle_deadzone: DEFAULT_THR_DZ,
            throttle_hover: DEFAULT_HOVER,
        }
    }
}

impl PosControlParams {
    /// Register vertical control parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let defaults: [(&str, f32); 13] = [
            ("PILOT_SPEED_UP", DEFAULT_SPEED_UP),
            ("PILOT_SPEED_DN", DEFAULT_SPEED_DN),
            ("PILOT_ACCEL_Z", DEFAULT_ACCEL_Z),
            ("PSC_TC_Z", DEFAULT_TC_Z),
            ("PSC_POSZ_P", DEFAULT_POSZ_P),
            ("PSC_VELZ_P", DEFAULT_VELZ_P),
            ("FENCE_ALT_MIN", 0.0),
            ("FENCE_ALT_MAX", 0.0),
            ("ANGLE_MAX", DEFAULT_ANGLE_MAX_DEG),
            ("PILOT_Y_RATE", DEFAULT_YAW_RATE_DEG),
            ("ACRO_RP_RATE", DEFAULT_ACRO_RATE_DEG),
            ("THR_DZ", DEFAULT_THR_DZ),
            ("MOT_THST_HOVER", DEFAULT_HOVER),
        ];
        for (name, value) in defaults {
            store.register(name, ParamValue::Float(value), ParamFlags::empty())?;
        }
        Ok(())
    }

    /// Load vertical control parameters from parameter store
    ///
    /// Out-of-range values are clamped. The time constant and altitude
    /// limits are loaded as-is so that the controller can treat invalid
    /// combinations as "disabled".
    pub fn from_store(store: &ParameterStore) -> Self {
        let raw = |name: &str, default: f32| match store.get_f32(name) {
            Some(v) if v.is_finite() => v,
            _ => default,
        };

        Self {
            pilot_speed_up: store.get_f32_clamped("PILOT_SPEED_UP", DEFAULT_SPEED_UP, 0.1, MAX_SPEED),
            pilot_speed_dn: store.get_f32_clamped("PILOT_SPEED_DN", DEFAULT_SPEED_DN, 0.1, MAX_SPEED),
            accel_z: store.get_f32_clamped("PILOT_ACCEL_Z", DEFAULT_ACCEL_Z, MIN_ACCEL, MAX_ACCEL),
            tc_z: raw("PSC_TC_Z", DEFAULT_TC_Z).min(MAX_TC),
            pos_z_p: store.get_f32_clamped("PSC_POSZ_P", DEFAULT_POSZ_P, 0.0, MAX_GAIN),
            vel_z_p: store.get_f32_clamped("PSC_VELZ_P", DEFAULT_VELZ_P, 0.0, MAX_GAIN),
            alt_min: raw("FENCE_ALT_MIN", 0.0),
            alt_max: raw("FENCE_ALT_MAX", 0.0),
            angle_max: store
                .get_f32_clamped("ANGLE_MAX", DEFAULT_ANGLE_MAX_DEG, MIN_ANGLE_DEG, MAX_ANGLE_DEG)
                .to_radians(),
            pilot_yaw_rate: store
                .get_f32_clamped("PILOT_Y_RATE", DEFAULT_YAW_RATE_DEG, 1.0, MAX_RATE_DEG)
                .to_radians(),
            acro_rp_rate: store
                .get_f32_clamped("ACRO_RP_RATE", DEFAULT_ACRO_RATE_DEG, 1.0, MAX_RATE_DEG)
                .to_radians(),
            throttle_deadzone: store.get_f32_clamped("THR_DZ", DEFAULT_THR_DZ, 0.0, MAX_THR_DZ),
            throttle_hover: store.get_f32_clamped("MOT_THST_HOVER", DEFAULT_HOVER, MIN_HOVER, MAX_HOVER),
        }
    }

    /// Validate vertical control parameters
    ///
    /// Altitude limits that are both zero count as valid (disabled).
    pub fn is_valid(&self) -> bool {
        if self.pilot_speed_up <= 0.0 || self.pilot_speed_dn <= 0.0 {
            return false;
        }
        if self.accel_z < MIN_ACCEL || self.accel_z > MAX_ACCEL {
            return false;
        }
        if self.tc_z <= 0.0 {
            return false;
        }
        let limits_disabled = self.alt_min == 0.0 && self.alt_max == 0.0;
        if !limits_disabled
            && (self.alt_min >= self.alt_max
                || self.alt_min.abs() > MAX_ALT_ABS
                || self.alt_max.abs() > MAX_ALT_ABS)
        {
            return false;
        }
        self.throttle_hover > 0.0 && self.throttle_hover < 1.0
    }
}
