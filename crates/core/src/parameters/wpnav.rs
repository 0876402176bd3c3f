//! Horizontal Navigation Parameter Definitions
//!
//! Waypoint, loiter and circle parameters following the conventional names, in
//! SI units.
//!
//! # Parameters
//!
//! - `WPNAV_SPEED` - Horizontal waypoint speed (m/s)
//! - `WPNAV_SPEED_UP` / `WPNAV_SPEED_DN` - Waypoint climb/descent speed (m/s)
//! - `WPNAV_ACCEL` - Horizontal acceleration (m/s/s)
//! - `WPNAV_RADIUS` - Waypoint acceptance radius (m)
//! - `PSC_TC_XY` - Horizontal shaping time constant (s)
//! - `PSC_POSXY_P` / `PSC_VELXY_P` - Horizontal position and velocity gains
//! - `LOIT_SPEED` - Maximum loiter speed (m/s)
//! - `LOIT_BRK_ACCEL` - Loiter braking acceleration (m/s/s)
//! - `CIRCLE_RADIUS` - Circle radius (m)
//! - `CIRCLE_RATE` - Circle turn rate (deg/s, negative = counter-clockwise)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};

const DEFAULT_SPEED: f32 = 10.0;
const DEFAULT_SPEED_UP: f32 = 2.5;
const DEFAULT_SPEED_DN: f32 = 1.5;
const DEFAULT_ACCEL: f32 = 2.5;
const DEFAULT_RADIUS: f32 = 2.0;
const DEFAULT_TC_XY: f32 = 1.0;
const DEFAULT_POSXY_P: f32 = 1.0;
const DEFAULT_VELXY_P: f32 = 2.0;
const DEFAULT_LOIT_SPEED: f32 = 12.5;
const DEFAULT_LOIT_BRK_ACCEL: f32 = 2.5;
const DEFAULT_CIRCLE_RADIUS: f32 = 10.0;
const DEFAULT_CIRCLE_RATE_DEG: f32 = 20.0;

const MIN_SPEED: f32 = 0.2;
const MAX_SPEED: f32 = 20.0;
const MIN_ACCEL: f32 = 0.5;
const MAX_ACCEL: f32 = 10.0;
const MIN_RADIUS: f32 = 0.05;
const MAX_RADIUS: f32 = 10.0;
const MAX_TC: f32 = 5.0;
const MAX_GAIN: f32 = 20.0;
const MAX_CIRCLE_RADIUS: f32 = 2000.0;
const MAX_CIRCLE_RATE_DEG: f32 = 90.0;

/// Horizontal navigation parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct WpnavParams {
    /// Horizontal waypoint speed (m/s)
    pub speed: f32,
    /// Waypoint climb speed (m/s)
    pub speed_up: f32,
    /// Waypoint descent speed (m/s, positive)
    pub speed_down: f32,
    /// Horizontal acceleration limit (m/s/s)
    pub accel: f32,
    /// Waypoint acceptance radius (m)
    pub radius: f32,
    /// Horizontal shaping time constant (s)
    pub tc_xy: f32,
    /// Horizontal position P gain
    pub pos_xy_p: f32,
    /// Horizontal velocity P gain
    pub vel_xy_p: f32,
    /// Maximum loiter speed (m/s)
    pub loiter_speed: f32,
    /// Loiter braking acceleration (m/s/s)
    pub loiter_brake_accel: f32,
    /// Circle radius (m)
    pub circle_radius: f32,
    /// Circle turn rate (rad/s, negative = counter-clockwise)
    pub circle_rate: f32,
}

impl Default for WpnavParams {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            speed_up: DEFAULT_SPEED_UP,
            speed_down: DEFAULT_SPEED_DN,
            accel: DEFAULT_ACCEL,
            radius: DEFAULT_RADIUS,
            tc_xy: DEFAULT_TC_XY,
            pos_xy_p: DEFAULT_POSXY_P,
            vel_xy_p: DEFAULT_VELXY_P,
            loiter_speed: DEFAULT_LOIT_SPEED,
            loiter_brake_accel: DEFAULT_LOIT_BRK_ACCEL,
            circle_radius: DEFAULT_CIRCLE_RADIUS,
            circle_rate: DEFAULT_CIRCLE_RATE_DEG.to_radians(),
        }
    }
}

impl WpnavParams {
    /// Register navigation parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let defaults: [(&str, f32); 12] = [
            ("WPNAV_SPEED", DEFAULT_SPEED),
            ("WPNAV_SPEED_UP", DEFAULT_SPEED_UP),
            ("WPNAV_SPEED_DN", DEFAULT_SPEED_DN),
            ("WPNAV_ACCEL", DEFAULT_ACCEL),
            ("WPNAV_RADIUS", DEFAULT_RADIUS),
            ("PSC_TC_XY", DEFAULT_TC_XY),
            ("PSC_POSXY_P", DEFAULT_POSXY_P),
            ("PSC_VELXY_P", DEFAULT_VELXY_P),
            ("LOIT_SPEED", DEFAULT_LOIT_SPEED),
            ("LOIT_BRK_ACCEL", DEFAULT_LOIT_BRK_ACCEL),
            ("CIRCLE_RADIUS", DEFAULT_CIRCLE_RADIUS),
            ("CIRCLE_RATE", DEFAULT_CIRCLE_RATE_DEG),
        ];
        for (name, value) in defaults {
            store.register(name, ParamValue::Float(value), ParamFlags::empty())?;
        }
        Ok(())
    }

    /// Load navigation parameters from parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        let tc_xy = match store.get_f32("PSC_TC_XY") {
            Some(v) if v.is_finite() => v.min(MAX_TC),
            _ => DEFAULT_TC_XY,
        };

        Self {
            speed: store.get_f32_clamped("WPNAV_SPEED", DEFAULT_SPEED, MIN_SPEED, MAX_SPEED),
            speed_up: store.get_f32_clamped("WPNAV_SPEED_UP", DEFAULT_SPEED_UP, 0.1, MAX_SPEED),
            speed_down: store.get_f32_clamped("WPNAV_SPEED_DN", DEFAULT_SPEED_DN, 0.1, MAX_SPEED),
            accel: store.get_f32_clamped("WPNAV_ACCEL", DEFAULT_ACCEL, MIN_ACCEL, MAX_ACCEL),
            radius: store.get_f32_clamped("WPNAV_RADIUS", DEFAULT_RADIUS, MIN_RADIUS, MAX_RADIUS),
            tc_xy,
            pos_xy_p: store.get_f32_clamped("PSC_POSXY_P", DEFAULT_POSXY_P, 0.0, MAX_GAIN),
            vel_xy_p: store.get_f32_clamped("PSC_VELXY_P", DEFAULT_VELXY_P, 0.0, MAX_GAIN),
            loiter_speed: store.get_f32_clamped("LOIT_SPEED", DEFAULT_LOIT_SPEED, MIN_SPEED, MAX_SPEED),
            loiter_brake_accel: store.get_f32_clamped(
                "LOIT_BRK_ACCEL",
                DEFAULT_LOIT_BRK_ACCEL,
                MIN_ACCEL,
                MAX_ACCEL,
            ),
            circle_radius: store.get_f32_clamped(
                "CIRCLE_RADIUS",
                DEFAULT_CIRCLE_RADIUS,
                0.0,
                MAX_CIRCLE_RADIUS,
            ),
            circle_rate: store
                .get_f32_clamped(
                    "CIRCLE_RATE",
                    DEFAULT_CIRCLE_RATE_DEG,
                    -MAX_CIRCLE_RATE_DEG,
                    MAX_CIRCLE_RATE_DEG,
                )
                .to_radians(),
        }
    }

    /// Validate navigation parameters
    pub fn is_valid(&self) -> bool {
        if self.speed < MIN_SPEED || self.speed > MAX_SPEED {
            return false;
        }
        if self.accel < MIN_ACCEL || self.accel > MAX_ACCEL {
            return false;
        }
        if self.radius < MIN_RADIUS || self.radius > MAX_RADIUS {
            return false;
        }
        self.tc_xy > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wpnav_params_defaults() {
        let params = WpnavParams::default();
        assert!((params.speed - 10.0).abs() < 0.001);
        assert!((params.circle_rate - 20.0f32.to_radians()).abs() < 0.0001);
        assert!(params.is_valid());
    }

    #[test]
    fn test_wpnav_params_from_store() {
        let mut store = ParameterStore::new();
        WpnavParams::register_defaults(&mut store).unwrap();
        assert_eq!(WpnavParams::from_store(&store), WpnavParams::default());
    }

    #[test]
    fn test_wpnav_params_from_store_custom() {
        let mut store = ParameterStore::new();
        WpnavParams::register_defaults(&mut store).unwrap();

        store.set("WPNAV_SPEED", ParamValue::Float(5.0)).unwrap();
        store.set("CIRCLE_RATE", ParamValue::Float(-30.0)).unwrap();

        let params = WpnavParams::from_store(&store);
        assert!((params.speed - 5.0).abs() < 0.001);
        assert!((params.circle_rate + 30.0f32.to_radians()).abs() < 0.0001);
    }

    #[test]
    fn test_wpnav_params_clamp() {
        let mut store = ParameterStore::new();
        WpnavParams::register_defaults(&mut store).unwrap();

        store.set("WPNAV_RADIUS", ParamValue::Float(0.0)).unwrap();
        store.set("CIRCLE_RATE", ParamValue::Float(500.0)).unwrap();

        let params = WpnavParams::from_store(&store);
        assert!((params.radius - MIN_RADIUS).abs() < 0.001);
        assert!((params.circle_rate - MAX_CIRCLE_RATE_DEG.to_radians()).abs() < 0.0001);
    }

    #[test]
    fn test_wpnav_params_validation() {
        let mut params = WpnavParams::default();
        params.tc_xy = 0.0;
        assert!(!params.is_valid());

        let mut params = WpnavParams::default();
        params.speed = 50.0;
        assert!(!params.is_valid());
    }
}
