//! Flight configuration aggregate
//!
//! `FlightConfig` is built once at initialization from the parameter store
//! and handed to the mode arbiter. Modes only ever read it.

use super::error::ParameterError;
use super::land::LandParams;
use super::pos_control::PosControlParams;
use super::rtl::RtlParams;
use super::storage::ParameterStore;
use super::wpnav::WpnavParams;

/// Complete flight configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightConfig {
    /// Vertical control and pilot input parameters
    pub pos_control: PosControlParams,
    /// Horizontal navigation parameters
    pub wpnav: WpnavParams,
    /// Return-to-launch parameters
    pub rtl: RtlParams,
    /// Landing parameters
    pub land: LandParams,
}

impl FlightConfig {
    /// Register every flight parameter with its default value
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        PosControlParams::register_defaults(store)?;
        WpnavParams::register_defaults(store)?;
        RtlParams::register_defaults(store)?;
        LandParams::register_defaults(store)?;
        Ok(())
    }

    /// Load the full configuration from the parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            pos_control: PosControlParams::from_store(store),
            wpnav: WpnavParams::from_store(store),
            rtl: RtlParams::from_store(store),
            land: LandParams::from_store(store),
        }
    }

    /// Returns true if every group is valid
    pub fn is_valid(&self) -> bool {
        self.pos_control.is_valid() && self.wpnav.is_valid() && self.rtl.is_valid() && self.land.is_valid()
    }

    /// Return speed used by RTL (m/s)
    pub fn rtl_speed(&self) -> f32 {
        if self.rtl.speed > 0.0 {
            self.rtl.speed
        } else {
            self.wpnav.speed
        }
    }

    /// Descent speed used by LAND above `LAND_ALT_LOW` (m/s, positive)
    pub fn land_speed_high(&self) -> f32 {
        if self.land.speed_high > 0.0 {
            self.land.speed_high
        } else {
            self.wpnav.speed_down
        }
    }
}
