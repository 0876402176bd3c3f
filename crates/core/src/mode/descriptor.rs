//! Mode identity and capability flags
//!
//! Capability flags are a pure function of mode identity. They live in a
//! const table built at compile time and are never mutated.

use super::error::ModeError;

/// Flight mode identifier
///
/// Discriminants are the mode numbers used by ground control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ModeId {
    Stabilize = 0,
    Acro = 1,
    AltHold = 2,
    Auto = 3,
    Guided = 4,
    Loiter = 5,
    Rtl = 6,
    Circle = 7,
    Land = 9,
    Brake = 17,
}

impl ModeId {
    /// Every mode, in table order
    pub const ALL: [ModeId; 10] = [
        ModeId::Stabilize,
        ModeId::Acro,
        ModeId::AltHold,
        ModeId::Auto,
        ModeId::Guided,
        ModeId::Loiter,
        ModeId::Rtl,
        ModeId::Circle,
        ModeId::Land,
        ModeId::Brake,
    ];

    /// Ground-control mode number
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Capability flags of this mode
    pub fn descriptor(self) -> &'static ModeDescriptor {
        let index = match self {
            ModeId::Stabilize => 0,
            ModeId::Acro => 1,
            ModeId::AltHold => 2,
            ModeId::Auto => 3,
            ModeId::Guided => 4,
            ModeId::Loiter => 5,
            ModeId::Rtl => 6,
            ModeId::Circle => 7,
            ModeId::Land => 8,
            ModeId::Brake => 9,
        };
        &MODE_TABLE[index]
    }

    /// Full display name
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Four-character display name
    pub fn name4(self) -> &'static str {
        self.descriptor().name4
    }
}

impl TryFrom<u8> for ModeId {
    type Error = ModeError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        ModeId::ALL
            .iter()
            .copied()
            .find(|id| id.number() == number)
            .ok_or(ModeError::UnknownMode(number))
    }
}

/// Who may arm the vehicle while a mode is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmingPolicy {
    /// Pilot or ground control
    Always,
    /// Ground control only
    GcsOnly,
    /// Arming not allowed
    Never,
}

/// Static capability flags of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDescriptor {
    /// Mode identity
    pub id: ModeId,
    /// Full display name
    pub name: &'static str,
    /// Four-character display name
    pub name4: &'static str,
    /// Needs a valid horizontal position estimate
    pub requires_gps: bool,
    /// Pilot controls throttle directly
    pub has_manual_throttle: bool,
    /// Mode flies itself without pilot input
    pub is_autopilot: bool,
    /// Arming permission
    pub arming: ArmingPolicy,
}

impl ModeDescriptor {
    /// Returns true if arming is permitted in this mode
    pub const fn allows_arming(&self, from_gcs: bool) -> bool {
        match self.arming {
            ArmingPolicy::Always => true,
            ArmingPolicy::GcsOnly => from_gcs,
            ArmingPolicy::Never => false,
        }
    }
}

const fn descriptor(
    id: ModeId,
    name: &'static str,
    name4: &'static str,
    requires_gps: bool,
    has_manual_throttle: bool,
    is_autopilot: bool,
    arming: ArmingPolicy,
) -> ModeDescriptor {
    ModeDescriptor {
        id,
        name,
        name4,
        requires_gps,
        has_manual_throttle,
        is_autopilot,
        arming,
    }
}

/// Capability table, one entry per mode
pub static MODE_TABLE: [ModeDescriptor; 10] = [
    descriptor(ModeId::Stabilize, "STABILIZE", "STAB", false, true, false, ArmingPolicy::Always),
    descriptor(ModeId::Acro, "ACRO", "ACRO", false, true, false, ArmingPolicy::Always),
    descriptor(ModeId::AltHold, "ALT_HOLD", "ALTH", false, false, false, ArmingPolicy::Always),
    descriptor(ModeId::Auto, "AUTO", "AUTO", true, false, true, ArmingPolicy::Never),
    descriptor(ModeId::Guided, "GUIDED", "GUID", true, false, true, ArmingPolicy::GcsOnly),
    descriptor(ModeId::Loiter, "LOITER", "LOIT", true, false, false, ArmingPolicy::Always),
    descriptor(ModeId::Rtl, "RTL", "RTL ", true, false, true, ArmingPolicy::Always),
    descriptor(ModeId::Circle, "CIRCLE", "CIRC", true, false, true, ArmingPolicy::Never),
    descriptor(ModeId::Land, "LAND", "LAND", false, false, true, ArmingPolicy::Never),
    descriptor(ModeId::Brake, "BRAKE", "BRAK", true, false, false, ArmingPolicy::Never),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_ids() {
        for id in ModeId::ALL {
            assert_eq!(id.descriptor().id, id);
            assert_eq!(id.name4().len(), 4);
        }
    }

    #[test]
    fn test_mode_numbers_round_trip() {
        for id in ModeId::ALL {
            assert_eq!(ModeId::try_from(id.number()), Ok(id));
        }
        assert_eq!(ModeId::try_from(8), Err(ModeError::UnknownMode(8)));
        assert_eq!(ModeId::try_from(17), Ok(ModeId::Brake));
    }

    #[test]
    fn test_unsupported_pilot_modes_are_rejected() {
        // DRIFT, SPORT, FLIP, AUTOTUNE, POSHOLD
        for number in [11, 13, 14, 15, 16] {
            assert_eq!(ModeId::try_from(number), Err(ModeError::UnknownMode(number)));
        }
    }

    #[test]
    fn test_capability_flags() {
        assert!(ModeId::Loiter.descriptor().requires_gps);
        assert!(!ModeId::Land.descriptor().requires_gps);
        assert!(ModeId::Stabilize.descriptor().has_manual_throttle);
        assert!(ModeId::Acro.descriptor().has_manual_throttle);
        assert!(!ModeId::AltHold.descriptor().has_manual_throttle);
        assert!(ModeId::Rtl.descriptor().is_autopilot);
        assert!(!ModeId::Brake.descriptor().is_autopilot);
        assert_eq!(ModeId::Rtl.name4(), "RTL ");
    }

    #[test]
    fn test_allows_arming() {
        assert!(ModeId::Stabilize.descriptor().allows_arming(false));
        assert!(ModeId::Guided.descriptor().allows_arming(true));
        assert!(!ModeId::Guided.descriptor().allows_arming(false));
        assert!(!ModeId::Auto.descriptor().allows_arming(true));
        assert!(!ModeId::Land.descriptor().allows_arming(true));
    }
}
