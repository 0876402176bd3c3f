//! Mode transition provenance

/// Why a mode change was requested
///
/// Recorded with every transition for arming logic and logging. Never
/// affects the control math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeReason {
    /// Initial mode at boot
    Initialized,
    /// Pilot flight-mode switch
    RcCommand,
    /// Ground control station command
    GcsCommand,
    /// Radio failsafe
    RadioFailsafe,
    /// Battery failsafe
    BatteryFailsafe,
    /// Ground control link lost
    GcsFailsafe,
    /// EKF or position estimate failsafe
    EkfFailsafe,
    /// GPS glitch
    GpsGlitch,
    /// Mission finished
    MissionEnd,
    /// Mission command requested the change
    MissionCommand,
    /// Brake mode timed out
    BrakeTimeout,
    /// Internal autopilot decision
    AutopilotLogic,
}

impl ModeReason {
    /// Returns true if the request came from a ground control station
    pub fn is_from_gcs(&self) -> bool {
        matches!(self, ModeReason::GcsCommand)
    }

    /// Returns true if the request was raised by a failsafe
    pub fn is_failsafe(&self) -> bool {
        matches!(
            self,
            ModeReason::RadioFailsafe
                | ModeReason::BatteryFailsafe
                | ModeReason::GcsFailsafe
                | ModeReason::EkfFailsafe
                | ModeReason::GpsGlitch
        )
    }

    /// Name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeReason::Initialized => "initialized",
            ModeReason::RcCommand => "rc command",
            ModeReason::GcsCommand => "gcs command",
            ModeReason::RadioFailsafe => "radio failsafe",
            ModeReason::BatteryFailsafe => "battery failsafe",
            ModeReason::GcsFailsafe => "gcs failsafe",
            ModeReason::EkfFailsafe => "ekf failsafe",
            ModeReason::GpsGlitch => "gps glitch",
            ModeReason::MissionEnd => "mission end",
            ModeReason::MissionCommand => "mission command",
            ModeReason::BrakeTimeout => "brake timeout",
            ModeReason::AutopilotLogic => "autopilot",
        }
    }
}
