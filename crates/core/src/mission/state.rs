//! Mission State Types

/// Mission execution state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MissionState {
    /// No mission active
    #[default]
    Idle,
    /// Mission running
    Running,
    /// All NAV commands completed
    Completed,
}
