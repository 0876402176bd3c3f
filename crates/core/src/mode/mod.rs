//! Flight modes and the mode arbiter
//!
//! Every mode implements the [`Mode`] lifecycle against an explicit
//! [`ModeContext`]. The closed set of modes is the [`FlightMode`] enum; the
//! [`ModeArbiter`] owns exactly one of them at a time.
//!
//! # Contents
//!
//! - Capability table ([`ModeId`], [`ModeDescriptor`])
//! - Transition reasons, errors and the event log
//! - One module per mode, with sub-states where the mode has phases
//! - Pilot stick mapping helpers ([`pilot`])

mod acro;
mod althold;
mod arbiter;
mod auto;
mod brake;
mod circle;
mod context;
mod descriptor;
mod error;
mod event;
mod guided;
mod land;
mod loiter;
mod reason;
mod rtl;
mod stabilize;
mod traits;

pub mod pilot;

pub use acro::AcroMode;
pub use althold::AltHoldMode;
pub use arbiter::ModeArbiter;
#[cfg(test)]
pub(crate) use arbiter::FlightSystems;
pub use auto::{AutoLand, AutoMode, AutoSubMode, PayloadPhase, PayloadPlace};
pub use brake::BrakeMode;
pub use circle::{CircleMode, CirclePath};
pub use context::{ModeContext, ModeRequest};
pub use descriptor::{ArmingPolicy, ModeDescriptor, ModeId};
pub use error::ModeError;
pub use event::{EventQueue, VehicleEvent, EVENT_QUEUE_LEN};
pub use guided::{GuidedController, GuidedMode, GuidedSubMode, GUIDED_VELOCITY_TIMEOUT};
pub use land::{
    land_descent_rate, LandController, LandDetector, LandMode, LAND_DETECTOR_CLIMB_RATE_MAX,
    LAND_DETECTOR_TRIGGER_SEC,
};
pub use loiter::LoiterMode;
pub use reason::ModeReason;
pub use rtl::{RtlMode, RtlPath, RtlSequence, RtlSubMode, RTL_ALT_CEILING_MARGIN};
pub use stabilize::StabilizeMode;
pub use traits::Mode;

/// The active flight mode
#[derive(Debug, Clone, PartialEq)]
pub enum FlightMode {
    Stabilize(StabilizeMode),
    Acro(AcroMode),
    AltHold(AltHoldMode),
    Auto(AutoMode),
    Guided(GuidedMode),
    Loiter(LoiterMode),
    Rtl(RtlMode),
    Circle(CircleMode),
    Land(LandMode),
    Brake(BrakeMode),
}

impl FlightMode {
    /// Fresh, not yet entered, instance of `id`
    pub fn new(id: ModeId) -> Self {
        match id {
            ModeId::Stabilize => FlightMode::Stabilize(StabilizeMode::new()),
            ModeId::Acro => FlightMode::Acro(AcroMode::new()),
            ModeId::AltHold => FlightMode::AltHold(AltHoldMode::new()),
            ModeId::Auto => FlightMode::Auto(AutoMode::new()),
            ModeId::Guided => FlightMode::Guided(GuidedMode::new()),
            ModeId::Loiter => FlightMode::Loiter(LoiterMode::new()),
            ModeId::Rtl => FlightMode::Rtl(RtlMode::new()),
            ModeId::Circle => FlightMode::Circle(CircleMode::new()),
            ModeId::Land => FlightMode::Land(LandMode::new()),
            ModeId::Brake => FlightMode::Brake(BrakeMode::new()),
        }
    }

    fn as_mode(&self) -> &dyn Mode {
        match self {
            FlightMode::Stabilize(mode) => mode,
            FlightMode::Acro(mode) => mode,
            FlightMode::AltHold(mode) => mode,
            FlightMode::Auto(mode) => mode,
            FlightMode::Guided(mode) => mode,
            FlightMode::Loiter(mode) => mode,
            FlightMode::Rtl(mode) => mode,
            FlightMode::Circle(mode) => mode,
            FlightMode::Land(mode) => mode,
            FlightMode::Brake(mode) => mode,
        }
    }

    fn as_mode_mut(&mut self) -> &mut dyn Mode {
        match self {
            FlightMode::Stabilize(mode) => mode,
            FlightMode::Acro(mode) => mode,
            FlightMode::AltHold(mode) => mode,
            FlightMode::Auto(mode) => mode,
            FlightMode::Guided(mode) => mode,
            FlightMode::Loiter(mode) => mode,
            FlightMode::Rtl(mode) => mode,
            FlightMode::Circle(mode) => mode,
            FlightMode::Land(mode) => mode,
            FlightMode::Brake(mode) => mode,
        }
    }
}

impl Mode for FlightMode {
    fn id(&self) -> ModeId {
        self.as_mode().id()
    }

    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError> {
        self.as_mode_mut().enter(ctx, ignore_checks)
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>) {
        self.as_mode_mut().update(ctx)
    }

    fn exit(&mut self, ctx: &mut ModeContext<'_>) {
        self.as_mode_mut().exit(ctx)
    }
}
