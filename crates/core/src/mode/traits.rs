//! Mode trait definition
//!
//! Uniform lifecycle every flight mode implements.

use super::context::ModeContext;
use super::descriptor::{ModeDescriptor, ModeId};
use super::error::ModeError;

/// Flight mode
///
/// # Lifecycle
///
/// 1. `enter()` - Called once when the arbiter tries to activate the mode
/// 2. `update()` - Called once per control cycle while active
/// 3. `exit()` - Called once when superseded
///
/// `enter` must perform every check before touching shared state: an `Err`
/// leaves the context exactly as it was. With `ignore_checks` set the mode
/// must enter and degrade instead of failing.
pub trait Mode {
    /// Mode identity
    fn id(&self) -> ModeId;

    /// Initialize mode (called once on mode entry)
    fn enter(&mut self, ctx: &mut ModeContext<'_>, ignore_checks: bool) -> Result<(), ModeError>;

    /// Update mode (called once per control cycle)
    ///
    /// Must write the cycle's targets to `ctx.targets`.
    fn update(&mut self, ctx: &mut ModeContext<'_>);

    /// Cleanup mode (called once on mode exit)
    fn exit(&mut self, _ctx: &mut ModeContext<'_>) {}

    /// Capability flags
    fn descriptor(&self) -> &'static ModeDescriptor {
        self.id().descriptor()
    }

    /// Get mode name for logging and telemetry
    fn name(&self) -> &'static str {
        self.descriptor().name
    }
}
