//! copter_core - Pure no_std flight logic for a multicopter
//!
//! This crate contains the flight-mode arbiter and the kinematic
//! trajectory shaping it flies with. It is platform-agnostic and can be
//! tested on host without any platform dependencies.
//!
//! # Design Principles
//!
//! - **Pure no_std**: No std library dependencies outside of tests
//! - **No allocation**: Fixed-capacity containers from `heapless`
//! - **Explicit context**: Modes receive everything they touch through
//!   [`mode::ModeContext`]
//!
//! # Modules
//!
//! - [`control`]: Shaping primitives, vertical controller, horizontal navigator
//! - [`mode`]: Flight modes, capability table and the mode arbiter
//! - [`mission`]: Mission storage and the mission sequencer
//! - [`parameters`]: Parameter store and typed flight configuration
//! - [`vehicle`]: Vehicle state inputs and flight target outputs

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod control;
pub mod mission;
pub mod mode;
pub mod parameters;
pub mod vehicle;
