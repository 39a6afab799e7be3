//! # Rig Control Library
//!
//! Closed-loop position control of a linear actuator driven through a
//! direction relay and a speed DAC, with position feedback from an ADC.
//!
//! ## Layers
//!
//! 1. **control**: feedback laws (None/P/PD/PI/PID) and the moving-average
//!    position filter
//! 2. **motion**: the `set_position` / `seek_load` loops
//! 3. **rig**: the context object that owns the driver, clock and cancel
//!    token and hands them to the loops
//!
//! All waiting goes through [`clock::Clock`], and every loop polls the
//! [`safety::CancelToken`], so an operator interrupt always ends motion with
//! the drive stopped.

pub mod clock;
pub mod control;
pub mod error;
pub mod motion;
pub mod rig;
pub mod safety;

pub use error::MotionError;
pub use rig::Rig;
