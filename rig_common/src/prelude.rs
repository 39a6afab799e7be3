//! Prelude module for common re-exports.
//!
//! ```rust
//! use rig_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::hal::config::RigConfig;

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::driver::{
    ActuatorDriver, Direction, DriverDiagnostics, DriverFactory, HalError, LoadReading,
};

// ─── Units & telemetry ──────────────────────────────────────────────
pub use crate::telemetry::TelemetrySample;
pub use crate::units::{ForceUnit, LengthUnit, UnitSystem};
