//! Actuator driver implementations.
//!
//! - [`simulation`] - Deterministic software actuator for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `ActuatorDriver` from `rig_common::hal::driver`
//! 3. Expose a `DriverEntry` and list it in [`builtin_entries`]

pub mod simulation;

use crate::driver_registry::DriverEntry;

/// Every built-in driver.
pub fn builtin_entries() -> [DriverEntry; 1] {
    [simulation::ENTRY]
}
