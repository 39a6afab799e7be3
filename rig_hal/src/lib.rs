//! # Rig HAL Library
//!
//! Actuator drivers behind the `ActuatorDriver` trait defined in
//! `rig_common::hal::driver`, and the registry that selects one by name.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver entries and selection by name
//! - [`drivers`] - Driver implementations

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::{DriverEntry, DriverRegistry};
