//! Simulation driver module.
//!
//! A software actuator with position physics, a spring-contact load cell and
//! periodic garbage ADC readings, so the control loop can be exercised
//! without hardware.

mod driver;
mod physics;

pub use driver::{SimulatedActuator, SimulationSettings};
pub use physics::{ActuatorModel, SpringContact};

use crate::driver_registry::DriverEntry;
use rig_common::hal::driver::ActuatorDriver;

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Registry entry of the simulation driver.
pub const ENTRY: DriverEntry = DriverEntry {
    name: DRIVER_NAME,
    summary: "Software actuator with spring-contact load cell and injected ADC glitches",
    factory: create_driver,
};

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn ActuatorDriver> {
    Box::new(SimulatedActuator::new())
}
