//! Hardware abstraction layer types.
//!
//! This module contains the driver trait, converter constants and the rig
//! configuration block consumed by every driver.

pub mod config;
pub mod consts;
pub mod driver;
