//! Rig Common Library
//!
//! Shared configuration loading, unit handling and hardware abstraction types
//! for the test rig crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and log levels
//! - [`consts`] - Workspace-wide defaults
//! - [`hal`] - Actuator driver trait, converter constants, rig configuration
//! - [`telemetry`] - Telemetry sample records
//! - [`units`] - Length and force units
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod telemetry;
pub mod units;
