//! HAL driver trait and error types.
//!
//! This module defines:
//! - `ActuatorDriver` trait - Interface for pluggable actuator backends
//! - `HalError` enum - Error types for HAL operations
//! - `DriverFactory` type alias - Factory function type
//! - `DriverDiagnostics` struct - Optional driver diagnostics

use crate::hal::config::RigConfig;
use crate::hal::consts::DAC_STOP;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Two drivers registered under one name
    #[error("Driver registered twice: {0}")]
    DuplicateDriver(String),

    /// Command rejected by the driver (out of range, not initialized)
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

/// Direction of the actuator drive relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Extending: raw position increases.
    #[default]
    Forward,
    /// Retracting: raw position decreases.
    Backward,
}

impl Direction {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        })
    }
}

impl FromStr for Direction {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" | "f" => Ok(Self::Forward),
            "backward" | "b" => Ok(Self::Backward),
            other => Err(HalError::InvalidCommand(format!(
                "unknown direction {other:?}"
            ))),
        }
    }
}

/// One load cell report.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadReading {
    /// Applied force in the load cell's native unit.
    pub force: f64,
    /// Load cell board temperature.
    pub local_temp: f64,
    /// Load cell timestamp in milliseconds since its power-up.
    pub timestamp: u64,
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn ActuatorDriver>;

/// Optional driver diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverDiagnostics {
    /// Position reads served.
    pub position_reads: u64,
    /// Position reads that returned a garbage level.
    pub invalid_reads: u64,
    /// Direction relay writes that changed the relay state.
    pub direction_changes: u64,
    /// Speed DAC writes.
    pub speed_writes: u64,
}

/// Trait defining the interface for actuator drivers.
///
/// The control loop and the procedure actions reach hardware only through
/// this trait: the position ADC, the direction relay, the speed DAC and the
/// load cell.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the first procedure runs
/// 2. reads and writes while routines execute
/// 3. `release()` - Called on shutdown or after a fault
pub trait ActuatorDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Configure pins and converters from the rig configuration.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if the hardware cannot be brought up.
    fn init(&mut self, config: &RigConfig) -> Result<(), HalError>;

    /// Single-shot raw read of the position ADC.
    ///
    /// May return garbage (near-zero) levels; filtering is the caller's job.
    fn read_position_raw(&mut self) -> Result<f64, HalError>;

    /// Drive the direction relay.
    fn set_direction(&mut self, direction: Direction) -> Result<(), HalError>;

    /// Current direction relay state.
    fn direction(&self) -> Direction;

    /// Write a level to the speed DAC.
    fn set_speed_level(&mut self, level: f64) -> Result<(), HalError>;

    /// Last level written to the speed DAC.
    fn speed_level(&self) -> f64;

    /// Read the load cell.
    fn read_load(&mut self) -> Result<LoadReading, HalError>;

    /// Stop the drive output.
    fn stop(&mut self) -> Result<(), HalError> {
        self.set_speed_level(DAC_STOP)
    }

    /// Stop the drive and release relay and converter lines.
    fn release(&mut self) -> Result<(), HalError>;

    /// Get driver-specific diagnostics.
    /// Default: None
    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        None
    }
}
