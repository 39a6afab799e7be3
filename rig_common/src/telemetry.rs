//! Telemetry samples.
//!
//! Reading position, speed or load never publishes anything by itself.
//! Callers that want a record build a `TelemetrySample` from plain reads and
//! hand it to whatever sink they own.

use crate::hal::driver::LoadReading;
use serde::{Deserialize, Serialize};

/// One snapshot of the actuator's observable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Seconds since the rig clock started.
    pub timestamp_s: f64,
    /// Filtered position in raw levels.
    pub position: f64,
    /// Current drive level.
    pub speed: f64,
    /// Last load cell report, if the read succeeded.
    pub load: Option<LoadReading>,
}

impl TelemetrySample {
    /// Render as a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
