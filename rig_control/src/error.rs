//! Motion control errors.

use rig_common::hal::driver::HalError;
use std::time::Duration;
use thiserror::Error;

/// Failure of one motion command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    /// Target lies outside the hard position limits.
    #[error("target {target} outside position limits [{low}, {high}]")]
    OutOfLimits { target: f64, low: f64, high: f64 },

    /// Drive level outside what the DAC accepts.
    #[error("drive level {level} outside 0..={max}")]
    InvalidSpeed { level: f64, max: f64 },

    /// Position sensor kept returning garbage.
    #[error("no valid position sample after {attempts} reads")]
    NoValidSample { attempts: u32 },

    /// Target not reached within the settle timeout.
    #[error("target {target} not reached within {timeout:?} (last position {position})")]
    SettleTimeout {
        target: f64,
        position: f64,
        timeout: Duration,
    },

    /// The enclosing action ran out of time.
    #[error("action deadline expired at position {position}")]
    DeadlineExpired { position: f64 },

    /// Hard limit reached while seeking a load.
    #[error("position limit reached at {position} before load {min_force} was seen")]
    LimitReached { position: f64, min_force: f64 },

    /// Operator interrupt.
    #[error("motion cancelled by operator")]
    Cancelled,

    #[error(transparent)]
    Hal(#[from] HalError),
}

impl MotionError {
    /// Whether the failure may be reported as an `"error"` status instead of
    /// aborting the whole run.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Hal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability_split() {
        assert!(MotionError::NoValidSample { attempts: 3 }.is_recoverable());
        assert!(
            MotionError::SettleTimeout {
                target: 1.0,
                position: 0.0,
                timeout: Duration::from_secs(1)
            }
            .is_recoverable()
        );
        assert!(!MotionError::Cancelled.is_recoverable());
        assert!(!MotionError::from(HalError::CommunicationError("i2c".into())).is_recoverable());
    }
}
