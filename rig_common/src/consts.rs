//! System-wide constants for the rig workspace.
//!
//! Single source of truth for numeric defaults shared by the control loop,
//! the simulation driver and the procedure loader.

/// Capacity of the position ring buffer. `kernel_size` may not exceed it.
pub const MAX_KERNEL_SIZE: usize = 32;

/// Default moving-average kernel size for position filtering.
pub const DEFAULT_KERNEL_SIZE: usize = 5;

/// Default settling tolerance in raw ADC levels.
pub const DEFAULT_TOLERANCE: f64 = 5.0;

/// Raw readings at or below this level are treated as sensor garbage.
pub const DEFAULT_MIN_VALID_READING: f64 = 100.0;

/// Consecutive invalid readings tolerated while acquiring one sample.
pub const DEFAULT_MAX_INVALID_SAMPLES: u32 = 1000;

/// Default deadline for a single `set_position` call, in seconds.
pub const DEFAULT_SETTLE_TIMEOUT_S: f64 = 60.0;

/// Default lower position limit in raw ADC levels.
pub const DEFAULT_POS_LIMIT_LOW: f64 = 5000.0;

/// Default upper position limit in raw ADC levels.
pub const DEFAULT_POS_LIMIT_HIGH: f64 = 26000.0;

/// Default path of the procedure document.
pub const DEFAULT_PROCEDURE_PATH: &str = "procedure.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(DEFAULT_KERNEL_SIZE > 0 && DEFAULT_KERNEL_SIZE <= MAX_KERNEL_SIZE);
        assert!(DEFAULT_TOLERANCE > 0.0);
        assert!(DEFAULT_POS_LIMIT_LOW < DEFAULT_POS_LIMIT_HIGH);
        assert!(DEFAULT_MIN_VALID_READING < DEFAULT_POS_LIMIT_LOW);
        assert!(DEFAULT_SETTLE_TIMEOUT_S > 0.0);
    }
}
