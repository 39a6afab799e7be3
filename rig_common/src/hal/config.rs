//! Rig configuration block.
//!
//! `RigConfig` is the `[config]` table of a procedure document. It carries
//! the actuator position limits, converter selections and the tuning of the
//! position control loop. All positions are raw ADC levels.

use crate::config::ConfigError;
use crate::consts::{
    DEFAULT_KERNEL_SIZE, DEFAULT_MAX_INVALID_SAMPLES, DEFAULT_MIN_VALID_READING,
    DEFAULT_POS_LIMIT_HIGH, DEFAULT_POS_LIMIT_LOW, DEFAULT_SETTLE_TIMEOUT_S, DEFAULT_TOLERANCE,
    MAX_KERNEL_SIZE,
};
use crate::hal::consts::{
    ADC_LEVELS, ADC_MAX_CHANNEL, ADC_SAMPLE_RATES, DAC_MAX_LEVEL, DEFAULT_SPEED_LEVEL, GLOBAL_VCC,
    STROKE_IN, pga_full_scale,
};
use crate::units::UnitSystem;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_version() -> u32 {
    1
}

fn default_pos_limit_low() -> f64 {
    DEFAULT_POS_LIMIT_LOW
}

fn default_pos_limit_high() -> f64 {
    DEFAULT_POS_LIMIT_HIGH
}

fn default_adc_sample_rate() -> u16 {
    128
}

fn default_adc_gain() -> f64 {
    1.0
}

fn default_adc_channel() -> u8 {
    1
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_kernel_size() -> usize {
    DEFAULT_KERNEL_SIZE
}

fn default_min_valid_reading() -> f64 {
    DEFAULT_MIN_VALID_READING
}

fn default_max_invalid_samples() -> u32 {
    DEFAULT_MAX_INVALID_SAMPLES
}

/// Convert a count of seconds into a `Duration`.
///
/// `None` unless `secs` is positive, finite, and small enough to fit.
pub fn positive_duration(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

fn default_settle_timeout_s() -> f64 {
    DEFAULT_SETTLE_TIMEOUT_S
}

fn default_speed() -> f64 {
    DEFAULT_SPEED_LEVEL
}

fn default_max_speed() -> f64 {
    DAC_MAX_LEVEL
}

fn default_min_drive_level() -> f64 {
    400.0
}

fn default_vcc() -> f64 {
    GLOBAL_VCC
}

fn default_stroke_in() -> f64 {
    STROKE_IN
}

/// Configuration block of a procedure document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Unit system used for reporting.
    #[serde(default)]
    pub units: UnitSystem,

    /// Hard lower position limit.
    #[serde(default = "default_pos_limit_low")]
    pub pos_limit_low: f64,

    /// Hard upper position limit.
    #[serde(default = "default_pos_limit_high")]
    pub pos_limit_high: f64,

    /// Soft lower threshold used by monitoring. Defaults to `pos_limit_low`.
    #[serde(default)]
    pub pos_threshold_low: Option<f64>,

    /// Soft upper threshold used by monitoring. Defaults to `pos_limit_high`.
    #[serde(default)]
    pub pos_threshold_high: Option<f64>,

    /// Position ADC sample rate in samples per second.
    #[serde(default = "default_adc_sample_rate")]
    pub adc_sample_rate: u16,

    /// Position ADC PGA gain.
    #[serde(default = "default_adc_gain")]
    pub adc_gain: f64,

    /// Position ADC input channel.
    #[serde(default = "default_adc_channel")]
    pub adc_channel: u8,

    /// Sleep between control loop polls, in milliseconds.
    #[serde(default)]
    pub poll_period_ms: u64,

    /// Settling tolerance (absolute, raw levels).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Moving-average kernel size.
    #[serde(default = "default_kernel_size")]
    pub kernel_size: usize,

    /// Readings at or below this level are discarded.
    #[serde(default = "default_min_valid_reading")]
    pub min_valid_reading: f64,

    /// Consecutive invalid readings tolerated while acquiring one sample.
    #[serde(default = "default_max_invalid_samples")]
    pub max_invalid_samples: u32,

    /// Deadline for one `set_position` call, in seconds.
    #[serde(default = "default_settle_timeout_s")]
    pub settle_timeout_s: f64,

    /// Default deadline for one action, in seconds. `None` = unbounded.
    #[serde(default)]
    pub action_timeout_s: Option<f64>,

    /// Default drive level.
    #[serde(default = "default_speed")]
    pub default_speed: f64,

    /// Highest drive level the DAC accepts.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Lowest drive level used when a feedback controller scales the speed.
    #[serde(default = "default_min_drive_level")]
    pub min_drive_level: f64,

    /// Supply voltage of the position potentiometer.
    #[serde(default = "default_vcc")]
    pub vcc: f64,

    /// Actuator stroke length in inches.
    #[serde(default = "default_stroke_in")]
    pub stroke_in: f64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            units: UnitSystem::default(),
            pos_limit_low: default_pos_limit_low(),
            pos_limit_high: default_pos_limit_high(),
            pos_threshold_low: None,
            pos_threshold_high: None,
            adc_sample_rate: default_adc_sample_rate(),
            adc_gain: default_adc_gain(),
            adc_channel: default_adc_channel(),
            poll_period_ms: 0,
            tolerance: default_tolerance(),
            kernel_size: default_kernel_size(),
            min_valid_reading: default_min_valid_reading(),
            max_invalid_samples: default_max_invalid_samples(),
            settle_timeout_s: default_settle_timeout_s(),
            action_timeout_s: None,
            default_speed: default_speed(),
            max_speed: default_max_speed(),
            min_drive_level: default_min_drive_level(),
            vcc: default_vcc(),
            stroke_in: default_stroke_in(),
        }
    }
}

impl RigConfig {
    /// Validate the configuration block.
    ///
    /// # Validation Rules
    /// 1. `adc_sample_rate`, `adc_gain` and `adc_channel` are in the accepted sets
    /// 2. `pos_limit_low < pos_limit_high`, thresholds inside the limits
    /// 3. `tolerance > 0`, `1 <= kernel_size <= MAX_KERNEL_SIZE`
    /// 4. speeds ordered `0 <= min_drive_level <= default_speed <= max_speed <= DAC max`,
    ///    with `default_speed > 0`
    /// 5. timeouts positive and representable as a `Duration`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::ValidationError(msg));

        if !ADC_SAMPLE_RATES.contains(&self.adc_sample_rate) {
            return fail(format!(
                "adc_sample_rate {} not in {:?}",
                self.adc_sample_rate, ADC_SAMPLE_RATES
            ));
        }
        if pga_full_scale(self.adc_gain).is_none() {
            return fail(format!(
                "adc_gain {} not in {{2/3, 1, 2, 4, 8, 16}}",
                self.adc_gain
            ));
        }
        if self.adc_channel > ADC_MAX_CHANNEL {
            return fail(format!(
                "adc_channel {} not in 0..={ADC_MAX_CHANNEL}",
                self.adc_channel
            ));
        }

        if !(self.pos_limit_low.is_finite() && self.pos_limit_high.is_finite())
            || self.pos_limit_low >= self.pos_limit_high
        {
            return fail(format!(
                "pos_limit_low ({}) must be below pos_limit_high ({})",
                self.pos_limit_low, self.pos_limit_high
            ));
        }
        let (low, high) = self.thresholds();
        if low < self.pos_limit_low || high > self.pos_limit_high || low >= high {
            return fail(format!(
                "thresholds [{low}, {high}] must lie inside limits [{}, {}]",
                self.pos_limit_low, self.pos_limit_high
            ));
        }

        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return fail(format!("tolerance must be positive, got {}", self.tolerance));
        }
        if self.kernel_size == 0 || self.kernel_size > MAX_KERNEL_SIZE {
            return fail(format!(
                "kernel_size {} not in 1..={MAX_KERNEL_SIZE}",
                self.kernel_size
            ));
        }
        if self.max_invalid_samples == 0 {
            return fail("max_invalid_samples must be at least 1".to_string());
        }

        if !(0.0 <= self.min_drive_level
            && self.min_drive_level <= self.default_speed
            && self.default_speed > 0.0
            && self.default_speed <= self.max_speed
            && self.max_speed <= DAC_MAX_LEVEL)
        {
            return fail(format!(
                "speeds must satisfy 0 <= min_drive_level ({}) <= default_speed ({}) <= max_speed ({}) <= {DAC_MAX_LEVEL}, default_speed > 0",
                self.min_drive_level, self.default_speed, self.max_speed
            ));
        }

        if positive_duration(self.settle_timeout_s).is_none() {
            return fail(format!(
                "settle_timeout_s must be a positive number of seconds, got {}",
                self.settle_timeout_s
            ));
        }
        if let Some(t) = self.action_timeout_s {
            if positive_duration(t).is_none() {
                return fail(format!(
                    "action_timeout_s must be a positive number of seconds, got {t}"
                ));
            }
        }
        if !(self.vcc > 0.0 && self.stroke_in > 0.0) {
            return fail("vcc and stroke_in must be positive".to_string());
        }

        Ok(())
    }

    /// Soft monitoring thresholds, defaulted to the hard limits.
    pub fn thresholds(&self) -> (f64, f64) {
        (
            self.pos_threshold_low.unwrap_or(self.pos_limit_low),
            self.pos_threshold_high.unwrap_or(self.pos_limit_high),
        )
    }

    /// Whether a raw target lies inside the hard limits.
    pub fn within_limits(&self, position: f64) -> bool {
        (self.pos_limit_low..=self.pos_limit_high).contains(&position)
    }

    /// Volts per ADC level for the configured gain, clipped to the supply rail.
    pub fn adc_step_size(&self) -> f64 {
        let full_scale = pga_full_scale(self.adc_gain).unwrap_or(self.vcc);
        2.0 * full_scale.min(self.vcc) / ADC_LEVELS as f64
    }

    /// Actuator travel per ADC level, in inches.
    pub fn inches_per_level(&self) -> f64 {
        self.stroke_in / self.vcc * self.adc_step_size()
    }

    /// Midpoint of the hard limits.
    pub fn mid_position(&self) -> f64 {
        (self.pos_limit_low + self.pos_limit_high) / 2.0
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Settle timeout, falling back to the default for an unvalidated value.
    pub fn settle_timeout(&self) -> Duration {
        positive_duration(self.settle_timeout_s)
            .unwrap_or(Duration::from_secs(DEFAULT_SETTLE_TIMEOUT_S as u64))
    }

    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_s.and_then(positive_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    #[test]
    fn default_config_is_valid() {
        assert!(RigConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unaccepted_sample_rate() {
        let config = RigConfig {
            adc_sample_rate: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("adc_sample_rate")
        ));
    }

    #[test]
    fn rejects_unaccepted_gain_and_channel() {
        let config = RigConfig {
            adc_gain: 3.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RigConfig {
            adc_channel: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RigConfig {
            adc_gain: 2.0 / 3.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_limits() {
        let config = RigConfig {
            pos_limit_low: 20000.0,
            pos_limit_high: 10000.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_threshold_outside_limits() {
        let config = RigConfig {
            pos_threshold_high: Some(30000.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_kernel() {
        let config = RigConfig {
            kernel_size: MAX_KERNEL_SIZE + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_tolerance() {
        let config = RigConfig {
            tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_default_speed() {
        let config = RigConfig {
            default_speed: 0.0,
            min_drive_level: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_timeouts_too_large_for_a_duration() {
        let settle = RigConfig {
            settle_timeout_s: 1e20,
            ..Default::default()
        };
        assert!(settle.validate().is_err());

        let action = RigConfig {
            action_timeout_s: Some(1e20),
            ..Default::default()
        };
        assert!(action.validate().is_err());
        assert_eq!(action.action_timeout(), None);
    }

    #[test]
    fn timeout_accessors_never_panic() {
        let config = RigConfig {
            settle_timeout_s: f64::INFINITY,
            action_timeout_s: Some(f64::NAN),
            ..Default::default()
        };
        assert!(config.settle_timeout() > Duration::ZERO);
        assert_eq!(config.action_timeout(), None);
    }

    #[test]
    fn positive_duration_bounds() {
        assert_eq!(positive_duration(1.5), Some(Duration::from_millis(1500)));
        assert_eq!(positive_duration(0.0), None);
        assert_eq!(positive_duration(-2.0), None);
        assert_eq!(positive_duration(f64::NAN), None);
        assert_eq!(positive_duration(1e20), None);
    }

    #[test]
    fn step_size_clips_to_supply() {
        // Gain 1 reads ±4.096 V, but the pot only swings 3.3 V.
        let config = RigConfig::default();
        let expected = 2.0 * 3.3 / 65536.0;
        assert!((config.adc_step_size() - expected).abs() < 1e-12);
        assert!((config.inches_per_level() - 12.0 / 3.3 * expected).abs() < 1e-12);
    }

    #[test]
    fn parses_partial_block_with_defaults() {
        let config = RigConfig::parse("units = \"metric\"\npos_limit_low = 6000\n").unwrap();
        assert_eq!(config.units, UnitSystem::Metric);
        assert_eq!(config.pos_limit_low, 6000.0);
        assert_eq!(config.kernel_size, DEFAULT_KERNEL_SIZE);
        assert_eq!(config.thresholds(), (6000.0, DEFAULT_POS_LIMIT_HIGH));
    }

    #[test]
    fn rejects_unknown_key() {
        assert!(RigConfig::parse("upper_limit = 3\n").is_err());
    }
}
