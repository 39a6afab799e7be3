//! HAL (Hardware Abstraction Layer) constants.
//!
//! Electrical and converter constants of the rig's position ADC (ADS1115
//! class, 16 bit) and speed DAC (MCP4725 class, 12 bit).

/// Supply rail feeding the position potentiometer, in volts.
pub const GLOBAL_VCC: f64 = 3.3;

/// Actuator stroke length in inches.
pub const STROKE_IN: f64 = 12.0;

/// ADC resolution in bits.
pub const ADC_BITS: u32 = 16;

/// Number of discrete ADC levels.
pub const ADC_LEVELS: u32 = 1 << ADC_BITS;

/// Highest positive ADC reading.
pub const ADC_MAX_LEVEL: i32 = (ADC_LEVELS as i32 >> 1) - 1;

/// Accepted ADC sample rates in samples per second.
pub const ADC_SAMPLE_RATES: [u16; 8] = [8, 16, 32, 64, 128, 250, 475, 860];

/// Accepted PGA gains and the full-scale voltage each one reads.
pub const ADC_PGA_MAP: [(f64, f64); 6] = [
    (2.0 / 3.0, 6.144),
    (1.0, 4.096),
    (2.0, 2.048),
    (4.0, 1.024),
    (8.0, 0.512),
    (16.0, 0.256),
];

/// Highest ADC input channel.
pub const ADC_MAX_CHANNEL: u8 = 3;

/// DAC resolution in bits.
pub const DAC_BITS: u32 = 12;

/// Number of discrete DAC levels.
pub const DAC_LEVELS: u32 = 1 << DAC_BITS;

/// Highest DAC output level (full speed).
pub const DAC_MAX_LEVEL: f64 = (DAC_LEVELS - 1) as f64;

/// DAC level that stops the drive.
pub const DAC_STOP: f64 = 0.0;

/// Default drive level: half speed.
pub const DEFAULT_SPEED_LEVEL: f64 = (DAC_LEVELS >> 1) as f64;

/// Full-scale voltage for a PGA gain, or `None` if the gain is not accepted.
pub fn pga_full_scale(gain: f64) -> Option<f64> {
    ADC_PGA_MAP
        .iter()
        .find(|(g, _)| (g - gain).abs() < 1e-9)
        .map(|(_, volts)| *volts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pga_lookup_accepts_fractional_gain() {
        assert_eq!(pga_full_scale(2.0 / 3.0), Some(6.144));
        assert_eq!(pga_full_scale(1.0), Some(4.096));
        assert_eq!(pga_full_scale(3.0), None);
    }

    #[test]
    fn converter_ranges() {
        assert_eq!(ADC_MAX_LEVEL, 32767);
        assert_eq!(DAC_MAX_LEVEL, 4095.0);
        assert_eq!(DEFAULT_SPEED_LEVEL, 2048.0);
    }
}
