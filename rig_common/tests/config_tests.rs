//! Rig configuration loading tests.
//!
//! Loads `[config]` blocks from disk through `ConfigLoader`, then runs
//! validation: accepted converter settings, limit ordering, defaults.

use rig_common::config::{ConfigError, ConfigLoader, SharedConfig};
use rig_common::hal::config::RigConfig;
use rig_common::units::UnitSystem;
use serde::Deserialize;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    shared: SharedConfig,
    config: RigConfig,
}

fn write_file(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("rig.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn full_block_loads_and_validates() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        r#"
[shared]
log_level = "debug"
station_name = "bench-2"

[config]
version = 1
units = "imperial"
pos_limit_low = 5500
pos_limit_high = 25000
pos_threshold_low = 6000
pos_threshold_high = 24000
adc_sample_rate = 860
adc_gain = 2
adc_channel = 0
poll_period_ms = 2
tolerance = 8.0
kernel_size = 7
settle_timeout_s = 30.0
action_timeout_s = 300.0
"#,
    );

    let file = ConfigFile::load(&path).unwrap();
    file.shared.validate().unwrap();
    file.config.validate().unwrap();

    assert_eq!(file.shared.station_name, "bench-2");
    assert_eq!(file.config.units, UnitSystem::Imperial);
    assert_eq!(file.config.kernel_size, 7);
    assert_eq!(file.config.thresholds(), (6000.0, 24000.0));
    assert_eq!(file.config.poll_period().as_millis(), 2);
    assert_eq!(file.config.action_timeout().unwrap().as_secs(), 300);
}

#[test]
fn minimal_block_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "[config]\n");

    let file = ConfigFile::load(&path).unwrap();
    assert_eq!(file.shared, SharedConfig::default());
    assert_eq!(file.config, RigConfig::default());
    assert!(file.config.validate().is_ok());
}

#[test]
fn bad_sample_rate_fails_validation_not_parsing() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "[config]\nadc_sample_rate = 100\n");

    let file = ConfigFile::load(&path).unwrap();
    assert!(matches!(
        file.config.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn unknown_units_fail_parsing() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "[config]\nunits = \"furlongs\"\n");

    assert!(matches!(
        ConfigFile::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn unknown_table_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "[config]\n\n[calibration]\nscale = 2\n");

    assert!(matches!(
        ConfigFile::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let result = ConfigFile::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}
