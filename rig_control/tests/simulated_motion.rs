//! Motion control against the simulation driver.
//!
//! Covers garbage-tolerant filtering, relay hysteresis, controller-scaled
//! approach and the contact search used by force oscillation.

use rig_common::hal::config::RigConfig;
use rig_common::hal::driver::Direction;
use rig_control::clock::ManualClock;
use rig_control::control::feedback::ControllerSpec;
use rig_control::safety::CancelToken;
use rig_control::{MotionError, Rig};
use rig_hal::DriverRegistry;
use rig_hal::drivers::simulation::{SimulatedActuator, SimulationSettings};
use std::time::Duration;

fn sim_rig(settings: SimulationSettings, config: RigConfig) -> Rig {
    let clock = ManualClock::with_tick(Duration::from_millis(1));
    Rig::new(
        config,
        Box::new(SimulatedActuator::with_settings(settings)),
        Box::new(clock),
        CancelToken::new(),
    )
    .unwrap()
}

#[test]
fn registry_driver_reaches_target() {
    let registry = DriverRegistry::with_builtin_drivers();
    let driver = registry.create("simulation").unwrap();
    let mut rig = Rig::new(
        RigConfig::default(),
        driver,
        Box::new(ManualClock::with_tick(Duration::from_millis(1))),
        CancelToken::new(),
    )
    .unwrap();

    let report = rig.set_position(18000.0, None).unwrap();
    assert!((report.final_position - 18000.0).abs() < 5.0);
    assert!(report.invalid_samples > 0, "default simulator injects garbage");
    assert_eq!(rig.speed(), 0.0);

    let diag = rig.diagnostics().unwrap();
    assert_eq!(diag.invalid_reads, u64::from(report.invalid_samples));
}

#[test]
fn round_trip_flips_once_per_side() {
    let mut rig = sim_rig(SimulationSettings::default(), RigConfig::default());

    let up = rig.set_position(17000.0, None).unwrap();
    assert_eq!(up.direction_changes, 0);
    assert_eq!(rig.direction(), Direction::Forward);

    let down = rig.set_position(14000.0, None).unwrap();
    assert_eq!(down.direction_changes, 1);
    assert_eq!(rig.direction(), Direction::Backward);
}

#[test]
fn already_at_target_does_not_touch_relay() {
    let mut rig = sim_rig(
        SimulationSettings {
            start_position: Some(12000.0),
            garbage_every: None,
            ..Default::default()
        },
        RigConfig::default(),
    );
    let before = rig.diagnostics().unwrap().direction_changes;

    let report = rig.set_position(12002.0, Some(1500.0)).unwrap();
    assert_eq!(report.direction_changes, 0);
    assert_eq!(rig.diagnostics().unwrap().direction_changes, before);
    assert_eq!(rig.speed(), 0.0);
}

#[test]
fn pid_controller_still_settles() {
    let mut rig = sim_rig(SimulationSettings::default(), RigConfig::default());
    rig.mount_controller(ControllerSpec::Pid {
        kp: 2.0,
        ki: 0.0,
        kd: 0.0,
    });

    let report = rig.set_position(16500.0, Some(3000.0)).unwrap();
    assert!((report.final_position - 16500.0).abs() < 5.0);
}

#[test]
fn seek_load_stops_on_spring() {
    let mut rig = sim_rig(
        SimulationSettings {
            garbage_every: None,
            ..Default::default()
        },
        RigConfig::default(),
    );

    let reached = rig.seek_load(25.0, Some(3000.0)).unwrap();
    assert!(reached > 20000.0);
    assert!(rig.load().unwrap().force >= 25.0);
    assert_eq!(rig.speed(), 0.0);
}

#[test]
fn short_settle_timeout_is_recoverable() {
    let config = RigConfig {
        settle_timeout_s: 0.05,
        ..Default::default()
    };
    let mut rig = sim_rig(SimulationSettings::default(), config);

    let err = rig.set_position(25000.0, None).unwrap_err();
    assert!(matches!(err, MotionError::SettleTimeout { .. }));
    assert!(err.is_recoverable());
    assert_eq!(rig.speed(), 0.0);
}

#[test]
fn interrupt_is_unrecoverable() {
    let mut rig = sim_rig(SimulationSettings::default(), RigConfig::default());
    rig.cancel_token().cancel();

    let err = rig.reset_min().unwrap_err();
    assert_eq!(err, MotionError::Cancelled);
    assert!(!err.is_recoverable());
    rig.shutdown().unwrap();
    assert_eq!(rig.speed(), 0.0);
}
