//! The rig context.
//!
//! `Rig` exclusively owns the actuator driver, the clock, the cancel token
//! and the position loop. Procedure actions receive `&mut Rig` and reach the
//! hardware only through it.

use crate::clock::Clock;
use crate::control::feedback::ControllerSpec;
use crate::error::MotionError;
use crate::motion::{LoopSettings, MotionIo, MotionReport, MotionTarget, PositionLoop};
use crate::safety::{CancelToken, safe_stop};
use rig_common::hal::config::RigConfig;
use rig_common::hal::driver::{ActuatorDriver, Direction, DriverDiagnostics, HalError, LoadReading};
use rig_common::telemetry::TelemetrySample;
use rig_common::units::{ForceUnit, LengthUnit};
use std::time::Duration;
use tracing::{debug, info};

pub struct Rig {
    config: RigConfig,
    driver: Box<dyn ActuatorDriver>,
    clock: Box<dyn Clock>,
    cancel: CancelToken,
    motion: PositionLoop,
    /// Absolute clock time at which the running action expires.
    action_deadline: Option<Duration>,
    /// Last filtered position an action observed.
    last_position: Option<f64>,
    last_load: Option<LoadReading>,
}

impl Rig {
    /// Initialise `driver` with `config` and take ownership of it.
    pub fn new(
        config: RigConfig,
        mut driver: Box<dyn ActuatorDriver>,
        clock: Box<dyn Clock>,
        cancel: CancelToken,
    ) -> Result<Self, HalError> {
        driver.init(&config)?;
        info!(
            driver = driver.name(),
            version = driver.version(),
            limits = ?(config.pos_limit_low, config.pos_limit_high),
            "rig ready"
        );
        Ok(Self {
            motion: PositionLoop::new(LoopSettings::from(&config)),
            config,
            driver,
            clock,
            cancel,
            action_deadline: None,
            last_position: None,
            last_load: None,
        })
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    pub fn diagnostics(&self) -> Option<DriverDiagnostics> {
        self.driver.diagnostics()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Time on the rig clock.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    // ── Motion ──────────────────────────────────────────────────

    /// Drive to a raw `position` with the configured tolerance.
    pub fn set_position(
        &mut self,
        position: f64,
        speed: Option<f64>,
    ) -> Result<MotionReport, MotionError> {
        let target = MotionTarget::new(position, self.config.tolerance).with_speed(speed);
        self.move_to(target)
    }

    pub fn move_to(&mut self, target: MotionTarget) -> Result<MotionReport, MotionError> {
        let mut io = MotionIo {
            driver: self.driver.as_mut(),
            clock: self.clock.as_ref(),
            cancel: &self.cancel,
            deadline: self.action_deadline,
        };
        let report = self.motion.set_position(&mut io, target)?;
        self.last_position = Some(report.final_position);
        Ok(report)
    }

    /// Drive to the lower hard limit.
    pub fn reset_min(&mut self) -> Result<MotionReport, MotionError> {
        self.set_position(self.config.pos_limit_low, None)
    }

    /// Drive to the upper hard limit.
    pub fn reset_max(&mut self) -> Result<MotionReport, MotionError> {
        self.set_position(self.config.pos_limit_high, None)
    }

    /// Drive forward until `min_force` is felt; returns the position reached.
    pub fn seek_load(&mut self, min_force: f64, speed: Option<f64>) -> Result<f64, MotionError> {
        let mut io = MotionIo {
            driver: self.driver.as_mut(),
            clock: self.clock.as_ref(),
            cancel: &self.cancel,
            deadline: self.action_deadline,
        };
        let reached = self.motion.seek_load(&mut io, min_force, speed)?;
        self.last_position = Some(reached);
        Ok(reached)
    }

    pub fn default_speed(&self) -> f64 {
        self.motion.default_speed()
    }

    pub fn set_default_speed(&mut self, level: f64) -> Result<(), MotionError> {
        self.motion.set_default_speed(level)
    }

    pub fn mount_controller(&mut self, spec: ControllerSpec) {
        debug!(kind = spec.kind(), "controller mounted");
        self.motion.mount_controller(spec);
    }

    pub fn unmount_controller(&mut self) {
        self.motion.unmount_controller();
    }

    /// Arm the deadline of the next action.
    ///
    /// `timeout` overrides the configured `action_timeout_s`; with neither
    /// the action is unbounded. A deadline past the clock's range is
    /// treated as unbounded.
    pub fn begin_action(&mut self, timeout: Option<Duration>) {
        self.action_deadline = timeout
            .or_else(|| self.config.action_timeout())
            .and_then(|t| self.clock.now().checked_add(t));
    }

    pub fn end_action(&mut self) {
        self.action_deadline = None;
    }

    pub fn action_deadline(&self) -> Option<Duration> {
        self.action_deadline
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Filtered position from fresh samples.
    pub fn position(&mut self) -> Result<f64, MotionError> {
        let mut io = MotionIo {
            driver: self.driver.as_mut(),
            clock: self.clock.as_ref(),
            cancel: &self.cancel,
            deadline: None,
        };
        let position = self.motion.filtered_position(&mut io)?;
        self.last_position = Some(position);
        Ok(position)
    }

    pub fn speed(&self) -> f64 {
        self.driver.speed_level()
    }

    pub fn direction(&self) -> Direction {
        self.driver.direction()
    }

    pub fn load(&mut self) -> Result<LoadReading, HalError> {
        let reading = self.driver.read_load()?;
        self.last_load = Some(reading);
        Ok(reading)
    }

    /// Last observed state, for logging between actions.
    ///
    /// Built from what earlier reads and moves left behind; no sensor is
    /// sampled. `None` until some action has observed the position.
    pub fn telemetry(&self) -> Option<TelemetrySample> {
        Some(TelemetrySample {
            timestamp_s: self.now().as_secs_f64(),
            position: self.last_position?,
            speed: self.speed(),
            load: self.last_load,
        })
    }

    // ── Units ───────────────────────────────────────────────────

    pub fn length_to_raw(&self, unit: LengthUnit, value: f64) -> f64 {
        unit.to_raw(value, self.config.inches_per_level())
    }

    pub fn force_to_raw(&self, unit: ForceUnit, value: f64) -> f64 {
        unit.to_raw(value)
    }

    // ── Shutdown ────────────────────────────────────────────────

    pub fn stop(&mut self) -> Result<(), HalError> {
        self.driver.stop()
    }

    /// Stop the drive and release the driver lines.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        self.action_deadline = None;
        safe_stop(self.driver.as_mut())
    }
}
