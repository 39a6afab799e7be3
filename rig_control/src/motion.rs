//! Closed-loop actuator position control.
//!
//! `set_position` walks `Idle → Seeking → Settled` on every call:
//!
//! 1. Fill the moving-average window with `kernel_size` valid samples.
//! 2. Already within tolerance: stop the drive and return.
//! 3. Otherwise pick the direction toward the target and start the drive.
//! 4. Poll one valid sample at a time, flipping the relay only when the
//!    filtered position crosses the target, until within tolerance.
//!
//! Every poll checks the cancel token, the action deadline and the settle
//! timeout. Every error exit stops the drive.

use crate::clock::Clock;
use crate::control::feedback::{ControllerSpec, FeedbackController};
use crate::control::filters::MovingAverage;
use crate::error::MotionError;
use crate::safety::CancelToken;
use rig_common::hal::config::RigConfig;
use rig_common::hal::driver::{ActuatorDriver, Direction, HalError};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Phase of the most recent motion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionPhase {
    #[default]
    Idle,
    Seeking,
    Settled,
}

/// One positioning request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTarget {
    /// Target position [raw levels].
    pub position: f64,
    /// Drive level; `None` uses the loop's default speed.
    pub speed: Option<f64>,
    /// Settled when `|filtered - position| < tolerance`.
    pub tolerance: f64,
}

impl MotionTarget {
    pub fn new(position: f64, tolerance: f64) -> Self {
        Self {
            position,
            speed: None,
            tolerance,
        }
    }

    pub fn with_speed(mut self, speed: Option<f64>) -> Self {
        self.speed = speed;
        self
    }
}

/// Statistics of one motion command.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionReport {
    pub target: f64,
    /// Filtered position when the command finished.
    pub final_position: f64,
    /// Raw reads taken, valid or not.
    pub samples: u32,
    /// Raw reads rejected as garbage.
    pub invalid_samples: u32,
    /// Relay writes that changed direction.
    pub direction_changes: u32,
    pub elapsed: Duration,
}

/// Loop tuning, taken from the rig configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    pub kernel_size: usize,
    pub min_valid_reading: f64,
    pub max_invalid_samples: u32,
    pub poll_period: Duration,
    pub settle_timeout: Duration,
    pub default_speed: f64,
    pub max_speed: f64,
    pub min_drive_level: f64,
    pub pos_limit_low: f64,
    pub pos_limit_high: f64,
}

impl From<&RigConfig> for LoopSettings {
    fn from(config: &RigConfig) -> Self {
        Self {
            kernel_size: config.kernel_size,
            min_valid_reading: config.min_valid_reading,
            max_invalid_samples: config.max_invalid_samples,
            poll_period: config.poll_period(),
            settle_timeout: config.settle_timeout(),
            default_speed: config.default_speed,
            max_speed: config.max_speed,
            min_drive_level: config.min_drive_level,
            pos_limit_low: config.pos_limit_low,
            pos_limit_high: config.pos_limit_high,
        }
    }
}

/// Hardware and timing collaborators borrowed for one command.
pub struct MotionIo<'a> {
    pub driver: &'a mut dyn ActuatorDriver,
    pub clock: &'a dyn Clock,
    pub cancel: &'a CancelToken,
    /// Absolute clock time at which the enclosing action expires.
    pub deadline: Option<Duration>,
}

/// Position control loop state.
#[derive(Debug, Clone)]
pub struct PositionLoop {
    settings: LoopSettings,
    filter: MovingAverage,
    phase: MotionPhase,
    controller: Option<FeedbackController>,
}

impl PositionLoop {
    pub fn new(settings: LoopSettings) -> Self {
        Self {
            filter: MovingAverage::new(settings.kernel_size),
            settings,
            phase: MotionPhase::Idle,
            controller: None,
        }
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    pub fn default_speed(&self) -> f64 {
        self.settings.default_speed
    }

    /// Change the speed used when a target carries none.
    pub fn set_default_speed(&mut self, level: f64) -> Result<(), MotionError> {
        self.settings.default_speed = self.check_speed(Some(level))?;
        Ok(())
    }

    /// Mount a feedback law that scales the drive level while seeking.
    pub fn mount_controller(&mut self, spec: ControllerSpec) {
        self.controller = match spec {
            ControllerSpec::None => None,
            spec => Some(FeedbackController::new(spec)),
        };
    }

    pub fn unmount_controller(&mut self) {
        self.controller = None;
    }

    pub fn controller(&self) -> Option<&FeedbackController> {
        self.controller.as_ref()
    }

    /// Drive to `target` and stop there.
    pub fn set_position(
        &mut self,
        io: &mut MotionIo<'_>,
        target: MotionTarget,
    ) -> Result<MotionReport, MotionError> {
        let (low, high) = (self.settings.pos_limit_low, self.settings.pos_limit_high);
        if !(low..=high).contains(&target.position) {
            return Err(MotionError::OutOfLimits {
                target: target.position,
                low,
                high,
            });
        }
        let speed = self.check_speed(target.speed)?;

        let started = io.clock.now();
        let mut report = MotionReport {
            target: target.position,
            ..Default::default()
        };
        self.phase = MotionPhase::Idle;
        self.filter.clear();
        if let Some(controller) = self.controller.as_mut() {
            controller.reset();
        }

        let result = self.seek_position(io, &target, speed, started, &mut report);
        report.elapsed = io.clock.now().saturating_sub(started);
        match result {
            Ok(()) => {
                debug!(
                    target = target.position,
                    position = report.final_position,
                    samples = report.samples,
                    invalid = report.invalid_samples,
                    flips = report.direction_changes,
                    "position settled"
                );
                Ok(report)
            }
            Err(e) => {
                self.abort(io.driver, &e);
                Err(e)
            }
        }
    }

    /// Drive forward until the load cell reports at least `min_force`.
    ///
    /// Returns the filtered position where the load was reached.
    pub fn seek_load(
        &mut self,
        io: &mut MotionIo<'_>,
        min_force: f64,
        speed: Option<f64>,
    ) -> Result<f64, MotionError> {
        let speed = self.check_speed(speed)?;
        let started = io.clock.now();
        let mut report = MotionReport::default();
        self.phase = MotionPhase::Idle;
        self.filter.clear();

        match self.seek_force(io, min_force, speed, started, &mut report) {
            Ok(position) => {
                debug!(min_force, position, samples = report.samples, "load reached");
                Ok(position)
            }
            Err(e) => {
                self.abort(io.driver, &e);
                Err(e)
            }
        }
    }

    /// Fresh filtered position: mean of `kernel_size` new valid samples.
    pub fn filtered_position(&mut self, io: &mut MotionIo<'_>) -> Result<f64, MotionError> {
        let mut report = MotionReport::default();
        self.filter.clear();
        self.fill(io, &mut report)?;
        Ok(self.filtered())
    }

    // ── Seeking ─────────────────────────────────────────────────

    fn seek_position(
        &mut self,
        io: &mut MotionIo<'_>,
        target: &MotionTarget,
        speed: f64,
        started: Duration,
        report: &mut MotionReport,
    ) -> Result<(), MotionError> {
        self.fill(io, report)?;
        let mut position = self.filtered();
        if (position - target.position).abs() < target.tolerance {
            io.driver.stop()?;
            self.settle(position, report);
            return Ok(());
        }

        let initial = if position >= target.position {
            Direction::Backward
        } else {
            Direction::Forward
        };
        let previous = io.driver.direction();
        io.driver.set_direction(initial)?;
        if previous != initial {
            report.direction_changes += 1;
        }
        io.driver.set_speed_level(speed)?;
        self.phase = MotionPhase::Seeking;
        debug!(target = target.position, position, direction = %initial, speed, "seeking");

        loop {
            self.check_progress(io, started, target.position, position)?;
            io.clock.sleep(self.settings.poll_period);
            self.acquire(io, report)?;
            position = self.filtered();

            if (position - target.position).abs() < target.tolerance {
                io.driver.stop()?;
                self.settle(position, report);
                return Ok(());
            }

            if position > target.position {
                Self::steer(io.driver, Direction::Backward, report)?;
            } else if position < target.position {
                Self::steer(io.driver, Direction::Forward, report)?;
            }

            let now = io.clock.now();
            if let Some(level) = self.modulate(now, target.position, position, speed) {
                if (level - io.driver.speed_level()).abs() > f64::EPSILON {
                    io.driver.set_speed_level(level)?;
                }
            }
        }
    }

    fn seek_force(
        &mut self,
        io: &mut MotionIo<'_>,
        min_force: f64,
        speed: f64,
        started: Duration,
        report: &mut MotionReport,
    ) -> Result<f64, MotionError> {
        self.fill(io, report)?;
        let mut position = self.filtered();
        if io.driver.read_load()?.force >= min_force {
            io.driver.stop()?;
            self.settle(position, report);
            return Ok(position);
        }

        io.driver.set_direction(Direction::Forward)?;
        io.driver.set_speed_level(speed)?;
        self.phase = MotionPhase::Seeking;
        debug!(min_force, position, speed, "seeking load");

        loop {
            self.check_progress(io, started, min_force, position)?;
            io.clock.sleep(self.settings.poll_period);
            self.acquire(io, report)?;
            position = self.filtered();

            if io.driver.read_load()?.force >= min_force {
                io.driver.stop()?;
                self.settle(position, report);
                return Ok(position);
            }
            if position >= self.settings.pos_limit_high {
                return Err(MotionError::LimitReached {
                    position,
                    min_force,
                });
            }
        }
    }

    /// Write the relay only when it is not already in `direction`.
    fn steer(
        driver: &mut dyn ActuatorDriver,
        direction: Direction,
        report: &mut MotionReport,
    ) -> Result<(), HalError> {
        if driver.direction() != direction {
            driver.set_direction(direction)?;
            report.direction_changes += 1;
            trace!(%direction, "relay flipped");
        }
        Ok(())
    }

    /// Drive level from the mounted controller, `None` to keep the current one.
    fn modulate(&mut self, now: Duration, target: f64, position: f64, speed: f64) -> Option<f64> {
        let controller = self.controller.as_mut()?;
        let correction = controller.update(target, position, now.as_secs_f64());
        if !correction.is_finite() {
            return Some(speed);
        }
        let floor = self.settings.min_drive_level.min(speed);
        Some(correction.abs().clamp(floor, speed))
    }

    // ── Sampling ────────────────────────────────────────────────

    fn fill(&mut self, io: &mut MotionIo<'_>, report: &mut MotionReport) -> Result<(), MotionError> {
        while !self.filter.is_full() {
            self.acquire(io, report)?;
        }
        Ok(())
    }

    /// Push one valid sample, skipping up to `max_invalid_samples` garbage reads.
    fn acquire(&mut self, io: &mut MotionIo<'_>, report: &mut MotionReport) -> Result<(), MotionError> {
        for _ in 0..self.settings.max_invalid_samples {
            if io.cancel.is_cancelled() {
                return Err(MotionError::Cancelled);
            }
            let raw = io.driver.read_position_raw()?;
            report.samples += 1;
            if raw > self.settings.min_valid_reading {
                self.filter.push(raw);
                return Ok(());
            }
            report.invalid_samples += 1;
            trace!(raw, "discarded position reading");
        }
        Err(MotionError::NoValidSample {
            attempts: self.settings.max_invalid_samples,
        })
    }

    #[inline]
    fn filtered(&self) -> f64 {
        self.filter.mean().unwrap_or(0.0)
    }

    // ── Guards ──────────────────────────────────────────────────

    fn check_speed(&self, speed: Option<f64>) -> Result<f64, MotionError> {
        let level = speed.unwrap_or(self.settings.default_speed);
        if level.is_finite() && level > 0.0 && level <= self.settings.max_speed {
            Ok(level)
        } else {
            Err(MotionError::InvalidSpeed {
                level,
                max: self.settings.max_speed,
            })
        }
    }

    fn check_progress(
        &self,
        io: &MotionIo<'_>,
        started: Duration,
        target: f64,
        position: f64,
    ) -> Result<(), MotionError> {
        if io.cancel.is_cancelled() {
            return Err(MotionError::Cancelled);
        }
        let now = io.clock.now();
        if io.deadline.is_some_and(|deadline| now >= deadline) {
            return Err(MotionError::DeadlineExpired { position });
        }
        if now.saturating_sub(started) >= self.settings.settle_timeout {
            return Err(MotionError::SettleTimeout {
                target,
                position,
                timeout: self.settings.settle_timeout,
            });
        }
        Ok(())
    }

    fn settle(&mut self, position: f64, report: &mut MotionReport) {
        self.phase = MotionPhase::Settled;
        report.final_position = position;
    }

    fn abort(&mut self, driver: &mut dyn ActuatorDriver, cause: &MotionError) {
        self.phase = MotionPhase::Idle;
        warn!("motion aborted: {cause}");
        if let Err(e) = driver.stop() {
            warn!("failed to stop drive after motion error: {e}");
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rig_common::hal::driver::LoadReading;

    /// Actuator that moves `speed * gain` levels per position read.
    struct FakeActuator {
        position: f64,
        direction: Direction,
        speed: f64,
        gain: f64,
        garbage_every: Option<u64>,
        reads: u64,
        contact_at: f64,
        levels: Vec<f64>,
    }

    impl FakeActuator {
        fn at(position: f64) -> Self {
            Self {
                position,
                direction: Direction::Forward,
                speed: 0.0,
                gain: 0.001,
                garbage_every: None,
                reads: 0,
                contact_at: f64::MAX,
                levels: Vec::new(),
            }
        }
    }

    impl ActuatorDriver for FakeActuator {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn version(&self) -> &'static str {
            "0.0.0"
        }

        fn init(&mut self, _config: &RigConfig) -> Result<(), HalError> {
            Ok(())
        }

        fn read_position_raw(&mut self) -> Result<f64, HalError> {
            self.reads += 1;
            let step = self.speed * self.gain;
            match self.direction {
                Direction::Forward => self.position += step,
                Direction::Backward => self.position -= step,
            }
            if self.garbage_every.is_some_and(|n| self.reads % n == 0) {
                return Ok(3.0);
            }
            Ok(self.position)
        }

        fn set_direction(&mut self, direction: Direction) -> Result<(), HalError> {
            self.direction = direction;
            Ok(())
        }

        fn direction(&self) -> Direction {
            self.direction
        }

        fn set_speed_level(&mut self, level: f64) -> Result<(), HalError> {
            self.speed = level;
            self.levels.push(level);
            Ok(())
        }

        fn speed_level(&self) -> f64 {
            self.speed
        }

        fn read_load(&mut self) -> Result<LoadReading, HalError> {
            Ok(LoadReading {
                force: ((self.position - self.contact_at) * 0.1).max(0.0),
                ..Default::default()
            })
        }

        fn release(&mut self) -> Result<(), HalError> {
            self.stop()
        }
    }

    fn settings() -> LoopSettings {
        LoopSettings {
            settle_timeout: Duration::from_secs(5),
            ..LoopSettings::from(&RigConfig::default())
        }
    }

    fn run(
        pl: &mut PositionLoop,
        drv: &mut FakeActuator,
        clock: &ManualClock,
        cancel: &CancelToken,
        target: f64,
    ) -> Result<MotionReport, MotionError> {
        let mut io = MotionIo {
            driver: drv,
            clock,
            cancel,
            deadline: None,
        };
        pl.set_position(&mut io, MotionTarget::new(target, 5.0))
    }

    #[test]
    fn at_target_stops_without_flipping() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(15000.0);
        drv.speed = 1.0;
        drv.gain = 0.0;
        let clock = ManualClock::with_tick(Duration::from_millis(1));

        let report = run(&mut pl, &mut drv, &clock, &CancelToken::new(), 15000.0).unwrap();
        assert_eq!(drv.speed, 0.0);
        assert_eq!(report.direction_changes, 0);
        assert_eq!(pl.phase(), MotionPhase::Settled);
    }

    #[test]
    fn approaches_from_above_with_single_flip() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(16000.0);
        let clock = ManualClock::with_tick(Duration::from_millis(1));

        let report = run(&mut pl, &mut drv, &clock, &CancelToken::new(), 15000.0).unwrap();
        assert_eq!(report.direction_changes, 1);
        assert_eq!(drv.direction, Direction::Backward);
        assert!((report.final_position - 15000.0).abs() < 5.0);
        assert_eq!(drv.speed, 0.0);
    }

    #[test]
    fn approaches_from_below_without_flip() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(9000.0);
        let clock = ManualClock::with_tick(Duration::from_millis(1));

        let report = run(&mut pl, &mut drv, &clock, &CancelToken::new(), 10000.0).unwrap();
        assert_eq!(report.direction_changes, 0);
        assert!((report.final_position - 10000.0).abs() < 5.0);
    }

    #[test]
    fn garbage_readings_are_skipped() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(12000.0);
        drv.garbage_every = Some(3);
        let clock = ManualClock::with_tick(Duration::from_millis(1));

        let report = run(&mut pl, &mut drv, &clock, &CancelToken::new(), 12500.0).unwrap();
        assert!(report.invalid_samples > 0);
        assert!((report.final_position - 12500.0).abs() < 5.0);
    }

    #[test]
    fn all_garbage_fails_and_leaves_drive_stopped() {
        let mut pl = PositionLoop::new(LoopSettings {
            max_invalid_samples: 20,
            ..settings()
        });
        let mut drv = FakeActuator::at(12000.0);
        drv.garbage_every = Some(1);
        let clock = ManualClock::new();

        let err = run(&mut pl, &mut drv, &clock, &CancelToken::new(), 15000.0).unwrap_err();
        assert_eq!(err, MotionError::NoValidSample { attempts: 20 });
        assert_eq!(drv.speed, 0.0);
        assert_eq!(pl.phase(), MotionPhase::Idle);
    }

    #[test]
    fn stuck_actuator_times_out() {
        let mut pl = PositionLoop::new(LoopSettings {
            settle_timeout: Duration::from_millis(500),
            ..settings()
        });
        let mut drv = FakeActuator::at(12000.0);
        drv.gain = 0.0;
        let clock = ManualClock::with_tick(Duration::from_millis(1));

        let err = run(&mut pl, &mut drv, &clock, &CancelToken::new(), 15000.0).unwrap_err();
        assert!(matches!(err, MotionError::SettleTimeout { target, .. } if target == 15000.0));
        assert!(err.is_recoverable());
        assert_eq!(drv.speed, 0.0);
    }

    #[test]
    fn cancel_token_stops_motion() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(12000.0);
        let clock = ManualClock::with_tick(Duration::from_millis(1));
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = run(&mut pl, &mut drv, &clock, &cancel, 15000.0).unwrap_err();
        assert_eq!(err, MotionError::Cancelled);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn expired_action_deadline_aborts() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(12000.0);
        let clock = ManualClock::with_tick(Duration::from_millis(1));
        let cancel = CancelToken::new();
        let mut io = MotionIo {
            driver: &mut drv,
            clock: &clock,
            cancel: &cancel,
            deadline: Some(Duration::ZERO),
        };

        let err = pl
            .set_position(&mut io, MotionTarget::new(15000.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, MotionError::DeadlineExpired { .. }));
        assert_eq!(drv.speed, 0.0);
    }

    #[test]
    fn target_outside_limits_rejected_before_moving() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(12000.0);
        let clock = ManualClock::new();

        let err = run(&mut pl, &mut drv, &clock, &CancelToken::new(), 30000.0).unwrap_err();
        assert!(matches!(err, MotionError::OutOfLimits { .. }));
        assert_eq!(drv.reads, 0);
    }

    #[test]
    fn zero_speed_rejected() {
        let mut pl = PositionLoop::new(settings());
        assert!(matches!(
            pl.set_default_speed(0.0),
            Err(MotionError::InvalidSpeed { .. })
        ));
        pl.set_default_speed(1000.0).unwrap();
        assert_eq!(pl.default_speed(), 1000.0);
    }

    #[test]
    fn controller_scales_drive_level() {
        let mut pl = PositionLoop::new(settings());
        pl.mount_controller(ControllerSpec::P { kp: 1.0 });
        let mut drv = FakeActuator::at(9000.0);
        let clock = ManualClock::with_tick(Duration::from_millis(1));

        run(&mut pl, &mut drv, &clock, &CancelToken::new(), 9500.0).unwrap();
        let min_drive = settings().min_drive_level;
        assert!(drv.levels.iter().any(|&l| l < 2048.0 && l >= min_drive));
        assert!(drv.levels.iter().all(|&l| l <= 2048.0));
    }

    #[test]
    fn none_controller_unmounts() {
        let mut pl = PositionLoop::new(settings());
        pl.mount_controller(ControllerSpec::Pi { kp: 1.0, ki: 0.0 });
        assert!(pl.controller().is_some());
        pl.mount_controller(ControllerSpec::None);
        assert!(pl.controller().is_none());
    }

    #[test]
    fn seek_load_stops_at_contact() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(15000.0);
        drv.contact_at = 16000.0;
        let clock = ManualClock::with_tick(Duration::from_millis(1));
        let cancel = CancelToken::new();
        let mut io = MotionIo {
            driver: &mut drv,
            clock: &clock,
            cancel: &cancel,
            deadline: None,
        };

        let reached = pl.seek_load(&mut io, 20.0, None).unwrap();
        assert!(reached > 16000.0);
        assert_eq!(drv.speed, 0.0);
        assert!(drv.read_load().unwrap().force >= 20.0);
    }

    #[test]
    fn seek_load_gives_up_at_limit() {
        let mut pl = PositionLoop::new(settings());
        let mut drv = FakeActuator::at(25900.0);
        let clock = ManualClock::with_tick(Duration::from_millis(1));
        let cancel = CancelToken::new();
        let mut io = MotionIo {
            driver: &mut drv,
            clock: &clock,
            cancel: &cancel,
            deadline: None,
        };

        let err = pl.seek_load(&mut io, 50.0, None).unwrap_err();
        assert!(matches!(err, MotionError::LimitReached { .. }));
        assert_eq!(drv.speed, 0.0);
    }
}
