//! `oscillate`: cycle between two positions.
//!
//! A cycle is `low_pos` then `high_pos`. The stop condition is checked
//! between cycles only, so a timeout never interrupts a move half way.

use super::{check_finite, check_positive, check_seconds, typed};
use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, ActionParams, Params, check_params};
use crate::status;
use rig_common::hal::config::positive_duration;
use rig_control::MotionError;
use rig_control::Rig;
use rig_control::control::feedback::ControllerSpec;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OscillateParams {
    pub low_pos: f64,
    pub high_pos: f64,
    /// Raw drive level for the whole oscillation.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub repetitions: Option<u32>,
    #[serde(default)]
    pub controller: Option<ControllerSpec>,
    /// Finish at whichever end is nearer.
    #[serde(default)]
    pub reset_closest: bool,
}

impl ActionParams for OscillateParams {
    fn validate(&self) -> Result<(), String> {
        check_finite("low_pos", self.low_pos)?;
        check_finite("high_pos", self.high_pos)?;
        if self.low_pos >= self.high_pos {
            return Err(format!(
                "low_pos ({}) must be below high_pos ({})",
                self.low_pos, self.high_pos
            ));
        }
        validate_common(self.speed, self.timeout, self.repetitions, self.controller.as_ref())
    }
}

pub(crate) fn validate_common(
    speed: Option<f64>,
    timeout: Option<f64>,
    repetitions: Option<u32>,
    controller: Option<&ControllerSpec>,
) -> Result<(), String> {
    if let Some(speed) = speed {
        check_positive("speed", speed)?;
    }
    if let Some(timeout) = timeout {
        check_seconds("timeout", timeout)?;
    }
    if repetitions == Some(0) {
        return Err("repetitions must be at least 1".into());
    }
    if let Some(spec) = controller {
        spec.validate()?;
    }
    Ok(())
}

/// When an oscillation stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CycleLimit {
    timeout: Option<Duration>,
    repetitions: Option<u32>,
}

impl CycleLimit {
    pub(crate) fn new(timeout_s: Option<f64>, repetitions: Option<u32>) -> Self {
        Self {
            timeout: timeout_s.and_then(positive_duration),
            repetitions,
        }
    }

    pub(crate) fn keep_going(&self, repeats: u32, elapsed: Duration) -> bool {
        self.repetitions.is_none_or(|n| repeats < n) && self.timeout.is_none_or(|t| elapsed < t)
    }

    /// Status reported after `repeats` completed cycles.
    pub(crate) fn status(&self, repeats: u32, reset: bool) -> &'static str {
        let by_repeats = self.repetitions.is_some_and(|n| repeats >= n);
        match (by_repeats, reset) {
            (true, false) => status::REPEATS_STOPPED,
            (true, true) => status::REPEATS_RESET,
            (false, false) => status::TIMEOUT_STOPPED,
            (false, true) => status::TIMEOUT_RESET,
        }
    }
}

/// Run `cycle` until `limit` says stop; returns the cycles completed.
///
/// The default speed and controller are set for the duration and restored
/// afterwards, whatever the outcome.
pub(crate) fn run_cycles<F>(
    ctx: &mut ActionContext<'_>,
    speed: Option<f64>,
    controller: Option<ControllerSpec>,
    limit: CycleLimit,
    mut cycle: F,
) -> Result<Result<u32, MotionError>, ActionFault>
where
    F: FnMut(&mut Rig) -> Result<(), MotionError>,
{
    let saved_speed = ctx.rig.default_speed();
    let outcome = cycle_loop(ctx.rig, speed, controller, limit, &mut cycle);
    ctx.rig.unmount_controller();
    ctx.rig.set_default_speed(saved_speed)?;
    Ok(outcome)
}

fn cycle_loop<F>(
    rig: &mut Rig,
    speed: Option<f64>,
    controller: Option<ControllerSpec>,
    limit: CycleLimit,
    cycle: &mut F,
) -> Result<u32, MotionError>
where
    F: FnMut(&mut Rig) -> Result<(), MotionError>,
{
    if let Some(speed) = speed {
        rig.set_default_speed(speed)?;
    }
    rig.mount_controller(controller.unwrap_or_default());

    let started = rig.now();
    let mut repeats = 0;
    while limit.keep_going(repeats, rig.now().saturating_sub(started)) {
        cycle(rig)?;
        repeats += 1;
        debug!(repeats, "cycle complete");
    }
    Ok(repeats)
}

/// Map a finished oscillation to its status.
pub(crate) fn finish(
    ctx: &mut ActionContext<'_>,
    outcome: Result<u32, MotionError>,
    status_of: impl FnOnce(u32) -> &'static str,
) -> Result<&'static str, ActionFault> {
    match outcome {
        Ok(repeats) => {
            let status = status_of(repeats);
            info!(routine = ctx.routine, action = ctx.action, repeats, status, "oscillation finished");
            Ok(status)
        }
        Err(e) if e.is_recoverable() => {
            warn!(routine = ctx.routine, action = ctx.action, "oscillation failed: {e}");
            ctx.rig.stop()?;
            Ok(status::ERROR)
        }
        Err(e) => Err(e.into()),
    }
}

fn run(ctx: &mut ActionContext<'_>, params: &Params) -> Result<&'static str, ActionFault> {
    let p: OscillateParams = typed(params)?;
    let (low, high) = (ctx.length(p.low_pos), ctx.length(p.high_pos));
    let limit = CycleLimit::new(p.timeout, p.repetitions);

    let cycles = run_cycles(ctx, p.speed, p.controller, limit, |rig| {
        rig.set_position(low, None)?;
        rig.set_position(high, None)?;
        Ok(())
    })?;
    let outcome = cycles.and_then(|repeats| {
        if p.reset_closest {
            let position = ctx.rig.position()?;
            let nearest = if (position - low).abs() <= (position - high).abs() {
                low
            } else {
                high
            };
            ctx.rig.set_position(nearest, None)?;
        }
        Ok(repeats)
    });
    finish(ctx, outcome, |repeats| limit.status(repeats, p.reset_closest))
}

pub const ENTRY: ActionEntry = ActionEntry {
    name: "oscillate",
    summary: "Cycle between `low_pos` and `high_pos` until `timeout` or `repetitions`.",
    statuses: &[
        status::TIMEOUT_STOPPED,
        status::REPEATS_STOPPED,
        status::TIMEOUT_RESET,
        status::REPEATS_RESET,
        status::ERROR,
    ],
    check: check_params::<OscillateParams>,
    run,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<OscillateParams, String> {
        crate::registry::parse_params(&toml::from_str(text).unwrap())
    }

    #[test]
    fn limit_counts_repetitions() {
        let limit = CycleLimit::new(None, Some(3));
        assert!(limit.keep_going(2, Duration::from_secs(1000)));
        assert!(!limit.keep_going(3, Duration::ZERO));
        assert_eq!(limit.status(3, false), status::REPEATS_STOPPED);
        assert_eq!(limit.status(3, true), status::REPEATS_RESET);
    }

    #[test]
    fn limit_checks_timeout_between_cycles() {
        let limit = CycleLimit::new(Some(2.0), Some(10));
        assert!(limit.keep_going(1, Duration::from_millis(1999)));
        assert!(!limit.keep_going(1, Duration::from_secs(2)));
        assert_eq!(limit.status(1, false), status::TIMEOUT_STOPPED);
        assert_eq!(limit.status(1, true), status::TIMEOUT_RESET);
    }

    #[test]
    fn unbounded_limit_runs_forever() {
        let limit = CycleLimit::new(None, None);
        assert!(limit.keep_going(u32::MAX - 1, Duration::from_secs(86_400)));
    }

    #[test]
    fn params_parse_controller() {
        let p = parse(
            "low_pos = 1.0\nhigh_pos = 2.0\nrepetitions = 4\n\
             controller = { kind = \"pi\", kp = 0.5, ki = 0.01 }",
        )
        .unwrap();
        assert_eq!(p.controller, Some(ControllerSpec::Pi { kp: 0.5, ki: 0.01 }));
        assert!(!p.reset_closest);
    }

    #[test]
    fn params_reject_inverted_range() {
        let err = parse("low_pos = 5.0\nhigh_pos = 2.0").unwrap_err();
        assert!(err.contains("below"));
        assert!(parse("low_pos = 1.0\nhigh_pos = 2.0\nrepetitions = 0").is_err());
        assert!(parse("low_pos = 1.0\nhigh_pos = 2.0\ntimeout = -1.0").is_err());
    }

    #[test]
    fn params_reject_timeout_too_large_for_a_duration() {
        let err = parse("low_pos = 1.0\nhigh_pos = 2.0\ntimeout = 1e20").unwrap_err();
        assert!(err.contains("timeout"));
        let limit = CycleLimit::new(Some(1e20), Some(2));
        assert!(limit.keep_going(1, Duration::from_secs(86_400)));
    }
}
