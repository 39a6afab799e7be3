//! Built-in actions.
//!
//! Every action is an [`ActionEntry`]: a name, a closed status vocabulary,
//! a load-time parameter checker and a body that drives the rig.
//!
//! Recoverable motion failures (timeouts, garbage sensor, limits) become
//! the `"error"` status. Cancellation and HAL faults are raised.

pub mod cleanup;
pub mod oscillate;
pub mod oscillate_force;
pub mod position_lut;
pub mod reserved;
pub mod reset;
pub mod set_pos;

use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, ActionParams, Params, parse_params};
use rig_common::hal::config::positive_duration;
use rig_control::MotionError;
use serde::Deserialize;
use tracing::warn;

/// Every built-in, non-reserved action.
pub fn builtin_entries() -> [ActionEntry; 7] {
    [
        set_pos::ENTRY,
        reset::RESET_MIN,
        reset::RESET_MAX,
        position_lut::ENTRY,
        oscillate::ENTRY,
        oscillate_force::ENTRY,
        cleanup::ENTRY,
    ]
}

/// Parameters of actions that take none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

impl ActionParams for NoParams {}

/// Parse parameters that already passed the load-time check.
pub(crate) fn typed<P: ActionParams>(params: &Params) -> Result<P, ActionFault> {
    parse_params(params).map_err(ActionFault::Params)
}

/// `Some(value)` on success, `None` for a recoverable motion failure.
pub(crate) fn recover<T>(
    ctx: &ActionContext<'_>,
    result: Result<T, MotionError>,
) -> Result<Option<T>, ActionFault> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_recoverable() => {
            warn!(routine = ctx.routine, action = ctx.action, "motion failed: {e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn check_finite(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{name} must be finite, got {value}"))
    }
}

pub(crate) fn check_positive(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be positive, got {value}"))
    }
}

/// A positive number of seconds that fits in a `Duration`.
pub(crate) fn check_seconds(name: &str, value: f64) -> Result<(), String> {
    match positive_duration(value) {
        Some(_) => Ok(()),
        None => Err(format!("{name} must be a positive number of seconds, got {value}")),
    }
}
