//! `oscillate_force`: cycle below the point where a load is felt.
//!
//! Each cycle drives forward until `min_force` is reached, backs off by
//! `displacement` and returns to the contact position.

use super::oscillate::{CycleLimit, finish, run_cycles, validate_common};
use super::{check_finite, check_positive, typed};
use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, ActionParams, Params, check_params};
use crate::status;
use rig_control::control::feedback::ControllerSpec;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OscillateForceParams {
    /// Routine force units.
    pub min_force: f64,
    /// Routine length units.
    pub displacement: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub repetitions: Option<u32>,
    #[serde(default)]
    pub controller: Option<ControllerSpec>,
}

impl ActionParams for OscillateForceParams {
    fn validate(&self) -> Result<(), String> {
        check_finite("min_force", self.min_force)?;
        check_positive("displacement", self.displacement)?;
        if self.timeout.is_none() && self.repetitions.is_none() {
            return Err("one of timeout or repetitions is required".into());
        }
        validate_common(self.speed, self.timeout, self.repetitions, self.controller.as_ref())
    }
}

fn run(ctx: &mut ActionContext<'_>, params: &Params) -> Result<&'static str, ActionFault> {
    let p: OscillateForceParams = typed(params)?;
    let min_force = ctx.force(p.min_force);
    let displacement = ctx.length(p.displacement);
    let limit = CycleLimit::new(p.timeout, p.repetitions);

    let outcome = run_cycles(ctx, p.speed, p.controller, limit, |rig| {
        let high = rig.seek_load(min_force, None)?;
        let low = high - displacement;
        rig.set_position(low, None)?;
        rig.set_position(high, None)?;
        Ok(())
    })?;
    finish(ctx, outcome, |repeats| limit.status(repeats, false))
}

pub const ENTRY: ActionEntry = ActionEntry {
    name: "oscillate_force",
    summary: "Seek `min_force`, back off `displacement`, repeat until `timeout` or `repetitions`.",
    statuses: &[status::TIMEOUT_STOPPED, status::REPEATS_STOPPED, status::ERROR],
    check: check_params::<OscillateForceParams>,
    run,
};
