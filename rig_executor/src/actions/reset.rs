//! `reset_min` and `reset_max`: drive to a hard limit.

use super::{NoParams, recover};
use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, Params, check_params};
use crate::status;

fn reset_min(ctx: &mut ActionContext<'_>, _params: &Params) -> Result<&'static str, ActionFault> {
    let result = ctx.rig.reset_min();
    Ok(match recover(ctx, result)? {
        Some(_) => status::SUCCESS,
        None => status::ERROR,
    })
}

fn reset_max(ctx: &mut ActionContext<'_>, _params: &Params) -> Result<&'static str, ActionFault> {
    let result = ctx.rig.reset_max();
    Ok(match recover(ctx, result)? {
        Some(_) => status::SUCCESS,
        None => status::ERROR,
    })
}

pub const RESET_MIN: ActionEntry = ActionEntry {
    name: "reset_min",
    summary: "Drive to pos_limit_low.",
    statuses: &[status::SUCCESS, status::ERROR],
    check: check_params::<NoParams>,
    run: reset_min,
};

pub const RESET_MAX: ActionEntry = ActionEntry {
    name: "reset_max",
    summary: "Drive to pos_limit_high.",
    statuses: &[status::SUCCESS, status::ERROR],
    check: check_params::<NoParams>,
    run: reset_max,
};
