//! `START`, `END` and `ERROR`.

use super::NoParams;
use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, Params, check_params};
use crate::status::{self, reserved};
use tracing::warn;

fn start(_ctx: &mut ActionContext<'_>, _params: &Params) -> Result<&'static str, ActionFault> {
    Ok(status::SUCCESS)
}

/// Reaching `END` terminates the routine before it would run.
fn end(_ctx: &mut ActionContext<'_>, _params: &Params) -> Result<&'static str, ActionFault> {
    Err(ActionFault::Sentinel(reserved::END))
}

/// Stop the drive and abort the routine.
fn error(ctx: &mut ActionContext<'_>, _params: &Params) -> Result<&'static str, ActionFault> {
    warn!(routine = ctx.routine, "ERROR action: stopping drive and aborting routine");
    ctx.rig.stop()?;
    Err(ActionFault::Aborted)
}

pub fn entries() -> [ActionEntry; 3] {
    [
        ActionEntry {
            name: reserved::START,
            summary: "Initial action; always succeeds.",
            statuses: &[status::SUCCESS],
            check: check_params::<NoParams>,
            run: start,
        },
        ActionEntry {
            name: reserved::END,
            summary: "Terminal sentinel; never runs.",
            statuses: &[],
            check: check_params::<NoParams>,
            run: end,
        },
        ActionEntry {
            name: reserved::ERROR,
            summary: "Stops the drive and aborts the routine.",
            statuses: &[],
            check: check_params::<NoParams>,
            run: error,
        },
    ]
}
