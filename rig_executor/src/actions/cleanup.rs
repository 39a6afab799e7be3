//! `cleanup`: stop the drive and release the driver lines.

use super::NoParams;
use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, Params, check_params};
use crate::status;
use tracing::info;

fn run(ctx: &mut ActionContext<'_>, _params: &Params) -> Result<&'static str, ActionFault> {
    info!(routine = ctx.routine, "cleaning up");
    ctx.rig.shutdown()?;
    Ok(status::SUCCESS)
}

pub const ENTRY: ActionEntry = ActionEntry {
    name: "cleanup",
    summary: "Stop the drive and release relay and converter lines.",
    statuses: &[status::SUCCESS],
    check: check_params::<NoParams>,
    run,
};
