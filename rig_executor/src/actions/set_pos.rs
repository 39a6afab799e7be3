//! `set_pos`: drive to one position.

use super::{check_finite, check_positive, recover, typed};
use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, ActionParams, Params, check_params};
use crate::status;
use serde::Deserialize;

/// `position` in routine units; mid-stroke when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPosParams {
    #[serde(default)]
    pub position: Option<f64>,
    /// Raw drive level.
    #[serde(default)]
    pub speed: Option<f64>,
}

impl ActionParams for SetPosParams {
    fn validate(&self) -> Result<(), String> {
        if let Some(position) = self.position {
            check_finite("position", position)?;
        }
        if let Some(speed) = self.speed {
            check_positive("speed", speed)?;
        }
        Ok(())
    }
}

fn run(ctx: &mut ActionContext<'_>, params: &Params) -> Result<&'static str, ActionFault> {
    let p: SetPosParams = typed(params)?;
    let target = match p.position {
        Some(position) => ctx.length(position),
        None => ctx.rig.config().mid_position(),
    };
    let result = ctx.rig.set_position(target, p.speed);
    Ok(match recover(ctx, result)? {
        Some(_) => status::SUCCESS,
        None => status::ERROR,
    })
}

pub const ENTRY: ActionEntry = ActionEntry {
    name: "set_pos",
    summary: "Drive to `position` (routine units, default mid-stroke) at optional raw `speed`.",
    statuses: &[status::SUCCESS, status::ERROR],
    check: check_params::<SetPosParams>,
    run,
};
