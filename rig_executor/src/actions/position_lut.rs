//! `position_lut`: visit a table of positions in order.

use super::{check_finite, check_positive, recover, typed};
use crate::error::ActionFault;
use crate::registry::{ActionContext, ActionEntry, ActionParams, Params, check_params};
use crate::status;
use rig_common::units::LengthUnit;
use serde::Deserialize;
use tracing::debug;

/// Raw drive levels: one for every entry, or one per entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SpeedTable {
    Uniform(f64),
    PerPosition(Vec<f64>),
}

impl SpeedTable {
    fn at(&self, index: usize) -> Option<f64> {
        match self {
            Self::Uniform(speed) => Some(*speed),
            Self::PerPosition(speeds) => speeds.get(index).copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionLutParams {
    pub positions: Vec<f64>,
    #[serde(default)]
    pub speeds: Option<SpeedTable>,
    /// Overrides the routine's length unit for `positions`.
    #[serde(default)]
    pub units: Option<LengthUnit>,
    /// Passes over the table.
    #[serde(default)]
    pub cycles: Option<u32>,
}

impl ActionParams for PositionLutParams {
    fn validate(&self) -> Result<(), String> {
        if self.positions.is_empty() {
            return Err("positions must not be empty".into());
        }
        for position in &self.positions {
            check_finite("position", *position)?;
        }
        match &self.speeds {
            Some(SpeedTable::Uniform(speed)) => check_positive("speed", *speed)?,
            Some(SpeedTable::PerPosition(speeds)) => {
                if speeds.len() != self.positions.len() {
                    return Err(format!(
                        "{} speeds given for {} positions",
                        speeds.len(),
                        self.positions.len()
                    ));
                }
                for speed in speeds {
                    check_positive("speed", *speed)?;
                }
            }
            None => {}
        }
        if self.cycles == Some(0) {
            return Err("cycles must be at least 1".into());
        }
        Ok(())
    }
}

fn run(ctx: &mut ActionContext<'_>, params: &Params) -> Result<&'static str, ActionFault> {
    let p: PositionLutParams = typed(params)?;
    let unit = p.units.unwrap_or(ctx.len_units);

    for pass in 0..p.cycles.unwrap_or(1) {
        for (index, position) in p.positions.iter().enumerate() {
            let target = ctx.rig.length_to_raw(unit, *position);
            let speed = p.speeds.as_ref().and_then(|s| s.at(index));
            debug!(pass, index, target, ?speed, "table entry");
            let result = ctx.rig.set_position(target, speed);
            if recover(ctx, result)?.is_none() {
                return Ok(status::ERROR);
            }
        }
    }
    Ok(status::DONE)
}

pub const ENTRY: ActionEntry = ActionEntry {
    name: "position_lut",
    summary: "Visit `positions` in order, optionally at `speeds`, `cycles` times.",
    statuses: &[status::DONE, status::ERROR],
    check: check_params::<PositionLutParams>,
    run,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::parse_params;

    fn parse(text: &str) -> Result<PositionLutParams, String> {
        parse_params(&toml::from_str(text).unwrap())
    }

    #[test]
    fn speeds_accept_scalar_or_list() {
        let p = parse("positions = [1.0, 2.0]\nspeeds = 1500.0").unwrap();
        assert_eq!(p.speeds, Some(SpeedTable::Uniform(1500.0)));
        assert_eq!(p.speeds.unwrap().at(1), Some(1500.0));

        let p = parse("positions = [1.0, 2.0]\nspeeds = [1000.0, 2000.0]").unwrap();
        assert_eq!(p.speeds.unwrap().at(1), Some(2000.0));
    }

    #[test]
    fn speed_list_must_match_positions() {
        let err = parse("positions = [1.0, 2.0, 3.0]\nspeeds = [1000.0]").unwrap_err();
        assert!(err.contains("1 speeds given for 3 positions"));
    }

    #[test]
    fn rejects_empty_table_and_zero_cycles() {
        assert!(parse("positions = []").is_err());
        assert!(parse("positions = [1.0]\ncycles = 0").is_err());
    }

    #[test]
    fn units_override_parses() {
        let p = parse("positions = [0.5]\nunits = \"in\"\ncycles = 2").unwrap();
        assert_eq!(p.units, Some(LengthUnit::In));
        assert_eq!(p.cycles, Some(2));
    }
}
