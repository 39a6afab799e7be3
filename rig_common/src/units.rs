//! Length and force units.
//!
//! Internally every position is a raw ADC level and every force is whatever
//! the load cell reports in its native (raw) unit. Procedure parameters are
//! written in the routine's units and converted once at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

const MM_PER_IN: f64 = 25.4;
const KG_PER_LB: f64 = 0.453592;

/// Millimetres to inches.
pub fn mm2in(mm: f64) -> f64 {
    mm / MM_PER_IN
}

/// Inches to millimetres.
pub fn in2mm(inches: f64) -> f64 {
    inches * MM_PER_IN
}

/// Pounds to kilograms.
pub fn lbs2kg(lbs: f64) -> f64 {
    lbs * KG_PER_LB
}

/// Kilograms to pounds.
pub fn kg2lbs(kg: f64) -> f64 {
    kg / KG_PER_LB
}

/// Unit system accepted by the `[config]` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// A/D levels and native load cell readings.
    #[default]
    Raw,
    /// Inches and pounds.
    Imperial,
    /// Millimetres and kilograms.
    Metric,
}

impl UnitSystem {
    pub fn length_unit(self) -> LengthUnit {
        match self {
            Self::Raw => LengthUnit::Raw,
            Self::Imperial => LengthUnit::In,
            Self::Metric => LengthUnit::Mm,
        }
    }

    pub fn force_unit(self) -> ForceUnit {
        match self {
            Self::Raw => ForceUnit::Raw,
            Self::Imperial => ForceUnit::Lb,
            Self::Metric => ForceUnit::Kg,
        }
    }
}

/// Length unit of positions written in a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Raw,
    In,
    Mm,
}

impl LengthUnit {
    /// Convert a value in this unit to raw ADC levels.
    ///
    /// `inches_per_level` comes from the rig configuration.
    pub fn to_raw(self, value: f64, inches_per_level: f64) -> f64 {
        match self {
            Self::Raw => value,
            Self::In => value / inches_per_level,
            Self::Mm => mm2in(value) / inches_per_level,
        }
    }

    /// Convert raw ADC levels into this unit.
    pub fn from_raw(self, level: f64, inches_per_level: f64) -> f64 {
        match self {
            Self::Raw => level,
            Self::In => level * inches_per_level,
            Self::Mm => in2mm(level * inches_per_level),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raw => "raw",
            Self::In => "in",
            Self::Mm => "mm",
        })
    }
}

/// Force unit of loads written in a routine.
///
/// The load cell reports pounds when configured for imperial output, so `Raw`
/// and `Lb` share a scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForceUnit {
    #[default]
    Raw,
    Lb,
    Kg,
}

impl ForceUnit {
    /// Convert a value in this unit to the load cell's native unit.
    pub fn to_raw(self, value: f64) -> f64 {
        match self {
            Self::Raw | Self::Lb => value,
            Self::Kg => kg2lbs(value),
        }
    }
}

impl fmt::Display for ForceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raw => "raw",
            Self::Lb => "lb",
            Self::Kg => "kg",
        })
    }
}
