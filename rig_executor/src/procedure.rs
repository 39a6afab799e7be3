//! Procedure documents.
//!
//! A procedure is one TOML file: an optional `[shared]` block, an optional
//! `[config]` block for the rig and any number of `[[routine]]` tables.
//! Unknown tables and keys are rejected.
//!
//! ```toml
//! [config]
//! pos_limit_low = 5000
//! pos_limit_high = 26000
//!
//! [[routine]]
//! name = "home"
//!
//! [[routine.action]]
//! name = "reset_min"
//!
//! [routine.transitions]
//! START = { "*" = "reset_min" }
//! reset_min = { success = "END" }
//! ```

use crate::error::LoadError;
use crate::registry::{ActionRegistry, Params};
use crate::routine::{Routine, TransitionTable};
use crate::validate::validate_routine;
use rig_common::config::{ConfigLoader, SharedConfig};
use rig_common::hal::config::RigConfig;
use rig_common::units::{ForceUnit, LengthUnit};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

fn default_exec() -> bool {
    true
}

/// The document as written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcedureDocument {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub config: RigConfig,
    #[serde(default, rename = "routine")]
    pub routines: Vec<RoutineSpec>,
}

/// One `[[routine]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutineSpec {
    pub name: String,
    /// Defaults to the length unit of `config.units`.
    #[serde(default)]
    pub len_units: Option<LengthUnit>,
    /// Defaults to the force unit of `config.units`.
    #[serde(default)]
    pub force_units: Option<ForceUnit>,
    #[serde(default = "default_exec")]
    pub exec: bool,
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionSpec>,
    #[serde(default)]
    pub transitions: TransitionTable,
}

/// One `[[routine.action]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    pub name: String,
    /// Registry entry; defaults to `name`.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub deadline_s: Option<f64>,
    #[serde(default)]
    pub params: Params,
}

/// A loaded and validated procedure.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub shared: SharedConfig,
    pub config: RigConfig,
    pub routines: Vec<Routine>,
    /// Non-fatal findings of the validator.
    pub warnings: Vec<String>,
}

impl Procedure {
    /// Load and validate a procedure file.
    ///
    /// # Errors
    /// `LoadError::Config` for missing or malformed files and invalid
    /// `[shared]`/`[config]` blocks, the other variants for routine defects.
    pub fn load(path: &Path, registry: &ActionRegistry) -> Result<Self, LoadError> {
        let document = ProcedureDocument::load(path)?;
        debug!(path = %path.display(), routines = document.routines.len(), "procedure parsed");
        Self::from_document(document, registry)
    }

    /// Load and validate a procedure held in memory.
    pub fn parse(text: &str, registry: &ActionRegistry) -> Result<Self, LoadError> {
        Self::from_document(ProcedureDocument::parse(text)?, registry)
    }

    pub fn from_document(
        document: ProcedureDocument,
        registry: &ActionRegistry,
    ) -> Result<Self, LoadError> {
        document.shared.validate()?;
        document.config.validate()?;

        let mut names = BTreeSet::new();
        for spec in &document.routines {
            if !names.insert(spec.name.as_str()) {
                return Err(LoadError::DuplicateRoutine(spec.name.clone()));
            }
        }

        let units = (
            document.config.units.length_unit(),
            document.config.units.force_unit(),
        );
        let mut routines = Vec::with_capacity(document.routines.len());
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for spec in document.routines {
            let routine = Routine::build(spec, units, registry)?;
            let report = validate_routine(&routine, registry);
            errors.extend(report.errors);
            warnings.extend(report.warnings);
            routines.push(routine);
        }
        if !errors.is_empty() {
            return Err(LoadError::Invalid(errors));
        }

        Ok(Self {
            shared: document.shared,
            config: document.config,
            routines,
            warnings,
        })
    }
}
