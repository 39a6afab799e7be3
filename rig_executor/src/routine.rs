//! Routines: a named action graph with a transition table.

use crate::error::LoadError;
use crate::procedure::RoutineSpec;
use crate::registry::{ActionRegistry, Params};
use crate::status::{WILDCARD, reserved};
use rig_common::hal::config::positive_duration;
use rig_common::units::{ForceUnit, LengthUnit};
use std::collections::BTreeMap;
use std::time::Duration;

/// `action → (status → next action)`.
pub type TransitionTable = BTreeMap<String, BTreeMap<String, String>>;

/// One node of a routine graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionNode {
    /// Node name, unique within the routine.
    pub name: String,
    /// Registry entry that runs this node.
    pub kind: &'static str,
    pub params: Params,
    /// Per-action deadline overriding the config default.
    pub deadline: Option<Duration>,
}

impl ActionNode {
    fn reserved(name: &'static str) -> Self {
        Self {
            name: name.to_string(),
            kind: name,
            params: Params::new(),
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    pub len_units: LengthUnit,
    pub force_units: ForceUnit,
    /// `false` routines are listed but never run.
    pub exec: bool,
    actions: BTreeMap<String, ActionNode>,
    transitions: TransitionTable,
}

impl Routine {
    /// Build a routine from its document form.
    ///
    /// Resolves every action against `registry`, checks its parameters and
    /// injects `START`, `END` and `ERROR`. `START` without transitions falls
    /// through to `ERROR` on any status. Graph coverage is checked
    /// separately by [`crate::validate::validate_routine`].
    pub fn build(
        spec: RoutineSpec,
        default_units: (LengthUnit, ForceUnit),
        registry: &ActionRegistry,
    ) -> Result<Self, LoadError> {
        let routine = spec.name;
        let mut actions = BTreeMap::new();
        for name in reserved::ALL {
            actions.insert(name.to_string(), ActionNode::reserved(name));
        }

        for action in spec.actions {
            let kind_name = action.kind.unwrap_or_else(|| action.name.clone());
            if reserved::is_reserved(&action.name) || reserved::is_reserved(&kind_name) {
                return Err(LoadError::ReservedName {
                    routine,
                    action: action.name,
                });
            }
            if actions.contains_key(&action.name) {
                return Err(LoadError::DuplicateAction {
                    routine,
                    action: action.name,
                });
            }
            let Some(entry) = registry.get(&kind_name) else {
                return Err(LoadError::UnknownAction {
                    routine,
                    action: action.name,
                    kind: kind_name,
                });
            };
            if let Err(message) = (entry.check)(&action.params) {
                return Err(LoadError::BadParams {
                    routine,
                    action: action.name,
                    message,
                });
            }
            let deadline = match action.deadline_s {
                None => None,
                Some(value) => match positive_duration(value) {
                    Some(deadline) => Some(deadline),
                    None => {
                        return Err(LoadError::BadDeadline {
                            routine,
                            action: action.name,
                            value,
                        });
                    }
                },
            };
            actions.insert(
                action.name.clone(),
                ActionNode {
                    name: action.name,
                    kind: entry.name,
                    params: action.params,
                    deadline,
                },
            );
        }

        let mut transitions = spec.transitions;
        transitions
            .entry(reserved::START.to_string())
            .or_insert_with(|| BTreeMap::from([(WILDCARD.to_string(), reserved::ERROR.to_string())]));

        Ok(Self {
            name: routine,
            len_units: spec.len_units.unwrap_or(default_units.0),
            force_units: spec.force_units.unwrap_or(default_units.1),
            exec: spec.exec,
            actions,
            transitions,
        })
    }

    pub fn action(&self, name: &str) -> Option<&ActionNode> {
        self.actions.get(name)
    }

    /// Declared actions in name order, reserved ones included.
    pub fn actions(&self) -> impl Iterator<Item = &ActionNode> {
        self.actions.values()
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Next action after `action` produced `status`.
    ///
    /// A literal status key wins over `*`.
    pub fn resolve(&self, action: &str, status: &str) -> Option<&str> {
        let table = self.transitions.get(action)?;
        table
            .get(status)
            .or_else(|| table.get(WILDCARD))
            .map(String::as_str)
    }
}
