//! Static checks of a routine's transition graph.
//!
//! Everything here runs at load time. Errors are collected rather than
//! returned one by one so a procedure author sees every defect at once.

use crate::error::ValidationError;
use crate::registry::ActionRegistry;
use crate::routine::Routine;
use crate::status::{self, WILDCARD, reserved};
use std::collections::{BTreeSet, VecDeque};

/// Outcome of validating one routine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    /// Suspicious but runnable.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Actions reachable from `START` through declared transition targets.
pub fn reachable(routine: &Routine) -> BTreeSet<&str> {
    let mut seen = BTreeSet::from([reserved::START]);
    let mut queue = VecDeque::from([reserved::START]);
    while let Some(current) = queue.pop_front() {
        let Some(table) = routine.transitions().get(current) else {
            continue;
        };
        for target in table.values() {
            if let Some(node) = routine.action(target) {
                if seen.insert(node.name.as_str()) {
                    queue.push_back(node.name.as_str());
                }
            }
        }
    }
    seen
}

pub fn validate_routine(routine: &Routine, registry: &ActionRegistry) -> ValidationReport {
    let mut report = ValidationReport::default();
    let name = &routine.name;

    for (source, table) in routine.transitions() {
        if routine.action(source).is_none() {
            report.errors.push(ValidationError::UnknownSource {
                routine: name.clone(),
                action: source.clone(),
            });
            continue;
        }
        if (source == reserved::END || source == reserved::ERROR) && !table.is_empty() {
            report.errors.push(ValidationError::TerminalTransitions {
                routine: name.clone(),
                action: source.clone(),
            });
        }
        for (key, target) in table {
            if routine.action(target).is_none() {
                report.errors.push(ValidationError::UnknownTarget {
                    routine: name.clone(),
                    from: source.clone(),
                    status: key.clone(),
                    to: target.clone(),
                });
            }
        }
    }

    let reachable = reachable(routine);
    for node in routine.actions() {
        let action = node.name.as_str();
        if action == reserved::END || action == reserved::ERROR {
            continue;
        }
        let statuses = registry.get(node.kind).map_or(&[][..], |entry| entry.statuses);

        let Some(table) = routine.transitions().get(action) else {
            if reachable.contains(action) {
                report.errors.push(ValidationError::MissingTransitions {
                    routine: name.clone(),
                    action: action.to_string(),
                });
            } else {
                report
                    .warnings
                    .push(format!("routine {name:?}: action {action:?} is unreachable"));
            }
            continue;
        };

        if !reachable.contains(action) {
            report
                .warnings
                .push(format!("routine {name:?}: action {action:?} is unreachable"));
        }

        let wildcard = table.contains_key(WILDCARD);
        for produced in statuses.iter().copied() {
            if produced == status::ERROR || wildcard || table.contains_key(produced) {
                continue;
            }
            report.errors.push(ValidationError::UncoveredStatus {
                routine: name.clone(),
                action: action.to_string(),
                status: produced.to_string(),
            });
        }

        for key in table.keys() {
            if key == status::ERROR {
                report.warnings.push(format!(
                    "routine {name:?}: {action:?} maps \"error\", which always runs ERROR"
                ));
            } else if key != WILDCARD && !statuses.iter().any(|s| *s == key.as_str()) {
                report.warnings.push(format!(
                    "routine {name:?}: {action:?} never produces status {key:?}"
                ));
            }
        }
    }
    report
}
