//! Procedure executor.
//!
//! Runs routines one after another. Within a routine the current action
//! starts at `START` and follows the transition table until `END`. An
//! `"error"` status runs `ERROR` once and aborts only that routine; any
//! other fault shuts the rig down and ends the run.

use crate::error::{ActionFault, ExecutorError};
use crate::registry::{ActionContext, ActionRegistry};
use crate::routine::{ActionNode, Routine};
use crate::status::{self, reserved};
use rig_control::Rig;
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineOutcome {
    /// Reached `END`.
    Completed,
    /// Ran `ERROR`.
    Aborted,
    /// `exec = false`.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineReport {
    pub routine: String,
    pub outcome: RoutineOutcome,
    /// Visited action names in order, `START` first.
    pub trail: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcedureReport {
    pub routines: Vec<RoutineReport>,
}

impl ProcedureReport {
    pub fn count(&self, outcome: RoutineOutcome) -> usize {
        self.routines.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Log a routine's actions and transitions without running anything.
pub fn describe_routine(routine: &Routine) {
    info!(
        routine = %routine.name,
        exec = routine.exec,
        len_units = %routine.len_units,
        force_units = %routine.force_units,
        "routine"
    );
    for node in routine.actions() {
        info!(
            routine = %routine.name,
            action = %node.name,
            kind = node.kind,
            deadline = ?node.deadline,
            transitions = ?routine.transitions().get(&node.name),
            "action"
        );
    }
}

/// Executes a fixed list of routines once.
pub struct ProcedureExecutor<'r> {
    routines: Vec<Routine>,
    registry: &'r ActionRegistry,
}

impl<'r> ProcedureExecutor<'r> {
    pub fn new(routines: Vec<Routine>, registry: &'r ActionRegistry) -> Self {
        Self { routines, registry }
    }

    /// Run every routine in order.
    ///
    /// # Errors
    /// The first unrecoverable fault, or `Interrupted` if the run was
    /// cancelled at any point, even after the last action. The rig is shut
    /// down before the error is returned.
    pub fn run(self, rig: &mut Rig) -> Result<ProcedureReport, ExecutorError> {
        let mut report = ProcedureReport::default();
        for routine in &self.routines {
            if !routine.exec {
                info!(routine = %routine.name, "routine skipped (exec = false)");
                describe_routine(routine);
                report.routines.push(RoutineReport {
                    routine: routine.name.clone(),
                    outcome: RoutineOutcome::Skipped,
                    trail: Vec::new(),
                });
                continue;
            }

            match self.run_routine(routine, rig) {
                Ok(routine_report) => report.routines.push(routine_report),
                Err(e) => return Err(halt(rig, e)),
            }
        }
        // Cancel that arrived after the last END check.
        if rig.cancel_token().is_cancelled() {
            let e = ExecutorError::Interrupted {
                routine: self.routines.last().map(|r| r.name.clone()).unwrap_or_default(),
                action: reserved::END.to_string(),
            };
            return Err(halt(rig, e));
        }
        info!(
            completed = report.count(RoutineOutcome::Completed),
            aborted = report.count(RoutineOutcome::Aborted),
            skipped = report.count(RoutineOutcome::Skipped),
            "procedure finished"
        );
        Ok(report)
    }

    fn run_routine(&self, routine: &Routine, rig: &mut Rig) -> Result<RoutineReport, ExecutorError> {
        let name = routine.name.as_str();
        info!(routine = name, "routine started");
        log_telemetry(rig, name, "start");

        let mut trail = Vec::new();
        let mut node = self.node(routine, reserved::START, reserved::START, status::WILDCARD)?;
        let outcome = loop {
            trail.push(node.name.clone());
            if rig.cancel_token().is_cancelled() {
                return Err(ExecutorError::Interrupted {
                    routine: name.to_string(),
                    action: node.name.clone(),
                });
            }
            if node.name == reserved::END {
                break RoutineOutcome::Completed;
            }

            let produced = match self.execute(routine, node, rig) {
                Ok(produced) => produced,
                Err(ActionFault::Aborted) => break RoutineOutcome::Aborted,
                Err(source) => return Err(fault(routine, node, source)),
            };
            debug!(routine = name, action = %node.name, status = produced, "action finished");

            if produced == status::ERROR {
                let error_node = self.node(routine, reserved::ERROR, &node.name, produced)?;
                trail.push(error_node.name.clone());
                match self.execute(routine, error_node, rig) {
                    Ok(_) | Err(ActionFault::Aborted) => break RoutineOutcome::Aborted,
                    Err(source) => return Err(fault(routine, error_node, source)),
                }
            }

            let next = routine.resolve(&node.name, produced).ok_or_else(|| {
                ExecutorError::NoTransition {
                    routine: name.to_string(),
                    action: node.name.clone(),
                    status: produced.to_string(),
                }
            })?;
            node = self.node(routine, next, &node.name, produced)?;
        };

        log_telemetry(rig, name, "end");
        match outcome {
            RoutineOutcome::Aborted => warn!(routine = name, trail = ?trail, "routine aborted"),
            _ => info!(routine = name, trail = ?trail, "routine completed"),
        }
        Ok(RoutineReport {
            routine: name.to_string(),
            outcome,
            trail,
        })
    }

    /// Look up `target`, reached from `from` on `status`.
    fn node<'a>(
        &self,
        routine: &'a Routine,
        target: &str,
        from: &str,
        status: &str,
    ) -> Result<&'a ActionNode, ExecutorError> {
        routine.action(target).ok_or_else(|| ExecutorError::NoTransition {
            routine: routine.name.clone(),
            action: from.to_string(),
            status: status.to_string(),
        })
    }

    fn execute(
        &self,
        routine: &Routine,
        node: &ActionNode,
        rig: &mut Rig,
    ) -> Result<&'static str, ActionFault> {
        let entry = self
            .registry
            .get(node.kind)
            .ok_or_else(|| ActionFault::Unregistered(node.kind.to_string()))?;
        debug!(routine = %routine.name, action = %node.name, kind = node.kind, "running action");

        rig.begin_action(node.deadline);
        let mut ctx = ActionContext {
            rig: &mut *rig,
            routine: &routine.name,
            action: &node.name,
            len_units: routine.len_units,
            force_units: routine.force_units,
        };
        let result = (entry.run)(&mut ctx, &node.params);
        rig.end_action();
        result
    }
}

/// Shut the rig down on the way out of a failed run.
fn halt(rig: &mut Rig, e: ExecutorError) -> ExecutorError {
    error!("{e}");
    if let Err(stop) = rig.shutdown() {
        error!("shutdown after fault failed: {stop}");
    }
    e
}

fn fault(routine: &Routine, node: &ActionNode, source: ActionFault) -> ExecutorError {
    ExecutorError::Fault {
        routine: routine.name.clone(),
        action: node.name.clone(),
        source,
    }
}

/// Log the rig's last observed state. Reads no sensor.
fn log_telemetry(rig: &Rig, routine: &str, phase: &'static str) {
    let Some(sample) = rig.telemetry() else {
        debug!(routine, phase, "no position observed yet");
        return;
    };
    match sample.to_json() {
        Ok(json) => info!(routine, phase, telemetry = %json, "telemetry"),
        Err(e) => warn!(routine, phase, "telemetry unavailable: {e}"),
    }
}
