//! Executor error types.
//!
//! - `LoadError`: the procedure document cannot be turned into routines
//! - `ValidationError`: one static defect of a routine's transition graph
//! - `ActionFault`: an action could not report a status
//! - `ExecutorError`: an unrecoverable fault that ended the run
//! - `RegistryError`: an action registration was refused

use rig_common::config::ConfigError;
use rig_common::hal::driver::HalError;
use rig_control::MotionError;
use thiserror::Error;

/// Procedure loading failures. Nothing has touched hardware yet.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("duplicate routine name {0:?}")]
    DuplicateRoutine(String),

    #[error("routine {routine:?}: action {action:?} declared twice")]
    DuplicateAction { routine: String, action: String },

    #[error("routine {routine:?}: {action:?} is a reserved action name")]
    ReservedName { routine: String, action: String },

    #[error("routine {routine:?}: action {action:?} uses unknown kind {kind:?}")]
    UnknownAction {
        routine: String,
        action: String,
        kind: String,
    },

    #[error("routine {routine:?}: bad parameters for {action:?}: {message}")]
    BadParams {
        routine: String,
        action: String,
        message: String,
    },

    #[error("routine {routine:?}: action {action:?} has invalid deadline_s {value}")]
    BadDeadline {
        routine: String,
        action: String,
        value: f64,
    },

    #[error("{} validation error(s): {}", .0.len(), join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One static defect of a routine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routine {routine:?}: transitions given for undeclared action {action:?}")]
    UnknownSource { routine: String, action: String },

    #[error("routine {routine:?}: {from:?} on {status:?} targets undeclared action {to:?}")]
    UnknownTarget {
        routine: String,
        from: String,
        status: String,
        to: String,
    },

    #[error("routine {routine:?}: action {action:?} is reachable but has no transitions")]
    MissingTransitions { routine: String, action: String },

    #[error("routine {routine:?}: status {status:?} of {action:?} has no transition")]
    UncoveredStatus {
        routine: String,
        action: String,
        status: String,
    },

    #[error("routine {routine:?}: {action:?} is terminal and may not have transitions")]
    TerminalTransitions { routine: String, action: String },
}

/// Raised by an action instead of returning a status.
///
/// `Aborted` is the ERROR action's signal and ends only the current routine;
/// every other variant is unrecoverable.
#[derive(Debug, Error)]
pub enum ActionFault {
    #[error("routine aborted")]
    Aborted,

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Hal(#[from] HalError),

    #[error("parameters rejected at run time: {0}")]
    Params(String),

    #[error("{0} is a sentinel and cannot run")]
    Sentinel(&'static str),

    #[error("action kind {0:?} is not registered")]
    Unregistered(String),
}

/// Unrecoverable end of a run. Hardware has been shut down.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("routine {routine:?}, action {action:?}: {source}")]
    Fault {
        routine: String,
        action: String,
        #[source]
        source: ActionFault,
    },

    #[error("routine {routine:?}: no transition from {action:?} on status {status:?}")]
    NoTransition {
        routine: String,
        action: String,
        status: String,
    },

    #[error("routine {routine:?}: interrupted before {action:?}")]
    Interrupted { routine: String, action: String },
}

/// Action registration refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{0:?} is a reserved action name")]
    Reserved(String),

    #[error("action {0:?} is already registered")]
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_error() {
        let err = LoadError::Invalid(vec![
            ValidationError::MissingTransitions {
                routine: "r".into(),
                action: "a".into(),
            },
            ValidationError::TerminalTransitions {
                routine: "r".into(),
                action: "END".into(),
            },
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 validation error(s)"));
        assert!(text.contains("\"a\" is reachable"));
        assert!(text.contains("\"END\" is terminal"));
    }

    #[test]
    fn fault_wraps_motion_error() {
        let fault = ActionFault::from(MotionError::Cancelled);
        assert!(fault.to_string().contains("cancelled"));
    }
}
