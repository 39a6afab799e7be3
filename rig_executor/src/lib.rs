//! # Rig Executor
//!
//! Loads declarative test procedures and runs them against a [`Rig`].
//!
//! A procedure is a list of routines. Each routine is a graph of actions
//! whose edges are labelled with the status strings the actions return:
//!
//! ```text
//! START ──*──▶ set_pos ──success──▶ END
//!                 │
//!               error
//!                 ▼
//!               ERROR  (stop drive, abort routine)
//! ```
//!
//! ## Modules
//!
//! - [`procedure`]: the TOML document and its loader
//! - [`registry`]: name → action table with per-action status vocabularies
//! - [`actions`]: built-in actions
//! - [`routine`]: action graphs and status resolution
//! - [`validate`]: load-time coverage checks
//! - [`executor`]: sequential routine execution
//!
//! [`Rig`]: rig_control::Rig

pub mod actions;
pub mod error;
pub mod executor;
pub mod procedure;
pub mod registry;
pub mod routine;
pub mod status;
pub mod validate;

pub use error::{ActionFault, ExecutorError, LoadError};
pub use executor::{ProcedureExecutor, ProcedureReport, RoutineOutcome, RoutineReport};
pub use procedure::Procedure;
pub use registry::ActionRegistry;
