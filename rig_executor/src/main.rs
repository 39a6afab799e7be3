//! # Rig Executor Binary
//!
//! Runs a procedure file against the actuator rig.
//!
//! # Usage
//!
//! ```bash
//! # Run on the simulated rig
//! rig_executor procedure.toml -s
//!
//! # Check a procedure without moving anything
//! rig_executor procedure.toml --dry-run
//!
//! # Show registered actions and their statuses
//! rig_executor --list-actions
//! ```

#![deny(warnings)]

use clap::Parser;
use rig_common::config::LogLevel;
use rig_common::consts::DEFAULT_PROCEDURE_PATH;
use rig_control::Rig;
use rig_control::clock::MonotonicClock;
use rig_control::safety::CancelToken;
use rig_executor::executor::describe_routine;
use rig_executor::{ActionRegistry, Procedure, ProcedureExecutor, RoutineOutcome};
use rig_hal::DriverRegistry;
use std::path::PathBuf;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rig Executor - runs declarative test procedures on a linear actuator rig
#[derive(Parser, Debug)]
#[command(name = "rig_executor")]
#[command(version)]
#[command(about = "Runs declarative test procedures on a linear actuator rig")]
#[command(long_about = None)]
struct Args {
    /// Procedure file
    #[arg(default_value = DEFAULT_PROCEDURE_PATH)]
    procedure: PathBuf,

    /// Driver to load
    #[arg(short, long, default_value = "simulation")]
    driver: String,

    /// Force the simulation driver
    #[arg(short = 's', long)]
    simulate: bool,

    /// Load and validate only; no hardware motion
    #[arg(long)]
    dry_run: bool,

    /// Print registered actions as JSON and exit
    #[arg(long)]
    list_actions: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("rig executor failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let registry = ActionRegistry::with_builtins();

    if args.list_actions {
        println!("{}", serde_json::to_string_pretty(&registry.describe())?);
        return Ok(());
    }

    // The document's log level applies only once it has been read.
    let loaded = Procedure::load(&args.procedure, &registry);
    setup_tracing(&args, loaded.as_ref().ok().map(|p| p.shared.log_level));
    let procedure = loaded?;

    info!(
        "Rig Executor v{} loaded {} ({} routines, station {})",
        env!("CARGO_PKG_VERSION"),
        args.procedure.display(),
        procedure.routines.len(),
        procedure.shared.station_name
    );
    for warning in &procedure.warnings {
        warn!("{warning}");
    }

    if args.dry_run {
        for routine in &procedure.routines {
            describe_routine(routine);
        }
        info!("dry run complete; no hardware was touched");
        return Ok(());
    }

    let driver = DriverRegistry::with_builtin_drivers().select(&args.driver, args.simulate)?;

    let cancel = CancelToken::new();
    let interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("Received interrupt, stopping");
        interrupt.cancel();
    })?;

    let mut rig = Rig::new(
        procedure.config.clone(),
        driver,
        Box::new(MonotonicClock::new()),
        cancel,
    )?;

    let result = ProcedureExecutor::new(procedure.routines, &registry).run(&mut rig);
    if let Err(e) = rig.shutdown() {
        error!("rig shutdown failed: {e}");
    }
    let report = result?;

    info!(
        completed = report.count(RoutineOutcome::Completed),
        aborted = report.count(RoutineOutcome::Aborted),
        skipped = report.count(RoutineOutcome::Skipped),
        "Rig Executor finished"
    );
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the document's log level.
fn setup_tracing(args: &Args, document_level: Option<LogLevel>) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        document_level.map_or(Level::INFO, Level::from)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
