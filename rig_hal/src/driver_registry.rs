//! Actuator driver selection.
//!
//! Drivers are listed as [`DriverEntry`] values and built by name when the
//! rig is assembled. Forcing simulation overrides whatever name the
//! operator asked for.

use crate::drivers::{self, simulation};
use rig_common::hal::driver::{ActuatorDriver, DriverFactory, HalError};
use std::collections::BTreeMap;
use tracing::info;

/// One selectable actuator backend.
#[derive(Debug, Clone, Copy)]
pub struct DriverEntry {
    /// Name used on the command line.
    pub name: &'static str,
    /// One-line description for listings and lookup errors.
    pub summary: &'static str,
    /// Builds an uninitialized driver; the rig calls `init`.
    pub factory: DriverFactory,
}

/// Drivers the executor may put behind a rig, keyed by name.
pub struct DriverRegistry {
    entries: BTreeMap<&'static str, DriverEntry>,
}

impl DriverRegistry {
    /// Registry with no drivers.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in driver.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        for entry in drivers::builtin_entries() {
            let added = registry.register(entry);
            debug_assert!(added.is_ok(), "built-in driver names are distinct");
        }
        registry
    }

    /// Add a driver.
    ///
    /// # Errors
    /// `HalError::DuplicateDriver` if the name is taken; the first entry stays.
    pub fn register(&mut self, entry: DriverEntry) -> Result<(), HalError> {
        if self.entries.contains_key(entry.name) {
            return Err(HalError::DuplicateDriver(entry.name.to_string()));
        }
        self.entries.insert(entry.name, entry);
        Ok(())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &DriverEntry> {
        self.entries.values()
    }

    /// Build the driver registered as `name`.
    ///
    /// # Errors
    /// `HalError::DriverNotFound` naming the drivers that are available.
    pub fn create(&self, name: &str) -> Result<Box<dyn ActuatorDriver>, HalError> {
        match self.entries.get(name) {
            Some(entry) => Ok((entry.factory)()),
            None => Err(HalError::DriverNotFound(self.not_found(name))),
        }
    }

    /// Build the driver the rig should run with.
    ///
    /// `simulate` swaps `requested` for the simulation driver.
    pub fn select(
        &self,
        requested: &str,
        simulate: bool,
    ) -> Result<Box<dyn ActuatorDriver>, HalError> {
        let name = if simulate && requested != simulation::DRIVER_NAME {
            info!(requested, "simulation forced; ignoring requested driver");
            simulation::DRIVER_NAME
        } else {
            requested
        };
        let driver = self.create(name)?;
        info!(driver = driver.name(), version = driver.version(), "driver selected");
        Ok(driver)
    }

    fn not_found(&self, name: &str) -> String {
        if self.entries.is_empty() {
            return format!("{name:?}; no drivers are registered");
        }
        let available: Vec<String> = self
            .entries()
            .map(|entry| format!("{} ({})", entry.name, entry.summary))
            .collect();
        format!("{name:?}; available: {}", available.join(", "))
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
