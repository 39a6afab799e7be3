//! Action registry.
//!
//! A name-indexed table of [`ActionEntry`] values. `START`, `END` and
//! `ERROR` are always present and cannot be registered over. Every entry
//! declares its closed status vocabulary and a parameter checker that the
//! loader runs before any hardware moves.

use crate::actions;
use crate::error::{ActionFault, RegistryError};
use crate::status::reserved;
use rig_common::units::{ForceUnit, LengthUnit};
use rig_control::Rig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

/// Raw parameter table of one action, as written in the document.
pub type Params = toml::Table;

/// Load-time parameter check.
pub type ParamCheck = fn(&Params) -> Result<(), String>;

/// Action body.
pub type ActionFn = fn(&mut ActionContext<'_>, &Params) -> Result<&'static str, ActionFault>;

/// What an action sees while it runs.
pub struct ActionContext<'a> {
    pub rig: &'a mut Rig,
    pub routine: &'a str,
    pub action: &'a str,
    pub len_units: LengthUnit,
    pub force_units: ForceUnit,
}

impl ActionContext<'_> {
    /// Length in the routine's units to raw levels.
    pub fn length(&self, value: f64) -> f64 {
        self.rig.length_to_raw(self.len_units, value)
    }

    /// Force in the routine's units to the load cell's unit.
    pub fn force(&self, value: f64) -> f64 {
        self.rig.force_to_raw(self.force_units, value)
    }
}

/// Typed parameters of an action.
pub trait ActionParams: DeserializeOwned {
    /// Semantic checks beyond the shape of the table.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Deserialize a parameter table into `P`.
pub fn parse_params<P: ActionParams>(params: &Params) -> Result<P, String> {
    let parsed: P = toml::Value::Table(params.clone())
        .try_into()
        .map_err(|e| e.to_string())?;
    parsed.validate()?;
    Ok(parsed)
}

/// [`ParamCheck`] for any [`ActionParams`] type.
pub fn check_params<P: ActionParams>(params: &Params) -> Result<(), String> {
    parse_params::<P>(params).map(|_| ())
}

/// One registered action.
#[derive(Clone, Copy)]
pub struct ActionEntry {
    pub name: &'static str,
    pub summary: &'static str,
    /// Every status the action can return.
    pub statuses: &'static [&'static str],
    pub check: ParamCheck,
    pub run: ActionFn,
}

impl fmt::Debug for ActionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEntry")
            .field("name", &self.name)
            .field("statuses", &self.statuses)
            .finish_non_exhaustive()
    }
}

/// Serializable description of an entry, for `--list-actions`.
#[derive(Debug, Clone, Serialize)]
pub struct ActionInfo {
    pub name: &'static str,
    pub summary: &'static str,
    pub statuses: &'static [&'static str],
    pub reserved: bool,
}

/// Name-indexed action table.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    entries: BTreeMap<&'static str, ActionEntry>,
}

impl ActionRegistry {
    /// Registry holding only `START`, `END` and `ERROR`.
    pub fn new() -> Self {
        let entries = actions::reserved::entries()
            .into_iter()
            .map(|entry| (entry.name, entry))
            .collect();
        Self { entries }
    }

    /// Registry holding the reserved entries and every built-in action.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for entry in actions::builtin_entries() {
            let added = registry.register(entry);
            debug_assert!(added.is_ok(), "built-in action names are distinct and unreserved");
        }
        registry
    }

    /// Add an action.
    ///
    /// # Errors
    /// `RegistryError::Reserved` for `START`/`END`/`ERROR`,
    /// `RegistryError::Duplicate` for a name already present.
    pub fn register(&mut self, entry: ActionEntry) -> Result<(), RegistryError> {
        if reserved::is_reserved(entry.name) {
            return Err(RegistryError::Reserved(entry.name.to_string()));
        }
        if self.entries.contains_key(entry.name) {
            return Err(RegistryError::Duplicate(entry.name.to_string()));
        }
        self.entries.insert(entry.name, entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ActionEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &ActionEntry> {
        self.entries.values()
    }

    pub fn describe(&self) -> Vec<ActionInfo> {
        self.entries()
            .map(|e| ActionInfo {
                name: e.name,
                summary: e.summary,
                statuses: e.statuses,
                reserved: reserved::is_reserved(e.name),
            })
            .collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct PingParams {
        count: u32,
    }

    impl ActionParams for PingParams {
        fn validate(&self) -> Result<(), String> {
            if self.count == 0 {
                return Err("count must be positive".into());
            }
            Ok(())
        }
    }

    fn ping(_ctx: &mut ActionContext<'_>, _params: &Params) -> Result<&'static str, ActionFault> {
        Ok(status::SUCCESS)
    }

    const PING: ActionEntry = ActionEntry {
        name: "ping",
        summary: "does nothing",
        statuses: &[status::SUCCESS],
        check: check_params::<PingParams>,
        run: ping,
    };

    #[test]
    fn new_registry_has_reserved_entries() {
        let reg = ActionRegistry::new();
        for name in reserved::ALL {
            assert!(reg.contains(name), "{name} missing");
        }
        assert_eq!(reg.get("START").unwrap().statuses, &[status::SUCCESS]);
    }

    #[test]
    fn reserved_names_cannot_be_registered() {
        let mut reg = ActionRegistry::new();
        let entry = ActionEntry {
            name: "ERROR",
            ..PING
        };
        assert_eq!(
            reg.register(entry),
            Err(RegistryError::Reserved("ERROR".into()))
        );
    }

    #[test]
    fn duplicates_rejected() {
        let mut reg = ActionRegistry::new();
        reg.register(PING).unwrap();
        assert_eq!(reg.register(PING), Err(RegistryError::Duplicate("ping".into())));
    }

    #[test]
    fn param_checker_runs_validation() {
        let check = PING.check;
        assert!(check(&toml::from_str("count = 2").unwrap()).is_ok());
        assert!(check(&toml::from_str("count = 0").unwrap()).is_err());
        assert!(check(&toml::from_str("count = 1\nextra = true").unwrap()).is_err());
        assert!(check(&Params::new()).is_err());
    }

    #[test]
    fn builtins_are_listed_in_order() {
        let reg = ActionRegistry::with_builtins();
        let names: Vec<_> = reg.describe().into_iter().map(|i| i.name).collect();
        assert_eq!(
            names,
            vec![
                "END",
                "ERROR",
                "START",
                "cleanup",
                "oscillate",
                "oscillate_force",
                "position_lut",
                "reset_max",
                "reset_min",
                "set_pos",
            ]
        );
    }

    #[test]
    fn describe_serializes_to_json() {
        let json = serde_json::to_string(&ActionRegistry::with_builtins().describe()).unwrap();
        assert!(json.contains("\"name\":\"oscillate\""));
        assert!(json.contains("timeout_reset"));
    }
}
