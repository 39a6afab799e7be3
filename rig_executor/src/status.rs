//! Status vocabulary shared by actions and transition tables.
//!
//! A status is a plain string. Each action declares the closed set it can
//! produce; transition tables key on those strings or on [`WILDCARD`].

/// Transition key matching any status without a literal entry.
pub const WILDCARD: &str = "*";

pub const SUCCESS: &str = "success";
pub const DONE: &str = "done";
/// Canonical fault status. The executor routes it to `ERROR` itself.
pub const ERROR: &str = "error";

pub const TIMEOUT_STOPPED: &str = "timeout_stopped";
pub const REPEATS_STOPPED: &str = "repeats_stopped";
pub const TIMEOUT_RESET: &str = "timeout_reset";
pub const REPEATS_RESET: &str = "repeats_reset";

/// Reserved action names, present in every routine.
pub mod reserved {
    pub const START: &str = "START";
    pub const END: &str = "END";
    pub const ERROR: &str = "ERROR";

    pub const ALL: [&str; 3] = [START, END, ERROR];

    pub fn is_reserved(name: &str) -> bool {
        ALL.contains(&name)
    }
}
