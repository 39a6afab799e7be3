//! Control engine root.
//!
//! Feedback laws and the position feedback filter.

pub mod feedback;
pub mod filters;
