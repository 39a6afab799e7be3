//! Feedback controller family: None, P, PD, PI, PID.
//!
//! The integral accumulates `error * now` against the raw sample timestamp,
//! not against the sample interval. The derivative term is skipped on the
//! first sample and whenever two samples share a timestamp.

use serde::{Deserialize, Serialize};

/// Controller law and gains, as written in action parameters.
///
/// ```toml
/// controller = { kind = "pid", kp = 0.5, ki = 0.0, kd = 0.1 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ControllerSpec {
    /// Zero correction: the loop drives at the requested speed.
    #[default]
    None,
    P {
        kp: f64,
    },
    Pd {
        kp: f64,
        kd: f64,
    },
    Pi {
        kp: f64,
        ki: f64,
    },
    Pid {
        kp: f64,
        ki: f64,
        kd: f64,
    },
}

impl ControllerSpec {
    /// Check that every gain is finite.
    pub fn validate(&self) -> Result<(), String> {
        let gains: &[(&str, f64)] = match self {
            Self::None => &[],
            Self::P { kp } => &[("kp", *kp)],
            Self::Pd { kp, kd } => &[("kp", *kp), ("kd", *kd)],
            Self::Pi { kp, ki } => &[("kp", *kp), ("ki", *ki)],
            Self::Pid { kp, ki, kd } => &[("kp", *kp), ("ki", *ki), ("kd", *kd)],
        };
        match gains.iter().find(|(_, g)| !g.is_finite()) {
            Some((name, g)) => Err(format!("controller gain {name} must be finite, got {g}")),
            None => Ok(()),
        }
    }

    /// Lowercase law name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::P { .. } => "p",
            Self::Pd { .. } => "pd",
            Self::Pi { .. } => "pi",
            Self::Pid { .. } => "pid",
        }
    }
}

/// History carried between samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedbackState {
    /// Error of the previous sample.
    prev_error: f64,
    /// Timestamp of the previous sample; `None` before the first one.
    prev_time: Option<f64>,
    /// Integral accumulator (PI/PID only).
    integral: f64,
}

impl FeedbackState {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }

    pub fn prev_time(&self) -> Option<f64> {
        self.prev_time
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}

#[inline]
fn derivative(state: &FeedbackState, error: f64, now: f64) -> f64 {
    match state.prev_time {
        Some(prev) if now - prev > 0.0 => (error - state.prev_error) / (now - prev),
        _ => 0.0,
    }
}

/// Compute one correction and advance the history exactly once.
///
/// # Arguments
/// - `state`: error history and accumulator.
/// - `spec`: law and gains.
/// - `error`: `reference - measured`.
/// - `now`: sample timestamp [s].
#[inline]
pub fn feedback_compute(state: &mut FeedbackState, spec: &ControllerSpec, error: f64, now: f64) -> f64 {
    let out = match *spec {
        ControllerSpec::None => 0.0,
        ControllerSpec::P { kp } => kp * error,
        ControllerSpec::Pd { kp, kd } => kp * error + kd * derivative(state, error, now),
        ControllerSpec::Pi { kp, ki } => {
            state.integral += error * now;
            kp * error + ki * state.integral
        }
        ControllerSpec::Pid { kp, ki, kd } => {
            state.integral += error * now;
            kp * error + kd * derivative(state, error, now) + ki * state.integral
        }
    };

    state.prev_error = error;
    state.prev_time = Some(now);
    out
}

/// A controller law with its history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedbackController {
    spec: ControllerSpec,
    state: FeedbackState,
}

impl FeedbackController {
    pub fn new(spec: ControllerSpec) -> Self {
        Self {
            spec,
            state: FeedbackState::default(),
        }
    }

    pub fn spec(&self) -> &ControllerSpec {
        &self.spec
    }

    pub fn state(&self) -> &FeedbackState {
        &self.state
    }

    /// Correction for one measurement against `reference` at time `now`.
    #[inline]
    pub fn update(&mut self, reference: f64, measured: f64, now: f64) -> f64 {
        feedback_compute(&mut self.state, &self.spec, reference - measured, now)
    }

    /// Clear history and accumulator.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

/// A controller wired to an input accessor and an output sink.
///
/// `process` re-samples the input, computes the error against the
/// reference, and forwards the correction to the sink.
pub struct Regulator<I, O>
where
    I: FnMut() -> f64,
    O: FnMut(f64),
{
    controller: FeedbackController,
    input: I,
    output: O,
    reference: f64,
}

impl<I, O> Regulator<I, O>
where
    I: FnMut() -> f64,
    O: FnMut(f64),
{
    pub fn new(spec: ControllerSpec, input: I, output: O, reference: f64) -> Self {
        Self {
            controller: FeedbackController::new(spec),
            input,
            output,
            reference,
        }
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn set_reference(&mut self, reference: f64) {
        self.reference = reference;
    }

    pub fn controller(&self) -> &FeedbackController {
        &self.controller
    }

    /// Run one read → error → correction → emit step. Returns the correction.
    pub fn process(&mut self, now: f64) -> f64 {
        let measured = (self.input)();
        let correction = self.controller.update(self.reference, measured, now);
        (self.output)(correction);
        correction
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_regulator_emits_to_sink() {
        let mut emitted = Vec::new();
        {
            let mut reg = Regulator::new(
                ControllerSpec::P { kp: 2.0 },
                || 4.0,
                |v| emitted.push(v),
                10.0,
            );
            let out = reg.process(1.0);
            assert!((out - 12.0).abs() < 1e-12);
        }
        assert_eq!(emitted, vec![12.0]);
    }

    #[test]
    fn none_emits_zero() {
        let mut c = FeedbackController::new(ControllerSpec::None);
        assert_eq!(c.update(100.0, 0.0, 3.0), 0.0);
        assert_eq!(c.state().prev_time(), Some(3.0));
    }

    #[test]
    fn pid_two_samples_match_closed_form() {
        let mut c = FeedbackController::new(ControllerSpec::Pid {
            kp: 1.0,
            ki: 1.0,
            kd: 1.0,
        });
        let (t0, t1) = (2.0, 2.5);
        let (e0, e1) = (3.0, 1.0);

        c.update(e0, 0.0, t0);
        let out = c.update(e1, 0.0, t1);
        let expected = e1 + (e1 - e0) / (t1 - t0) + (e0 * t0 + e1 * t1);
        assert!((out - expected).abs() < 1e-12);
    }

    #[test]
    fn integral_accumulates_against_raw_timestamp() {
        let mut c = FeedbackController::new(ControllerSpec::Pi { kp: 0.0, ki: 1.0 });
        c.update(1.0, 0.0, 10.0);
        c.update(1.0, 0.0, 11.0);
        assert!((c.state().integral() - 21.0).abs() < 1e-12);
    }

    #[test]
    fn first_sample_has_no_derivative() {
        let mut c = FeedbackController::new(ControllerSpec::Pd { kp: 0.0, kd: 1.0 });
        assert_eq!(c.update(5.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn equal_timestamps_skip_derivative() {
        let mut c = FeedbackController::new(ControllerSpec::Pd { kp: 1.0, kd: 1.0 });
        c.update(1.0, 0.0, 4.0);
        let out = c.update(3.0, 0.0, 4.0);
        assert!(out.is_finite());
        assert!((out - 3.0).abs() < 1e-12);
        assert_eq!(c.state().prev_error(), 3.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut c = FeedbackController::new(ControllerSpec::Pi { kp: 1.0, ki: 1.0 });
        c.update(2.0, 0.0, 1.0);
        c.reset();
        assert_eq!(*c.state(), FeedbackState::default());
    }

    #[test]
    fn reference_is_mutable() {
        let mut reg = Regulator::new(ControllerSpec::P { kp: 1.0 }, || 0.0, |_| {}, 1.0);
        reg.set_reference(7.0);
        assert_eq!(reg.reference(), 7.0);
        assert!((reg.process(0.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn spec_parses_tagged_table() {
        #[derive(Deserialize)]
        struct Holder {
            controller: ControllerSpec,
        }
        let h: Holder = toml::from_str("controller = { kind = \"pd\", kp = 1.5, kd = 0.2 }").unwrap();
        assert_eq!(h.controller, ControllerSpec::Pd { kp: 1.5, kd: 0.2 });
        assert_eq!(h.controller.kind(), "pd");
    }

    #[test]
    fn non_finite_gain_rejected() {
        assert!(ControllerSpec::P { kp: f64::NAN }.validate().is_err());
        assert!(ControllerSpec::Pid { kp: 1.0, ki: f64::INFINITY, kd: 0.0 }.validate().is_err());
        assert!(ControllerSpec::None.validate().is_ok());
    }
}
