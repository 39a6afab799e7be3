//! Simulation driver implementation.
//!
//! `SimulatedActuator` implements `ActuatorDriver` on top of the physics in
//! [`super::physics`]. It is fully deterministic: the same sequence of
//! calls always produces the same readings.

use super::physics::{ActuatorModel, SpringContact};
use rig_common::hal::config::RigConfig;
use rig_common::hal::consts::{ADC_MAX_LEVEL, DAC_MAX_LEVEL};
use rig_common::hal::driver::{
    ActuatorDriver, Direction, DriverDiagnostics, HalError, LoadReading,
};
use tracing::{debug, info};

/// Level returned by a garbage position read.
const GARBAGE_LEVEL: f64 = 3.0;

/// Tunables of the simulated rig.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Rod position after `init`; `None` starts mid-stroke between the limits.
    pub start_position: Option<f64>,
    /// Rod travel per read per DAC level.
    pub travel_per_level: f64,
    /// Every n-th position read returns garbage; `None` never.
    pub garbage_every: Option<u64>,
    /// Spring fixture engaged near the top of the stroke.
    pub contact: SpringContact,
    /// Reported load cell board temperature.
    pub local_temp: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            start_position: None,
            travel_per_level: 0.001,
            garbage_every: Some(50),
            contact: SpringContact {
                contact_at: 20000.0,
                rate: 0.05,
            },
            local_temp: 23.5,
        }
    }
}

/// Simulated actuator with relay, DAC, position ADC and load cell.
pub struct SimulatedActuator {
    settings: SimulationSettings,
    model: Option<ActuatorModel>,
    direction: Direction,
    level: f64,
    /// Milliseconds per ADC conversion, from the configured sample rate.
    sample_period_ms: f64,
    diag: DriverDiagnostics,
}

impl SimulatedActuator {
    /// Driver with default settings.
    pub fn new() -> Self {
        Self::with_settings(SimulationSettings::default())
    }

    /// Driver with explicit settings.
    pub fn with_settings(settings: SimulationSettings) -> Self {
        Self {
            settings,
            model: None,
            direction: Direction::Forward,
            level: 0.0,
            sample_period_ms: 0.0,
            diag: DriverDiagnostics::default(),
        }
    }

    /// True rod position, bypassing the ADC.
    pub fn true_position(&self) -> Option<f64> {
        self.model.as_ref().map(ActuatorModel::position)
    }

    fn model_mut(&mut self) -> Result<&mut ActuatorModel, HalError> {
        self.model
            .as_mut()
            .ok_or_else(|| HalError::InvalidCommand("simulation driver not initialized".into()))
    }
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorDriver for SimulatedActuator {
    fn name(&self) -> &'static str {
        super::DRIVER_NAME
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &RigConfig) -> Result<(), HalError> {
        config
            .validate()
            .map_err(|e| HalError::ConfigError(e.to_string()))?;

        let start = self
            .settings
            .start_position
            .unwrap_or_else(|| config.mid_position());
        self.model = Some(ActuatorModel::new(
            start,
            self.settings.travel_per_level,
            0.0,
            ADC_MAX_LEVEL as f64,
        ));
        self.direction = Direction::Forward;
        self.level = 0.0;
        self.sample_period_ms = 1000.0 / f64::from(config.adc_sample_rate);
        self.diag = DriverDiagnostics::default();

        info!(
            start,
            channel = config.adc_channel,
            gain = config.adc_gain,
            sample_rate = config.adc_sample_rate,
            "simulation driver initialized"
        );
        Ok(())
    }

    fn read_position_raw(&mut self) -> Result<f64, HalError> {
        let (direction, level) = (self.direction, self.level);
        let position = self.model_mut()?.advance(direction, level);
        self.diag.position_reads += 1;

        let garbage = self
            .settings
            .garbage_every
            .is_some_and(|n| n > 0 && self.diag.position_reads % n == 0);
        if garbage {
            self.diag.invalid_reads += 1;
            return Ok(GARBAGE_LEVEL);
        }
        Ok(position.round())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), HalError> {
        if direction != self.direction {
            self.diag.direction_changes += 1;
            debug!(%direction, "relay switched");
        }
        self.direction = direction;
        Ok(())
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn set_speed_level(&mut self, level: f64) -> Result<(), HalError> {
        if !(0.0..=DAC_MAX_LEVEL).contains(&level) {
            return Err(HalError::InvalidCommand(format!(
                "DAC level {level} outside 0..={DAC_MAX_LEVEL}"
            )));
        }
        self.level = level;
        self.diag.speed_writes += 1;
        Ok(())
    }

    fn speed_level(&self) -> f64 {
        self.level
    }

    fn read_load(&mut self) -> Result<LoadReading, HalError> {
        let position = self.model_mut()?.position();
        Ok(LoadReading {
            force: self.settings.contact.force(position),
            local_temp: self.settings.local_temp,
            timestamp: (self.diag.position_reads as f64 * self.sample_period_ms) as u64,
        })
    }

    fn release(&mut self) -> Result<(), HalError> {
        self.level = 0.0;
        self.direction = Direction::Forward;
        info!(
            reads = self.diag.position_reads,
            invalid = self.diag.invalid_reads,
            "simulation driver released"
        );
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        Some(self.diag.clone())
    }
}
