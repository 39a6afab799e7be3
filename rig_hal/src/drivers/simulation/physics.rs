//! Simulated actuator physics.
//!
//! Time in the simulation is counted in position reads: each read advances
//! the rod by `travel_per_level * drive_level` in the relay's direction,
//! stopping hard at the end stops.

use rig_common::hal::driver::Direction;

/// Rod position model.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorModel {
    position: f64,
    travel_per_level: f64,
    low_stop: f64,
    high_stop: f64,
}

impl ActuatorModel {
    /// New model resting at `position`, clamped to the end stops.
    pub fn new(position: f64, travel_per_level: f64, low_stop: f64, high_stop: f64) -> Self {
        Self {
            position: position.clamp(low_stop, high_stop),
            travel_per_level,
            low_stop,
            high_stop,
        }
    }

    /// Current rod position [raw levels].
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Move one step with the given relay state and drive level.
    #[inline]
    pub fn advance(&mut self, direction: Direction, level: f64) -> f64 {
        let step = self.travel_per_level * level.max(0.0);
        let next = match direction {
            Direction::Forward => self.position + step,
            Direction::Backward => self.position - step,
        };
        self.position = next.clamp(self.low_stop, self.high_stop);
        self.position
    }

    /// Place the rod directly.
    pub fn set_position(&mut self, position: f64) {
        self.position = position.clamp(self.low_stop, self.high_stop);
    }
}

/// Linear spring engaged once the rod passes `contact_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringContact {
    /// Rod position where the fixture is touched [raw levels].
    pub contact_at: f64,
    /// Force per level of compression.
    pub rate: f64,
}

impl SpringContact {
    /// Force at rod `position`; zero before contact.
    #[inline]
    pub fn force(&self, position: f64) -> f64 {
        ((position - self.contact_at) * self.rate).max(0.0)
    }
}
