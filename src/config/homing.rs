//! Homing configuration from TOML.

use embedded_hal::digital::InputPin;
use serde::Deserialize;

use crate::homing::{HomingParams, DEFAULT_DEBOUNCE_US, DEFAULT_SETTLE_US};
use crate::motion::Direction;
use crate::motor::PinSwitch;

use super::units::StepsPerSec;

/// Homing setup for one axis.
#[derive(Debug, Clone, Deserialize)]
pub struct HomingConfig {
    /// Direction toward the switch.
    pub direction: Direction,

    /// Seek and back-off speed. The final approach runs at 1/8 of this.
    #[serde(rename = "speed_steps_per_sec")]
    pub speed: StepsPerSec,

    /// Travel bound for each phase.
    #[serde(rename = "max_distance_steps")]
    pub max_distance: u32,

    /// Switch reads active when low (pull-up wiring).
    #[serde(default = "default_active_low")]
    pub switch_active_low: bool,

    /// Delay before re-reading a switch transition.
    #[serde(default = "default_debounce_us")]
    pub debounce_us: u32,

    /// Pause after a confirmed transition before the next phase.
    #[serde(default = "default_settle_us")]
    pub settle_us: u32,
}

fn default_active_low() -> bool {
    true
}

fn default_debounce_us() -> u32 {
    DEFAULT_DEBOUNCE_US
}

fn default_settle_us() -> u32 {
    DEFAULT_SETTLE_US
}

impl HomingConfig {
    /// Sequencer parameters for this configuration.
    pub fn params(&self) -> HomingParams {
        HomingParams {
            direction: self.direction,
            speed: self.speed.0,
            max_distance: self.max_distance,
            debounce_us: self.debounce_us,
            settle_us: self.settle_us,
        }
    }

    /// Wrap the switch input with the configured polarity.
    pub fn switch<PIN: InputPin>(&self, pin: PIN) -> PinSwitch<PIN> {
        PinSwitch::new(pin, self.switch_active_low)
    }
}
