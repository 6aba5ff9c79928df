//! Axis configuration from TOML.

use heapless::String;
use serde::Deserialize;

use super::homing::HomingConfig;
use super::units::{StepScale, StepsPerSec, StepsPerSecSquared};
use crate::error::ConfigError;
use crate::motor::DEFAULT_PULSE_WIDTH_NS;

/// Complete axis configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Steps per millimeter of linear travel.
    #[serde(default = "default_steps_per_millimeter")]
    pub steps_per_millimeter: f32,

    /// Steps per output revolution.
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: f32,

    /// Cruise speed in steps per second.
    #[serde(default = "default_speed", rename = "speed_steps_per_sec")]
    pub speed: StepsPerSec,

    /// Acceleration (and deceleration) in steps per second squared.
    #[serde(default = "default_acceleration", rename = "acceleration_steps_per_sec2")]
    pub acceleration: StepsPerSecSquared,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// STEP pulse width in nanoseconds.
    #[serde(default = "default_pulse_width_ns")]
    pub pulse_width_ns: u32,

    /// Optional homing setup.
    #[serde(default)]
    pub homing: Option<HomingConfig>,
}

fn default_steps_per_millimeter() -> f32 {
    25.0
}

fn default_steps_per_revolution() -> f32 {
    200.0
}

fn default_speed() -> StepsPerSec {
    StepsPerSec(200.0)
}

fn default_acceleration() -> StepsPerSecSquared {
    StepsPerSecSquared(200.0)
}

fn default_pulse_width_ns() -> u32 {
    DEFAULT_PULSE_WIDTH_NS
}

impl AxisConfig {
    /// Configuration with every default and the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: String::try_from(name).unwrap_or_default(),
            steps_per_millimeter: default_steps_per_millimeter(),
            steps_per_revolution: default_steps_per_revolution(),
            speed: default_speed(),
            acceleration: default_acceleration(),
            invert_direction: false,
            pulse_width_ns: default_pulse_width_ns(),
            homing: None,
        }
    }

    /// Scale factors for unit conversion.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidScale` if either factor is not positive.
    pub fn scale(&self) -> Result<StepScale, ConfigError> {
        StepScale::new(self.steps_per_millimeter, self.steps_per_revolution)
    }
}
