//! Unit types and the steps/physical-unit boundary.
//!
//! The motion core works only in steps. Everything measured in millimeters or
//! revolutions passes through a single [`StepScale`] on its way in or out.

use libm::roundf;
use serde::Deserialize;

use crate::error::ConfigError;

/// Speed in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSec(pub f32);

/// Acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSecSquared(pub f32);

/// Unit a caller-facing quantity is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Raw motor steps.
    Steps,
    /// Millimeters of linear travel.
    Millimeters,
    /// Output shaft revolutions.
    Revolutions,
}

/// Scale factors between steps and physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepScale {
    steps_per_millimeter: f32,
    steps_per_revolution: f32,
}

impl Default for StepScale {
    fn default() -> Self {
        Self {
            steps_per_millimeter: 25.0,
            steps_per_revolution: 200.0,
        }
    }
}

impl StepScale {
    /// Create a scale.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidScale` if either factor is not positive.
    pub fn new(steps_per_millimeter: f32, steps_per_revolution: f32) -> Result<Self, ConfigError> {
        for factor in [steps_per_millimeter, steps_per_revolution] {
            if factor.is_nan() || factor <= 0.0 {
                return Err(ConfigError::InvalidScale(factor));
            }
        }
        Ok(Self {
            steps_per_millimeter,
            steps_per_revolution,
        })
    }

    /// Steps per millimeter.
    #[inline]
    pub fn steps_per_millimeter(&self) -> f32 {
        self.steps_per_millimeter
    }

    /// Steps per revolution.
    #[inline]
    pub fn steps_per_revolution(&self) -> f32 {
        self.steps_per_revolution
    }

    #[inline]
    fn factor(&self, unit: Unit) -> f32 {
        match unit {
            Unit::Steps => 1.0,
            Unit::Millimeters => self.steps_per_millimeter,
            Unit::Revolutions => self.steps_per_revolution,
        }
    }

    /// Convert a position or distance to the nearest whole step.
    #[inline]
    pub fn to_steps(&self, value: f32, unit: Unit) -> i64 {
        roundf(value * self.factor(unit)) as i64
    }

    /// Convert a step count to `unit`.
    #[inline]
    pub fn from_steps(&self, steps: i64, unit: Unit) -> f32 {
        steps as f32 / self.factor(unit)
    }

    /// Convert a rate (speed or acceleration) in `unit` to steps.
    #[inline]
    pub fn rate_to_steps(&self, rate: f32, unit: Unit) -> f32 {
        rate * self.factor(unit)
    }

    /// Convert a rate in steps to `unit`.
    #[inline]
    pub fn rate_from_steps(&self, rate: f32, unit: Unit) -> f32 {
        rate / self.factor(unit)
    }
}
