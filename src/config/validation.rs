//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{AxisConfig, HomingConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Speeds and accelerations are positive
/// - Steps-per-unit scale factors are positive
/// - Pulse width is non-zero
/// - Homing speed and travel bound are positive
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for (_, axis) in config.axes.iter() {
        validate_axis(axis)?;
    }

    Ok(())
}

/// Validate a single axis configuration.
pub fn validate_axis(config: &AxisConfig) -> Result<()> {
    if !is_positive(config.speed.0) {
        return Err(Error::Config(ConfigError::InvalidSpeed(config.speed.0)));
    }

    if !is_positive(config.acceleration.0) {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            config.acceleration.0,
        )));
    }

    config.scale()?;

    if config.pulse_width_ns == 0 {
        return Err(Error::Config(ConfigError::InvalidPulseWidth(0)));
    }

    if let Some(ref homing) = config.homing {
        validate_homing(homing)?;
    }

    Ok(())
}

fn validate_homing(config: &HomingConfig) -> Result<()> {
    if !is_positive(config.speed.0) {
        return Err(Error::Config(ConfigError::InvalidHomingSpeed(config.speed.0)));
    }

    if config.max_distance == 0 {
        return Err(Error::Config(ConfigError::InvalidMaxDistance(0)));
    }

    Ok(())
}

#[inline]
fn is_positive(value: f32) -> bool {
    value > 0.0
}
