//! Configuration module for stepper-ramp.
//!
//! Provides types for loading and validating axis and homing configurations
//! from TOML files (with `std` feature) or pre-parsed data.

mod axis;
mod homing;
#[cfg(feature = "std")]
mod loader;
mod system;
pub mod units;
mod validation;

pub use axis::AxisConfig;
pub use homing::HomingConfig;
pub use system::SystemConfig;
pub use validation::{validate_axis, validate_config};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{StepScale, StepsPerSec, StepsPerSecSquared, Unit};
