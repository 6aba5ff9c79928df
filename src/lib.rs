//! # stepper-ramp
//!
//! Non-blocking trapezoidal step scheduling and limit-switch homing for
//! STEP/DIR stepper drivers, with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Non-blocking**: one step at most per [`poll`](StepperAxis::poll), driven by a microsecond clock
//! - **Trapezoidal ramps**: per-step period recurrence, triangular when travel is short
//! - **Controlled stop**: brake over the shortest distance the acceleration allows
//! - **Homing**: seek, back-off and slow approach with switch debounce
//! - **embedded-hal 1.0**: `OutputPin` for STEP/DIR, `InputPin` for the switch, `DelayNs` for the pulse
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_ramp::{StepperAxis, SystemConfig};
//!
//! let config: SystemConfig = stepper_ramp::load_config("axes.toml")?;
//!
//! let mut axis = StepperAxis::builder()
//!     .from_config(&config, "x")?
//!     .pins(step_pin, dir_pin, delay)
//!     .build()?;
//!
//! axis.move_to(1600)?;
//! while !axis.poll(clock.now_micros()).is_completed() {
//!     // poll other axes here
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): enables file I/O, TOML parsing and [`StdClock`]
//! - `alloc`: enables heap allocation for no_std with allocator
//! - `defmt`: enables defmt logging for embedded targets
//! - `log`: enables logging through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod error;
pub mod homing;
pub mod motion;
pub mod motor;

// Re-exports for ergonomic API
pub use config::{validate_config, AxisConfig, HomingConfig, SystemConfig};
pub use error::{ConfigError, Error, HomingError, MotorError, PlannerError, Result};
pub use homing::{HomingParams, HomingPhase, HomingSequencer, HomingStatus};
pub use motion::{Direction, MotionPhase, MotionPlan, MoveStatus, RampScheduler};
pub use motor::{
    Clock, PinStepEmitter, PinSwitch, StepEmitter, StepperAxis, StepperAxisBuilder, SwitchReader,
    SwitchState,
};

#[cfg(feature = "std")]
pub use motor::StdClock;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{StepScale, StepsPerSec, StepsPerSecSquared, Unit};
