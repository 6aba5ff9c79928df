//! Limit-switch homing.
//!
//! [`HomingSequencer`] drives a [`StepperAxis`](crate::motor::StepperAxis)
//! through seek, back-off and slow-approach phases and zeroes the position
//! at the switch. [`StepperAxis::home`](crate::motor::StepperAxis::home)
//! wraps it in a blocking loop.

mod params;
mod sequencer;

pub use params::{HomingParams, DEFAULT_DEBOUNCE_US, DEFAULT_SETTLE_US, SLOW_APPROACH_DIVISOR};
pub use sequencer::{HomingPhase, HomingSequencer, HomingStatus};
