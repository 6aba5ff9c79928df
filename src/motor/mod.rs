//! Motor module for stepper-ramp.
//!
//! Hardware seams ([`StepEmitter`], [`SwitchReader`], [`Clock`]) and the
//! per-axis [`StepperAxis`] that ties them to the ramp scheduler.

mod axis;
mod builder;
pub mod clock;
mod emitter;
mod switch;

pub use axis::{StepperAxis, DEFAULT_ACCELERATION, DEFAULT_SPEED};
pub use builder::StepperAxisBuilder;
pub use clock::{elapsed_micros, Clock};
pub use emitter::{PinEmitterError, PinStepEmitter, StepEmitter, DEFAULT_PULSE_WIDTH_NS};
pub use switch::{PinSwitch, SwitchReader, SwitchState};

#[cfg(feature = "std")]
pub use clock::StdClock;
