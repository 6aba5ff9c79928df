//! Motion module for stepper-ramp.
//!
//! [`MotionPlan`] turns a target, speed and acceleration into ramp
//! parameters; [`RampScheduler`] advances that ramp one step per due poll.

mod plan;
mod scheduler;

pub use plan::{Direction, MotionPlan};
pub use scheduler::{MotionPhase, MoveStatus, RampScheduler};
