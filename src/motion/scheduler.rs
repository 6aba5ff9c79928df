//! Ramp scheduler - time-driven step pulse generation.
//!
//! Advances a [`MotionPlan`] one step at a time on each [`RampScheduler::poll`],
//! using the Leib/Elderman recurrence
//! `p' = p · (1 − a·p²)` to move the step period along the velocity ramp.

use crate::error::MotorError;
use crate::motor::clock::elapsed_micros;
use crate::motor::StepEmitter;

use super::plan::{Direction, MotionPlan, MICROS_PER_SEC};

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// The move still has steps to emit.
    Continuing,
    /// The axis is at its target.
    Completed,
}

impl MoveStatus {
    /// `true` for [`MoveStatus::Completed`].
    #[inline]
    pub fn is_completed(self) -> bool {
        self == MoveStatus::Completed
    }
}

/// Current segment of the velocity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    /// No move active.
    Idle,
    /// Step period shrinking toward the cruise period.
    Accelerating,
    /// Step period held at the cruise period.
    Cruising,
    /// Step period growing toward the stop.
    Decelerating,
}

/// Runtime motion state of one axis.
///
/// Position persists across moves; everything else is re-armed by
/// [`RampScheduler::start`].
#[derive(Debug, Clone)]
pub struct RampScheduler {
    /// Authoritative position in steps.
    position: i64,

    /// Target of the current (or last) move.
    target: i64,

    /// Direction of the current move.
    direction: Direction,

    /// Period at cruise speed in µs; the floor for the ramp.
    cruise_step_period_us: f32,

    /// Period of the most recently emitted step, 0 when stopped.
    current_step_period_us: f32,

    /// Period to wait before the next step.
    next_step_period_us: f32,

    /// Ceiling for the period while braking: the slower of the first step
    /// from rest and the cruise step.
    max_step_period_us: f32,

    /// Signed acceleration in steps/µs²; negative once decelerating.
    acceleration_steps_per_us2: f32,

    /// Remaining distance at which deceleration begins.
    deceleration_distance: u64,

    /// Timestamp of the last emitted step. `None` until the first poll of a move.
    last_step_us: Option<u32>,

    /// Whether a move is in progress.
    move_active: bool,
}

impl Default for RampScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RampScheduler {
    /// Create an idle scheduler at position 0.
    pub const fn new() -> Self {
        Self {
            position: 0,
            target: 0,
            direction: Direction::Forward,
            cruise_step_period_us: 0.0,
            current_step_period_us: 0.0,
            next_step_period_us: 0.0,
            max_step_period_us: 0.0,
            acceleration_steps_per_us2: 0.0,
            deceleration_distance: 0,
            last_step_us: None,
            move_active: false,
        }
    }

    /// Arm a new move.
    ///
    /// The step clock is captured lazily on the first poll.
    ///
    /// # Errors
    ///
    /// Returns [`MotorError::PreconditionViolation`] if a move is already active.
    pub fn start(&mut self, plan: &MotionPlan) -> Result<(), MotorError> {
        if self.move_active {
            return Err(MotorError::PreconditionViolation);
        }

        self.target = plan.target;
        self.direction = plan.direction;
        self.cruise_step_period_us = plan.cruise_step_period_us;
        self.current_step_period_us = 0.0;
        // From rest at v² < 2A the recurrence seed is already faster than cruise.
        self.max_step_period_us = plan
            .initial_step_period_us
            .max(plan.cruise_step_period_us);
        self.next_step_period_us = self.max_step_period_us;
        self.acceleration_steps_per_us2 = plan.acceleration_steps_per_us2;
        self.deceleration_distance = plan.deceleration_distance;
        self.last_step_us = None;
        self.move_active = true;

        debug!(
            "move armed: {} -> {} ({} steps, decel at {})",
            self.position,
            self.target,
            plan.distance,
            self.deceleration_distance
        );

        Ok(())
    }

    /// Emit a step if one is due at `now_us`.
    ///
    /// Cheap when no step is due. A pulse the emitter fails to produce is not
    /// counted and is retried on the next poll.
    pub fn poll<E: StepEmitter>(&mut self, now_us: u32, emitter: &mut E) -> MoveStatus {
        if self.position == self.target {
            self.finish();
            return MoveStatus::Completed;
        }

        let last_step_us = match self.last_step_us {
            Some(t) => t,
            None => {
                self.last_step_us = Some(now_us);
                return MoveStatus::Continuing;
            }
        };

        let elapsed = elapsed_micros(last_step_us, now_us);
        // Whole microseconds, truncated.
        if elapsed < self.next_step_period_us as u32 {
            return MoveStatus::Continuing;
        }

        if self.distance_to_target() == self.deceleration_distance && !self.is_decelerating() {
            self.acceleration_steps_per_us2 = -self.acceleration_steps_per_us2;
            trace!("decelerating at {}", self.position);
        }

        if emitter.pulse_step().is_err() {
            warn!("step pulse failed at {}", self.position);
            return MoveStatus::Continuing;
        }

        self.position += self.direction.sign();
        self.current_step_period_us = self.next_step_period_us;

        let period = self.next_step_period_us;
        let next = period * (1.0 - self.acceleration_steps_per_us2 * period * period);
        // The recurrence diverges once braking outlasts the speed it started
        // from (a stop requested below cruise), so cap it at the slowest ramp step.
        self.next_step_period_us = next
            .max(self.cruise_step_period_us)
            .min(self.max_step_period_us);

        // Measured from the actual fire time, absorbing poll jitter.
        self.last_step_us = Some(now_us);

        if self.position == self.target {
            self.finish();
            debug!("move complete at {}", self.position);
            MoveStatus::Completed
        } else {
            MoveStatus::Continuing
        }
    }

    /// Request a controlled stop.
    ///
    /// Pulls the target in to exactly the deceleration distance ahead so the
    /// next step begins braking. Ignored while idle or already decelerating.
    /// A move that has not emitted its first step simply ends in place.
    pub fn request_stop(&mut self) {
        if !self.move_active || self.is_decelerating() {
            return;
        }

        if self.current_step_period_us == 0.0 {
            self.halt();
            return;
        }

        self.target = self.position + self.direction.sign() * self.deceleration_distance as i64;
        debug!("stop requested, new target {}", self.target);
    }

    /// End the move immediately at the current position.
    pub fn halt(&mut self) {
        self.target = self.position;
        self.finish();
    }

    /// Redefine the current position. Only valid while idle.
    ///
    /// # Errors
    ///
    /// Returns [`MotorError::PreconditionViolation`] if a move is active.
    pub fn set_position(&mut self, steps: i64) -> Result<(), MotorError> {
        if self.move_active {
            return Err(MotorError::PreconditionViolation);
        }
        self.position = steps;
        self.target = steps;
        Ok(())
    }

    /// Current position in steps.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Target of the current or most recent move.
    #[inline]
    pub fn target(&self) -> i64 {
        self.target
    }

    /// Direction of the current or most recent move.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Steps left to the target.
    #[inline]
    pub fn distance_to_target(&self) -> u64 {
        (self.target - self.position).unsigned_abs()
    }

    /// Deceleration distance of the current move.
    #[inline]
    pub fn deceleration_distance(&self) -> u64 {
        self.deceleration_distance
    }

    /// Period of the last emitted step in µs, 0 when stopped.
    #[inline]
    pub fn current_step_period_us(&self) -> f32 {
        self.current_step_period_us
    }

    /// Period the scheduler waits before the next step.
    #[inline]
    pub fn next_step_period_us(&self) -> f32 {
        self.next_step_period_us
    }

    /// Whether a move is in progress.
    #[inline]
    pub fn is_move_active(&self) -> bool {
        self.move_active
    }

    /// Whether the current move has passed its braking point.
    #[inline]
    pub fn is_decelerating(&self) -> bool {
        self.move_active && self.acceleration_steps_per_us2 < 0.0
    }

    /// Signed velocity of the most recent step in steps/sec.
    pub fn velocity(&self) -> f32 {
        if self.current_step_period_us == 0.0 {
            0.0
        } else {
            self.direction.sign() as f32 * MICROS_PER_SEC / self.current_step_period_us
        }
    }

    /// Current segment of the velocity profile.
    pub fn phase(&self) -> MotionPhase {
        if !self.move_active {
            MotionPhase::Idle
        } else if self.is_decelerating() {
            MotionPhase::Decelerating
        } else if self.next_step_period_us <= self.cruise_step_period_us {
            MotionPhase::Cruising
        } else {
            MotionPhase::Accelerating
        }
    }

    fn finish(&mut self) {
        self.current_step_period_us = 0.0;
        self.move_active = false;
    }
}
