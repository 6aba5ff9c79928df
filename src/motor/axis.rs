//! Stepper axis.
//!
//! Owns one [`StepEmitter`] and one [`RampScheduler`], holds the configured
//! speed, acceleration and unit scale, and exposes the move/poll/stop API.

use crate::config::units::{StepScale, Unit};
use crate::config::HomingConfig;
use crate::error::{Error, MotorError, PlannerError, Result};
use crate::homing::{HomingParams, HomingSequencer, HomingStatus};
use crate::motion::{MotionPhase, MotionPlan, MoveStatus, RampScheduler};

use super::builder::StepperAxisBuilder;
use super::clock::Clock;
use super::emitter::StepEmitter;
use super::switch::SwitchReader;

/// Default cruise speed in steps/sec.
pub const DEFAULT_SPEED: f32 = 200.0;

/// Default acceleration in steps/sec².
pub const DEFAULT_ACCELERATION: f32 = 200.0;

/// A single stepper axis.
///
/// Generic over the step/direction output `E`. Multiple axes share nothing;
/// interleave their [`poll`](StepperAxis::poll) calls to run them together.
pub struct StepperAxis<E: StepEmitter> {
    /// Step/direction output.
    emitter: E,

    /// Motion state and ramp engine.
    scheduler: RampScheduler,

    /// Axis name for logging/debugging.
    name: heapless::String<32>,

    /// Configured cruise speed in steps/sec.
    speed: f32,

    /// Configured acceleration in steps/sec².
    acceleration: f32,

    /// Steps/physical-unit conversion.
    scale: StepScale,
}

impl<E: StepEmitter> StepperAxis<E> {
    /// Create an axis at position 0 with default speed, acceleration and scale.
    pub fn new(emitter: E) -> Self {
        Self::from_parts(
            emitter,
            heapless::String::try_from("axis").unwrap_or_default(),
            DEFAULT_SPEED,
            DEFAULT_ACCELERATION,
            StepScale::default(),
        )
    }

    /// Start building an axis.
    pub fn builder() -> StepperAxisBuilder<E> {
        StepperAxisBuilder::new()
    }

    pub(crate) fn from_parts(
        emitter: E,
        name: heapless::String<32>,
        speed: f32,
        acceleration: f32,
        scale: StepScale,
    ) -> Self {
        Self {
            emitter,
            scheduler: RampScheduler::new(),
            name,
            speed,
            acceleration,
            scale,
        }
    }

    /// Get the axis name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Configured cruise speed in steps/sec.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Configured acceleration in steps/sec².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Unit scale.
    #[inline]
    pub fn scale(&self) -> &StepScale {
        &self.scale
    }

    /// Set the cruise speed in steps/sec.
    ///
    /// # Errors
    ///
    /// - `MotorError::PreconditionViolation` while a move is active
    /// - `PlannerError::InvalidSpeed` if not positive
    pub fn set_speed(&mut self, steps_per_sec: f32) -> Result<()> {
        self.ensure_idle()?;
        if steps_per_sec.is_nan() || steps_per_sec <= 0.0 {
            return Err(PlannerError::InvalidSpeed(steps_per_sec).into());
        }
        self.speed = steps_per_sec;
        Ok(())
    }

    /// Set the acceleration in steps/sec².
    ///
    /// # Errors
    ///
    /// - `MotorError::PreconditionViolation` while a move is active
    /// - `PlannerError::InvalidAcceleration` if not positive
    pub fn set_acceleration(&mut self, steps_per_sec2: f32) -> Result<()> {
        self.ensure_idle()?;
        if steps_per_sec2.is_nan() || steps_per_sec2 <= 0.0 {
            return Err(PlannerError::InvalidAcceleration(steps_per_sec2).into());
        }
        self.acceleration = steps_per_sec2;
        Ok(())
    }

    /// Set the cruise speed in `unit` per second.
    pub fn set_speed_in(&mut self, speed: f32, unit: Unit) -> Result<()> {
        self.set_speed(self.scale.rate_to_steps(speed, unit))
    }

    /// Set the acceleration in `unit` per second squared.
    pub fn set_acceleration_in(&mut self, acceleration: f32, unit: Unit) -> Result<()> {
        self.set_acceleration(self.scale.rate_to_steps(acceleration, unit))
    }

    /// Replace the unit scale.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PreconditionViolation` while a move is active.
    pub fn set_scale(&mut self, scale: StepScale) -> Result<()> {
        self.ensure_idle()?;
        self.scale = scale;
        Ok(())
    }

    /// Plan and arm a move to `target` with explicit speed and acceleration.
    ///
    /// The configured speed and acceleration are left untouched. The move
    /// starts on the next [`poll`](Self::poll).
    ///
    /// # Errors
    ///
    /// - `MotorError::PreconditionViolation` while a move is active
    /// - `PlannerError::InvalidSpeed` / `InvalidAcceleration` for non-positive values
    /// - `MotorError::PinError` if the direction could not be set
    pub fn plan_move(
        &mut self,
        target: i64,
        cruise_speed: f32,
        acceleration: f32,
    ) -> Result<MotionPlan> {
        self.ensure_idle()?;

        let plan = MotionPlan::plan(self.scheduler.position(), target, cruise_speed, acceleration)?;

        if self.emitter.set_direction(plan.direction.is_forward()).is_err() {
            warn!("direction pin write failed");
            return Err(Error::Motor(MotorError::PinError));
        }

        self.scheduler.start(&plan)?;
        Ok(plan)
    }

    /// Arm a move to an absolute position in steps at the configured speed.
    pub fn move_to(&mut self, target: i64) -> Result<MotionPlan> {
        self.plan_move(target, self.speed, self.acceleration)
    }

    /// Arm a move by a relative number of steps at the configured speed.
    pub fn move_by(&mut self, delta: i64) -> Result<MotionPlan> {
        self.move_to(self.scheduler.position() + delta)
    }

    /// Arm a move to an absolute position expressed in `unit`.
    pub fn move_to_in(&mut self, target: f32, unit: Unit) -> Result<MotionPlan> {
        self.move_to(self.scale.to_steps(target, unit))
    }

    /// Arm a relative move expressed in `unit`.
    pub fn move_by_in(&mut self, delta: f32, unit: Unit) -> Result<MotionPlan> {
        self.move_by(self.scale.to_steps(delta, unit))
    }

    /// Emit a step if one is due at `now_us`.
    #[inline]
    pub fn poll(&mut self, now_us: u32) -> MoveStatus {
        self.scheduler.poll(now_us, &mut self.emitter)
    }

    /// Brake to a stop over the shortest distance the acceleration allows.
    ///
    /// Takes effect on the next poll.
    #[inline]
    pub fn request_stop(&mut self) {
        self.scheduler.request_stop();
    }

    /// End the current move immediately, without a deceleration ramp.
    #[inline]
    pub fn halt(&mut self) {
        self.scheduler.halt();
    }

    /// Current position in steps.
    #[inline]
    pub fn current_position(&self) -> i64 {
        self.scheduler.position()
    }

    /// Current position in `unit`.
    #[inline]
    pub fn position_in(&self, unit: Unit) -> f32 {
        self.scale.from_steps(self.scheduler.position(), unit)
    }

    /// Redefine the current position.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PreconditionViolation` while a move is active.
    pub fn set_current_position(&mut self, steps: i64) -> Result<()> {
        self.scheduler.set_position(steps)?;
        Ok(())
    }

    /// Signed velocity in steps/sec; 0 when stopped.
    #[inline]
    pub fn current_velocity(&self) -> f32 {
        self.scheduler.velocity()
    }

    /// Signed velocity in `unit` per second.
    #[inline]
    pub fn velocity_in(&self, unit: Unit) -> f32 {
        self.scale.rate_from_steps(self.scheduler.velocity(), unit)
    }

    /// Target of the current or most recent move.
    #[inline]
    pub fn target_position(&self) -> i64 {
        self.scheduler.target()
    }

    /// Steps left to the target.
    #[inline]
    pub fn distance_to_target(&self) -> u64 {
        self.scheduler.distance_to_target()
    }

    /// Whether the axis is at its target.
    #[inline]
    pub fn motion_complete(&self) -> bool {
        self.scheduler.distance_to_target() == 0
    }

    /// Whether a move is in progress.
    #[inline]
    pub fn is_move_active(&self) -> bool {
        self.scheduler.is_move_active()
    }

    /// Current velocity-profile segment.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.scheduler.phase()
    }

    /// Read-only view of the motion state.
    #[inline]
    pub fn scheduler(&self) -> &RampScheduler {
        &self.scheduler
    }

    /// Borrow the step emitter.
    #[inline]
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Mutably borrow the step emitter.
    #[inline]
    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }

    /// Consume the axis and return its emitter.
    pub fn into_emitter(self) -> E {
        self.emitter
    }

    /// Poll until the current move completes (blocking).
    pub fn run_to_completion<C: Clock>(&mut self, clock: &mut C) {
        while self.poll(clock.now_micros()) == MoveStatus::Continuing {}
    }

    /// Move to an absolute position and run to completion (blocking).
    pub fn move_to_blocking<C: Clock>(&mut self, target: i64, clock: &mut C) -> Result<()> {
        self.move_to(target)?;
        self.run_to_completion(clock);
        Ok(())
    }

    /// Move by a relative amount and run to completion (blocking).
    pub fn move_by_blocking<C: Clock>(&mut self, delta: i64, clock: &mut C) -> Result<()> {
        self.move_by(delta)?;
        self.run_to_completion(clock);
        Ok(())
    }

    /// Run a full homing sequence against `switch` (blocking).
    ///
    /// On success the position is 0. On failure the position is left where
    /// the axis stopped.
    ///
    /// # Errors
    ///
    /// - Errors from [`HomingSequencer::start`]
    /// - `HomingError::SwitchNotFound` if a phase ran out of travel
    pub fn home<S, C>(&mut self, params: HomingParams, switch: &mut S, clock: &mut C) -> Result<()>
    where
        S: SwitchReader,
        C: Clock,
    {
        let mut sequencer = HomingSequencer::new(params);
        sequencer.start(self, switch)?;

        loop {
            match sequencer.poll(self, switch, clock.now_micros()) {
                HomingStatus::InProgress => {}
                HomingStatus::Homed => return Ok(()),
                HomingStatus::Failed(e) => return Err(e.into()),
            }
        }
    }

    /// Run homing with parameters from configuration (blocking).
    pub fn home_with_config<S, C>(
        &mut self,
        config: &HomingConfig,
        switch: &mut S,
        clock: &mut C,
    ) -> Result<()>
    where
        S: SwitchReader,
        C: Clock,
    {
        self.home(config.params(), switch, clock)
    }

    fn ensure_idle(&self) -> core::result::Result<(), MotorError> {
        if self.scheduler.is_move_active() {
            Err(MotorError::PreconditionViolation)
        } else {
            Ok(())
        }
    }
}
