//! Motion planning.
//!
//! Turns a point-to-point request into an immutable [`MotionPlan`] describing
//! a trapezoidal profile, or a triangular one when the travel is too short to
//! reach cruise speed.

use libm::{roundf, sqrtf};
use serde::Deserialize;

use crate::error::PlannerError;

/// Microseconds per second, the time base of every step period.
pub(crate) const MICROS_PER_SEC: f32 = 1_000_000.0;

/// Direction of axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Increasing step count.
    #[default]
    Forward,
    /// Decreasing step count.
    Backward,
}

impl Direction {
    /// Get direction from a signed step delta. Zero maps to `Forward`.
    #[inline]
    pub fn from_delta(delta: i64) -> Self {
        if delta >= 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    /// The opposite direction.
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// `true` for [`Direction::Forward`].
    #[inline]
    pub fn is_forward(self) -> bool {
        self == Direction::Forward
    }
}

/// Computed plan for a single move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlan {
    /// Absolute target position in steps.
    pub target: i64,

    /// Direction of travel.
    pub direction: Direction,

    /// Total steps to travel (absolute value).
    pub distance: u64,

    /// Period of the first step from rest, in microseconds.
    pub initial_step_period_us: f32,

    /// Period at cruise speed, in microseconds.
    pub cruise_step_period_us: f32,

    /// Steps needed to brake from cruise speed, capped at `distance / 2`.
    pub deceleration_distance: u64,

    /// Whether the travel is too short to reach cruise speed.
    pub triangular: bool,

    /// Acceleration expressed in steps per µs².
    pub acceleration_steps_per_us2: f32,
}

impl MotionPlan {
    /// Plan a move from `current` to `target`.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::InvalidSpeed`] if `cruise_speed <= 0`
    /// - [`PlannerError::InvalidAcceleration`] if `acceleration <= 0`
    ///
    /// NaN inputs are rejected by the same checks.
    pub fn plan(
        current: i64,
        target: i64,
        cruise_speed: f32,
        acceleration: f32,
    ) -> Result<Self, PlannerError> {
        if cruise_speed.is_nan() || cruise_speed <= 0.0 {
            return Err(PlannerError::InvalidSpeed(cruise_speed));
        }
        if acceleration.is_nan() || acceleration <= 0.0 {
            return Err(PlannerError::InvalidAcceleration(acceleration));
        }

        let delta = target - current;
        let distance = delta.unsigned_abs();

        let initial_step_period_us = MICROS_PER_SEC / sqrtf(2.0 * acceleration);
        let cruise_step_period_us = MICROS_PER_SEC / cruise_speed;

        let mut deceleration_distance =
            roundf((cruise_speed * cruise_speed) / (2.0 * acceleration)) as u64;

        // Triangular profile: cruise speed is never reached.
        let triangular = distance > 0 && distance <= deceleration_distance.saturating_mul(2);
        if triangular {
            deceleration_distance = distance / 2;
        }

        Ok(Self {
            target,
            direction: Direction::from_delta(delta),
            distance,
            initial_step_period_us,
            cruise_step_period_us,
            deceleration_distance,
            triangular,
            acceleration_steps_per_us2: acceleration / 1.0e12,
        })
    }

    /// Check if this is a zero-length plan.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.distance == 0
    }
}
