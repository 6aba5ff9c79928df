//! Homing parameters.

use crate::motion::Direction;

/// Default switch debounce interval in µs.
pub const DEFAULT_DEBOUNCE_US: u32 = 1_000;

/// Default pause after a confirmed switch transition in µs.
pub const DEFAULT_SETTLE_US: u32 = 80_000;

/// Divisor applied to the seek speed for the final approach.
pub const SLOW_APPROACH_DIVISOR: f32 = 8.0;

/// Parameters for one homing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingParams {
    /// Direction toward the switch.
    pub direction: Direction,

    /// Seek and back-off speed in steps/sec.
    pub speed: f32,

    /// Travel bound for each phase in steps.
    pub max_distance: u32,

    /// Delay before re-reading a switch transition in µs.
    pub debounce_us: u32,

    /// Pause after a confirmed transition in µs.
    pub settle_us: u32,
}

impl HomingParams {
    /// Parameters with default debounce and settle timing.
    pub fn new(direction: Direction, speed: f32, max_distance: u32) -> Self {
        Self {
            direction,
            speed,
            max_distance,
            debounce_us: DEFAULT_DEBOUNCE_US,
            settle_us: DEFAULT_SETTLE_US,
        }
    }

    /// Override the debounce interval.
    pub fn with_debounce_us(mut self, debounce_us: u32) -> Self {
        self.debounce_us = debounce_us;
        self
    }

    /// Override the settle pause.
    pub fn with_settle_us(mut self, settle_us: u32) -> Self {
        self.settle_us = settle_us;
        self
    }

    /// Speed used for the final approach.
    #[inline]
    pub fn approach_speed(&self) -> f32 {
        self.speed / SLOW_APPROACH_DIVISOR
    }

    /// Signed relative move toward the switch.
    #[inline]
    pub(crate) fn toward_switch(&self) -> i64 {
        i64::from(self.max_distance) * self.direction.sign()
    }
}
