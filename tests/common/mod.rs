//! Recording fakes shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use stepper_ramp::{Clock, MoveStatus, StepEmitter, StepperAxis, SwitchReader, SwitchState};

/// Emitter that records every pulse and mirrors the carriage position into a
/// shared cell a [`LimitSwitch`] can observe.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    pub carriage: Rc<Cell<i64>>,
    pub forward: bool,
    pub pulses: u64,
    pub direction_writes: u32,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepEmitter for RecordingEmitter {
    type Error = Infallible;

    fn set_direction(&mut self, forward: bool) -> Result<(), Infallible> {
        self.forward = forward;
        self.direction_writes += 1;
        Ok(())
    }

    fn pulse_step(&mut self) -> Result<(), Infallible> {
        self.pulses += 1;
        let step = if self.forward { 1 } else { -1 };
        self.carriage.set(self.carriage.get() + step);
        Ok(())
    }
}

/// Switch mounted at a fixed carriage position, active at and beyond it.
pub struct LimitSwitch {
    carriage: Rc<Cell<i64>>,
    at: i64,
    below: bool,
    pub reads: u32,
}

impl LimitSwitch {
    /// Switch that is active for every position `<= at`.
    pub fn below(carriage: Rc<Cell<i64>>, at: i64) -> Self {
        Self { carriage, at, below: true, reads: 0 }
    }

    /// Switch that is active for every position `>= at`.
    pub fn above(carriage: Rc<Cell<i64>>, at: i64) -> Self {
        Self { carriage, at, below: false, reads: 0 }
    }
}

impl SwitchReader for LimitSwitch {
    fn read(&mut self) -> SwitchState {
        self.reads += 1;
        let pos = self.carriage.get();
        let active = if self.below { pos <= self.at } else { pos >= self.at };
        if active {
            SwitchState::Active
        } else {
            SwitchState::Inactive
        }
    }
}

/// Switch that turns active after a fixed number of reads and stays there.
pub struct AfterReads {
    pub remaining: u32,
}

impl SwitchReader for AfterReads {
    fn read(&mut self) -> SwitchState {
        if self.remaining == 0 {
            SwitchState::Active
        } else {
            self.remaining -= 1;
            SwitchState::Inactive
        }
    }
}

/// Switch that never triggers.
pub struct Disconnected;

impl SwitchReader for Disconnected {
    fn read(&mut self) -> SwitchState {
        SwitchState::Inactive
    }
}

/// Clock that advances by a fixed tick on every reading.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    pub now: u32,
    pub tick: u32,
}

impl TickClock {
    pub fn new(tick: u32) -> Self {
        Self { now: 0, tick }
    }

    pub fn starting_at(now: u32, tick: u32) -> Self {
        Self { now, tick }
    }
}

impl Clock for TickClock {
    fn now_micros(&mut self) -> u32 {
        let now = self.now;
        self.now = self.now.wrapping_add(self.tick);
        now
    }
}

/// An axis whose emitter mirrors into the returned carriage cell.
pub fn axis() -> (StepperAxis<RecordingEmitter>, Rc<Cell<i64>>) {
    let emitter = RecordingEmitter::new();
    let carriage = emitter.carriage.clone();
    (StepperAxis::new(emitter), carriage)
}

/// Poll until completion, returning the period used for each emitted step.
pub fn run_recording_periods<E: StepEmitter>(
    axis: &mut StepperAxis<E>,
    clock: &mut TickClock,
) -> Vec<f32> {
    let mut periods = Vec::new();
    loop {
        let before = axis.current_position();
        let period = axis.scheduler().next_step_period_us();
        let status = axis.poll(clock.now_micros());
        if axis.current_position() != before {
            periods.push(period);
        }
        if status == MoveStatus::Completed {
            return periods;
        }
    }
}
