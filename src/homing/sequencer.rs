//! Three-phase homing state machine.
//!
//! Seek toward the switch, back off until it releases, then approach again
//! at 1/8 speed. Every switch transition is re-read after a debounce interval
//! before it is trusted; a reading that does not hold resumes the same move.
//! Each phase is bounded by the maximum travel distance, which is the only
//! failure path.

use crate::error::{Error, HomingError, MotorError, PlannerError, Result};
use crate::motor::clock::elapsed_micros;
use crate::motor::{StepEmitter, StepperAxis, SwitchReader};

use super::params::HomingParams;

/// Homing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingPhase {
    /// Moving toward the switch
    SeekingSwitch,
    /// Switch read active during the seek, waiting to re-read
    ConfirmSeek,
    /// Moving away from the switch
    BackingOff,
    /// Switch read inactive during the back-off, waiting to re-read
    ConfirmBackoff,
    /// Moving toward the switch at reduced speed
    SlowApproach,
    /// Switch read active during the approach, waiting to re-read
    ConfirmApproach,
    /// Position zeroed at the switch
    Homed,
    /// A phase ran out of travel
    Failed,
}

impl HomingPhase {
    /// Short name for logging.
    pub fn name(self) -> &'static str {
        match self {
            HomingPhase::SeekingSwitch => "seeking",
            HomingPhase::ConfirmSeek => "confirm-seek",
            HomingPhase::BackingOff => "backing-off",
            HomingPhase::ConfirmBackoff => "confirm-backoff",
            HomingPhase::SlowApproach => "slow-approach",
            HomingPhase::ConfirmApproach => "confirm-approach",
            HomingPhase::Homed => "homed",
            HomingPhase::Failed => "failed",
        }
    }

    /// Whether the sequence has finished.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, HomingPhase::Homed | HomingPhase::Failed)
    }
}

/// Result of one [`HomingSequencer::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingStatus {
    /// Keep polling
    InProgress,
    /// Position is now 0 at the switch
    Homed,
    /// The sequence failed; position was not zeroed
    Failed(HomingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    None,
    Debounce { since: u32 },
    Settle { since: u32 },
}

/// Non-blocking homing sequencer for one axis.
///
/// Call [`start`](Self::start) once, then [`poll`](Self::poll) from the
/// caller loop until it returns a terminal status. The axis is stepped from
/// inside `poll`, so other axes can be polled in the same loop.
#[derive(Debug, Clone)]
pub struct HomingSequencer {
    params: HomingParams,
    phase: HomingPhase,
    wait: Wait,
    /// Axis speed captured by `start`, `None` until then.
    original_speed: Option<f32>,
    status: HomingStatus,
}

impl HomingSequencer {
    /// Create a sequencer. Nothing moves until [`start`](Self::start).
    pub fn new(params: HomingParams) -> Self {
        Self {
            params,
            phase: HomingPhase::SeekingSwitch,
            wait: Wait::None,
            original_speed: None,
            status: HomingStatus::InProgress,
        }
    }

    /// Parameters of this run.
    #[inline]
    pub fn params(&self) -> &HomingParams {
        &self.params
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> HomingPhase {
        self.phase
    }

    /// Status as of the last poll.
    #[inline]
    pub fn status(&self) -> HomingStatus {
        self.status
    }

    /// Begin homing.
    ///
    /// Remembers the axis's configured speed, then issues the seek move. If
    /// the switch already reads active, the seek is skipped and the sequence
    /// starts by backing off.
    ///
    /// # Errors
    ///
    /// - `MotorError::PreconditionViolation` if the axis is moving
    /// - `PlannerError::InvalidSpeed` if the homing speed is not positive
    /// - `MotorError::PinError` if the direction could not be set
    pub fn start<E, S>(&mut self, axis: &mut StepperAxis<E>, switch: &mut S) -> Result<()>
    where
        E: StepEmitter,
        S: SwitchReader,
    {
        if axis.is_move_active() {
            return Err(MotorError::PreconditionViolation.into());
        }

        let speed = self.params.speed;
        if speed.is_nan() || speed <= 0.0 || self.params.approach_speed() <= 0.0 {
            return Err(PlannerError::InvalidSpeed(speed).into());
        }

        self.original_speed = Some(axis.speed());
        self.wait = Wait::None;
        self.status = HomingStatus::InProgress;

        let first = if switch.read().is_active() {
            info!("homing {}: switch already active", axis.name());
            HomingPhase::BackingOff
        } else {
            HomingPhase::SeekingSwitch
        };

        info!(
            "homing {}: start, {} steps max at {} steps/s",
            axis.name(),
            self.params.max_distance,
            speed
        );

        if let Err(e) = self.issue_move(axis, first) {
            self.restore_speed(axis);
            self.original_speed = None;
            return Err(e);
        }

        Ok(())
    }

    /// Advance the sequence.
    ///
    /// Polls the axis once, reads the switch, and handles any due debounce
    /// or settle deadline. Terminal statuses are sticky.
    pub fn poll<E, S>(
        &mut self,
        axis: &mut StepperAxis<E>,
        switch: &mut S,
        now_us: u32,
    ) -> HomingStatus
    where
        E: StepEmitter,
        S: SwitchReader,
    {
        if self.phase.is_terminal() {
            return self.status;
        }

        if self.original_speed.is_none() {
            warn!("homing {}: polled before start", axis.name());
            self.enter(HomingPhase::Failed);
            self.status = HomingStatus::Failed(HomingError::NotStarted);
            return self.status;
        }

        if let Wait::Settle { since } = self.wait {
            if elapsed_micros(since, now_us) < self.params.settle_us {
                return self.status;
            }
            self.wait = Wait::None;
            self.advance(axis);
            return self.status;
        }

        let motion = axis.poll(now_us);

        match self.phase {
            HomingPhase::SeekingSwitch | HomingPhase::SlowApproach => {
                if switch.read().is_active() {
                    self.begin_confirm(now_us);
                } else if motion.is_completed() {
                    self.fail(axis, HomingError::SwitchNotFound { phase: self.phase });
                }
            }
            HomingPhase::BackingOff => {
                if !switch.read().is_active() {
                    self.begin_confirm(now_us);
                } else if motion.is_completed() {
                    self.fail(axis, HomingError::SwitchNotFound { phase: self.phase });
                }
            }
            HomingPhase::ConfirmSeek | HomingPhase::ConfirmBackoff | HomingPhase::ConfirmApproach => {
                if let Wait::Debounce { since } = self.wait {
                    if elapsed_micros(since, now_us) < self.params.debounce_us {
                        return self.status;
                    }
                }

                let want_active = self.phase != HomingPhase::ConfirmBackoff;
                if switch.read().is_active() == want_active {
                    axis.halt();
                    self.wait = Wait::Settle { since: now_us };
                    debug!("homing {}: transition confirmed at {}", axis.name(), axis.current_position());
                } else {
                    self.wait = Wait::None;
                    self.enter(resumed_phase(self.phase));
                }
            }
            HomingPhase::Homed | HomingPhase::Failed => {}
        }

        self.status
    }

    fn begin_confirm(&mut self, now_us: u32) {
        let next = match self.phase {
            HomingPhase::SeekingSwitch => HomingPhase::ConfirmSeek,
            HomingPhase::BackingOff => HomingPhase::ConfirmBackoff,
            _ => HomingPhase::ConfirmApproach,
        };
        self.wait = Wait::Debounce { since: now_us };
        self.enter(next);
    }

    /// Run the action that follows a confirmed, settled transition.
    fn advance<E: StepEmitter>(&mut self, axis: &mut StepperAxis<E>) {
        let next = match self.phase {
            HomingPhase::ConfirmSeek => HomingPhase::BackingOff,
            HomingPhase::ConfirmBackoff => HomingPhase::SlowApproach,
            _ => {
                self.finish(axis);
                return;
            }
        };

        if let Err(e) = self.issue_move(axis, next) {
            let cause = match e {
                Error::Motor(m) => m,
                _ => MotorError::PreconditionViolation,
            };
            self.fail(axis, HomingError::MoveRejected { phase: next, cause });
        }
    }

    fn issue_move<E: StepEmitter>(&mut self, axis: &mut StepperAxis<E>, phase: HomingPhase) -> Result<()> {
        let toward = self.params.toward_switch();
        let (speed, delta) = match phase {
            HomingPhase::BackingOff => (self.params.speed, -toward),
            HomingPhase::SlowApproach => (self.params.approach_speed(), toward),
            _ => (self.params.speed, toward),
        };

        axis.set_speed(speed)?;
        axis.move_by(delta)?;
        self.enter(phase);
        Ok(())
    }

    fn finish<E: StepEmitter>(&mut self, axis: &mut StepperAxis<E>) {
        if axis.set_current_position(0).is_err() {
            warn!("homing {}: could not zero position", axis.name());
        }
        self.restore_speed(axis);
        self.enter(HomingPhase::Homed);
        self.status = HomingStatus::Homed;
    }

    fn fail<E: StepEmitter>(&mut self, axis: &mut StepperAxis<E>, error: HomingError) {
        axis.halt();
        self.restore_speed(axis);
        warn!(
            "homing {}: failed during {} at {}",
            axis.name(),
            self.phase.name(),
            axis.current_position()
        );
        self.wait = Wait::None;
        self.enter(HomingPhase::Failed);
        self.status = HomingStatus::Failed(error);
    }

    fn restore_speed<E: StepEmitter>(&self, axis: &mut StepperAxis<E>) {
        if let Some(speed) = self.original_speed {
            if axis.set_speed(speed).is_err() {
                warn!("homing {}: could not restore speed", axis.name());
            }
        }
    }

    fn enter(&mut self, phase: HomingPhase) {
        if phase != self.phase {
            info!("homing: {} -> {}", self.phase.name(), phase.name());
        }
        self.phase = phase;
    }
}

/// Moving phase to fall back to when a confirm read does not hold.
fn resumed_phase(phase: HomingPhase) -> HomingPhase {
    match phase {
        HomingPhase::ConfirmSeek => HomingPhase::SeekingSwitch,
        HomingPhase::ConfirmBackoff => HomingPhase::BackingOff,
        HomingPhase::ConfirmApproach => HomingPhase::SlowApproach,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Direction;
    use crate::motor::{SwitchState, DEFAULT_SPEED};
    use core::cell::Cell;
    use std::rc::Rc;
    use std::vec::Vec;

    /// Emitter that mirrors the physical carriage position.
    struct Carriage {
        pos: Rc<Cell<i64>>,
        forward: bool,
        /// DIR write fails when turning forward.
        reject_forward: bool,
    }

    impl StepEmitter for Carriage {
        type Error = ();

        fn set_direction(&mut self, forward: bool) -> core::result::Result<(), ()> {
            if forward && self.reject_forward {
                return Err(());
            }
            self.forward = forward;
            Ok(())
        }

        fn pulse_step(&mut self) -> core::result::Result<(), ()> {
            let step = if self.forward { 1 } else { -1 };
            self.pos.set(self.pos.get() + step);
            Ok(())
        }
    }

    struct Scripted<F: FnMut() -> SwitchState>(F);

    impl<F: FnMut() -> SwitchState> SwitchReader for Scripted<F> {
        fn read(&mut self) -> SwitchState {
            (self.0)()
        }
    }

    fn setup() -> (StepperAxis<Carriage>, Rc<Cell<i64>>) {
        let pos = Rc::new(Cell::new(0));
        let axis = StepperAxis::new(Carriage {
            pos: pos.clone(),
            forward: true,
            reject_forward: false,
        });
        (axis, pos)
    }

    /// Switch that trips at -50 and releases above -40. Read number `glitch.1`
    /// (counted from 0) of activation number `glitch.0` comes back inverted.
    struct Bouncy {
        pos: Rc<Cell<i64>>,
        tripped: bool,
        trips: u32,
        reads: u32,
        glitch: (u32, u32),
        glitched: bool,
    }

    impl Bouncy {
        fn new(pos: Rc<Cell<i64>>, glitch: (u32, u32)) -> Self {
            Self { pos, tripped: false, trips: 0, reads: 0, glitch, glitched: false }
        }
    }

    impl SwitchReader for Bouncy {
        fn read(&mut self) -> SwitchState {
            let p = self.pos.get();
            let was = self.tripped;
            self.tripped = if was { p <= -40 } else { p <= -50 };
            if self.tripped && !was {
                self.trips += 1;
                self.reads = 0;
            }

            let mut active = self.tripped;
            if self.tripped {
                if (self.trips, self.reads) == self.glitch {
                    active = false;
                    self.glitched = true;
                }
                self.reads += 1;
            }

            if active {
                SwitchState::Active
            } else {
                SwitchState::Inactive
            }
        }
    }

    fn switch_at(pos: Rc<Cell<i64>>, at: i64) -> Scripted<impl FnMut() -> SwitchState> {
        Scripted(move || {
            if pos.get() <= at {
                SwitchState::Active
            } else {
                SwitchState::Inactive
            }
        })
    }

    fn params(max_distance: u32) -> HomingParams {
        HomingParams::new(Direction::Backward, 400.0, max_distance)
    }

    fn run<S: SwitchReader>(
        seq: &mut HomingSequencer,
        axis: &mut StepperAxis<Carriage>,
        switch: &mut S,
    ) -> (HomingStatus, Vec<HomingPhase>) {
        let mut phases = Vec::new();
        phases.push(seq.phase());
        let mut now: u32 = 0;

        for _ in 0..2_000_000 {
            let status = seq.poll(axis, switch, now);
            if phases.last() != Some(&seq.phase()) {
                phases.push(seq.phase());
            }
            if status != HomingStatus::InProgress {
                return (status, phases);
            }
            now = now.wrapping_add(50);
        }
        panic!("homing did not terminate");
    }

    #[test]
    fn test_homes_through_all_phases() {
        let (mut axis, pos) = setup();
        let mut switch = switch_at(pos.clone(), -50);
        let mut seq = HomingSequencer::new(params(1000));

        seq.start(&mut axis, &mut switch).unwrap();
        let (status, phases) = run(&mut seq, &mut axis, &mut switch);

        assert_eq!(status, HomingStatus::Homed);
        assert_eq!(
            phases,
            [
                HomingPhase::SeekingSwitch,
                HomingPhase::ConfirmSeek,
                HomingPhase::BackingOff,
                HomingPhase::ConfirmBackoff,
                HomingPhase::SlowApproach,
                HomingPhase::ConfirmApproach,
                HomingPhase::Homed,
            ]
        );
        assert_eq!(axis.current_position(), 0);
        assert_eq!(pos.get(), -50);
        assert!(!axis.is_move_active());
        assert_eq!(axis.speed(), DEFAULT_SPEED);
    }

    #[test]
    fn test_fails_when_switch_never_triggers() {
        let (mut axis, pos) = setup();
        let mut switch = Scripted(|| SwitchState::Inactive);
        let mut seq = HomingSequencer::new(params(100));

        seq.start(&mut axis, &mut switch).unwrap();
        let (status, _) = run(&mut seq, &mut axis, &mut switch);

        assert_eq!(
            status,
            HomingStatus::Failed(HomingError::SwitchNotFound {
                phase: HomingPhase::SeekingSwitch
            })
        );
        assert_eq!(seq.phase(), HomingPhase::Failed);
        // Not zeroed: the counter still tracks the carriage.
        assert_eq!(axis.current_position(), -100);
        assert_eq!(pos.get(), -100);
        assert_eq!(axis.speed(), DEFAULT_SPEED);

        // Terminal status is sticky.
        assert_eq!(seq.poll(&mut axis, &mut switch, 0), status);
    }

    #[test]
    fn test_skips_seek_when_switch_already_active() {
        let (mut axis, pos) = setup();
        let mut switch = switch_at(pos.clone(), 0);
        let mut seq = HomingSequencer::new(params(1000));

        seq.start(&mut axis, &mut switch).unwrap();
        assert_eq!(seq.phase(), HomingPhase::BackingOff);
        assert_eq!(axis.target_position(), 1000);

        let (status, phases) = run(&mut seq, &mut axis, &mut switch);
        assert_eq!(status, HomingStatus::Homed);
        assert!(!phases.contains(&HomingPhase::SeekingSwitch));
        assert_eq!(axis.current_position(), 0);
    }

    #[test]
    fn test_bounce_resumes_seek() {
        let (mut axis, pos) = setup();
        let glitched = Rc::new(Cell::new(false));
        let carriage = pos.clone();
        let flag = glitched.clone();
        let mut switch = Scripted(move || {
            let p = carriage.get();
            if p == -10 && !flag.get() {
                flag.set(true);
                SwitchState::Active
            } else if p <= -50 {
                SwitchState::Active
            } else {
                SwitchState::Inactive
            }
        });
        let mut seq = HomingSequencer::new(params(1000));

        seq.start(&mut axis, &mut switch).unwrap();
        let (status, phases) = run(&mut seq, &mut axis, &mut switch);

        assert!(glitched.get());
        assert_eq!(status, HomingStatus::Homed);
        assert_eq!(
            &phases[..4],
            [
                HomingPhase::SeekingSwitch,
                HomingPhase::ConfirmSeek,
                HomingPhase::SeekingSwitch,
                HomingPhase::ConfirmSeek,
            ]
        );
        assert_eq!(pos.get(), -50);
    }

    #[test]
    fn test_bounce_resumes_back_off() {
        let (mut axis, pos) = setup();
        // Reads of the first activation: seek, seek confirm, then the first
        // back-off read drops out.
        let mut switch = Bouncy::new(pos.clone(), (1, 2));
        let mut seq = HomingSequencer::new(params(1000));

        seq.start(&mut axis, &mut switch).unwrap();
        let (status, phases) = run(&mut seq, &mut axis, &mut switch);

        assert!(switch.glitched);
        assert_eq!(status, HomingStatus::Homed);
        assert_eq!(
            phases,
            [
                HomingPhase::SeekingSwitch,
                HomingPhase::ConfirmSeek,
                HomingPhase::BackingOff,
                HomingPhase::ConfirmBackoff,
                HomingPhase::BackingOff,
                HomingPhase::ConfirmBackoff,
                HomingPhase::SlowApproach,
                HomingPhase::ConfirmApproach,
                HomingPhase::Homed,
            ]
        );
        assert_eq!(axis.current_position(), 0);
    }

    #[test]
    fn test_bounce_resumes_slow_approach() {
        let (mut axis, pos) = setup();
        // The confirm read of the second activation drops out.
        let mut switch = Bouncy::new(pos.clone(), (2, 1));
        let mut seq = HomingSequencer::new(params(1000));

        seq.start(&mut axis, &mut switch).unwrap();
        let (status, phases) = run(&mut seq, &mut axis, &mut switch);

        assert!(switch.glitched);
        assert_eq!(status, HomingStatus::Homed);
        assert_eq!(
            phases,
            [
                HomingPhase::SeekingSwitch,
                HomingPhase::ConfirmSeek,
                HomingPhase::BackingOff,
                HomingPhase::ConfirmBackoff,
                HomingPhase::SlowApproach,
                HomingPhase::ConfirmApproach,
                HomingPhase::SlowApproach,
                HomingPhase::ConfirmApproach,
                HomingPhase::Homed,
            ]
        );
        assert_eq!(axis.current_position(), 0);
        assert_eq!(axis.speed(), DEFAULT_SPEED);
    }

    #[test]
    fn test_fails_when_approach_runs_out_of_travel() {
        let (mut axis, pos) = setup();
        let carriage = pos.clone();
        let mut seen = false;
        let mut released = false;
        // Only the first activation is ever reported.
        let mut switch = Scripted(move || {
            let active = !released && carriage.get() <= -50;
            if active {
                seen = true;
            } else if seen {
                released = true;
            }
            if active {
                SwitchState::Active
            } else {
                SwitchState::Inactive
            }
        });
        let mut seq = HomingSequencer::new(params(100));

        seq.start(&mut axis, &mut switch).unwrap();
        let (status, phases) = run(&mut seq, &mut axis, &mut switch);

        assert_eq!(
            status,
            HomingStatus::Failed(HomingError::SwitchNotFound {
                phase: HomingPhase::SlowApproach
            })
        );
        assert!(phases.contains(&HomingPhase::SlowApproach));
        assert_eq!(axis.current_position(), pos.get());
        assert!(pos.get() < -100);
        assert_eq!(axis.speed(), DEFAULT_SPEED);
    }

    #[test]
    fn test_rejected_back_off_move_fails() {
        let (mut axis, pos) = setup();
        axis.emitter_mut().reject_forward = true;
        let mut switch = switch_at(pos.clone(), -50);
        let mut seq = HomingSequencer::new(params(1000));

        seq.start(&mut axis, &mut switch).unwrap();
        let (status, _) = run(&mut seq, &mut axis, &mut switch);

        assert_eq!(
            status,
            HomingStatus::Failed(HomingError::MoveRejected {
                phase: HomingPhase::BackingOff,
                cause: MotorError::PinError,
            })
        );
        assert_eq!(seq.phase(), HomingPhase::Failed);
        assert!(!axis.is_move_active());
        assert_eq!(axis.speed(), DEFAULT_SPEED);
    }

    #[test]
    fn test_poll_before_start_leaves_axis_alone() {
        let (mut axis, pos) = setup();
        axis.set_speed(250.0).unwrap();
        axis.move_to(30).unwrap();
        let mut switch = switch_at(pos, -50);
        let mut seq = HomingSequencer::new(params(1000));

        assert_eq!(
            seq.poll(&mut axis, &mut switch, 0),
            HomingStatus::Failed(HomingError::NotStarted)
        );
        assert!(axis.is_move_active());
        assert_eq!(axis.target_position(), 30);
        // Untouched by the failed sequence.
        axis.halt();
        assert_eq!(axis.speed(), 250.0);
    }

    #[test]
    fn test_slow_approach_speed() {
        let (mut axis, pos) = setup();
        let mut switch = switch_at(pos, -50);
        let mut seq = HomingSequencer::new(params(1000));
        seq.start(&mut axis, &mut switch).unwrap();

        let mut now: u32 = 0;
        while seq.phase() != HomingPhase::SlowApproach {
            seq.poll(&mut axis, &mut switch, now);
            now += 50;
        }

        assert_eq!(axis.speed(), 50.0);
        assert_eq!(axis.target_position(), axis.current_position() - 1000);
    }

    #[test]
    fn test_start_preconditions() {
        let (mut axis, pos) = setup();
        let mut switch = switch_at(pos, -50);

        let mut seq = HomingSequencer::new(HomingParams::new(Direction::Backward, 0.0, 100));
        assert!(matches!(
            seq.start(&mut axis, &mut switch),
            Err(Error::Planner(PlannerError::InvalidSpeed(_)))
        ));

        axis.move_to(10).unwrap();
        let mut seq = HomingSequencer::new(params(100));
        assert!(matches!(
            seq.start(&mut axis, &mut switch),
            Err(Error::Motor(MotorError::PreconditionViolation))
        ));
    }
}
