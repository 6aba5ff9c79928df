//! Step/direction output.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Default STEP pulse width in nanoseconds.
pub const DEFAULT_PULSE_WIDTH_NS: u32 = 2_000;

/// Drives the STEP and DIR lines of a stepper driver.
///
/// The motion core calls [`set_direction`](StepEmitter::set_direction) once
/// per move and [`pulse_step`](StepEmitter::pulse_step) once per step. It has
/// no notion of pins, boards or enable lines.
pub trait StepEmitter {
    /// Error raised by the underlying outputs.
    type Error: core::fmt::Debug;

    /// Assert the direction level. `forward` is `true` for increasing position.
    fn set_direction(&mut self, forward: bool) -> Result<(), Self::Error>;

    /// Assert the step line, hold it briefly, and release it.
    fn pulse_step(&mut self) -> Result<(), Self::Error>;
}

impl<E: StepEmitter + ?Sized> StepEmitter for &mut E {
    type Error = E::Error;

    #[inline]
    fn set_direction(&mut self, forward: bool) -> Result<(), Self::Error> {
        (**self).set_direction(forward)
    }

    #[inline]
    fn pulse_step(&mut self) -> Result<(), Self::Error> {
        (**self).pulse_step()
    }
}

/// Error from a [`PinStepEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEmitterError<S, D> {
    /// STEP pin write failed
    Step(S),
    /// DIR pin write failed
    Direction(D),
}

/// [`StepEmitter`] over embedded-hal 1.0 output pins.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `DELAY`: Delay provider for the pulse width (must implement `DelayNs`)
pub struct PinStepEmitter<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// STEP pin (pulse to move one step).
    step_pin: STEP,

    /// DIR pin (high = forward, unless inverted).
    dir_pin: DIR,

    /// Delay provider for holding the STEP line.
    delay: DELAY,

    /// How long STEP is held high.
    pulse_width_ns: u32,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Last level written to DIR (cached to avoid redundant writes).
    current_forward: Option<bool>,
}

impl<STEP, DIR, DELAY> PinStepEmitter<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// Create an emitter with the default 2 µs pulse width.
    pub fn new(step_pin: STEP, dir_pin: DIR, delay: DELAY) -> Self {
        Self {
            step_pin,
            dir_pin,
            delay,
            pulse_width_ns: DEFAULT_PULSE_WIDTH_NS,
            invert_direction: false,
            current_forward: None,
        }
    }

    /// Set the STEP pulse width.
    ///
    /// Keep this well below the shortest step period in use; it is spent
    /// blocking inside every step.
    pub fn with_pulse_width_ns(mut self, pulse_width_ns: u32) -> Self {
        self.pulse_width_ns = pulse_width_ns;
        self
    }

    /// Set direction inversion.
    pub fn with_inverted_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Configured pulse width.
    #[inline]
    pub fn pulse_width_ns(&self) -> u32 {
        self.pulse_width_ns
    }

    /// Release the pins and delay provider.
    pub fn release(self) -> (STEP, DIR, DELAY) {
        (self.step_pin, self.dir_pin, self.delay)
    }
}

impl<STEP, DIR, DELAY> StepEmitter for PinStepEmitter<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    type Error = PinEmitterError<STEP::Error, DIR::Error>;

    fn set_direction(&mut self, forward: bool) -> Result<(), Self::Error> {
        if self.current_forward == Some(forward) {
            return Ok(());
        }

        let pin_high = forward != self.invert_direction;
        if pin_high {
            self.dir_pin.set_high().map_err(PinEmitterError::Direction)?;
        } else {
            self.dir_pin.set_low().map_err(PinEmitterError::Direction)?;
        }

        self.current_forward = Some(forward);
        Ok(())
    }

    fn pulse_step(&mut self) -> Result<(), Self::Error> {
        if let Err(e) = self.step_pin.set_high() {
            self.park_step_low();
            return Err(PinEmitterError::Step(e));
        }
        self.delay.delay_ns(self.pulse_width_ns);
        if let Err(e) = self.step_pin.set_low() {
            self.park_step_low();
            return Err(PinEmitterError::Step(e));
        }
        Ok(())
    }
}

impl<STEP, DIR, DELAY> PinStepEmitter<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// Drive STEP low after a failed pulse so the retry starts on a rising edge.
    fn park_step_low(&mut self) {
        if self.step_pin.set_low().is_err() {
            warn!("STEP pin stuck, could not drive it low");
        }
    }
}
