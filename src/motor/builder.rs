//! Builder pattern for StepperAxis.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::units::StepScale;
use crate::config::{AxisConfig, SystemConfig};
use crate::error::{ConfigError, Error, Result};

use super::axis::{StepperAxis, DEFAULT_ACCELERATION, DEFAULT_SPEED};
use super::emitter::{PinStepEmitter, StepEmitter, DEFAULT_PULSE_WIDTH_NS};

/// Builder for creating StepperAxis instances.
pub struct StepperAxisBuilder<E: StepEmitter> {
    emitter: Option<E>,
    name: Option<heapless::String<32>>,
    speed: f32,
    acceleration: f32,
    steps_per_millimeter: f32,
    steps_per_revolution: f32,
    invert_direction: bool,
    pulse_width_ns: u32,
}

impl<E: StepEmitter> Default for StepperAxisBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: StepEmitter> StepperAxisBuilder<E> {
    /// Create a new builder.
    pub fn new() -> Self {
        let scale = StepScale::default();
        Self {
            emitter: None,
            name: None,
            speed: DEFAULT_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            steps_per_millimeter: scale.steps_per_millimeter(),
            steps_per_revolution: scale.steps_per_revolution(),
            invert_direction: false,
            pulse_width_ns: DEFAULT_PULSE_WIDTH_NS,
        }
    }

    /// Set the step emitter.
    pub fn emitter(mut self, emitter: E) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Set the axis name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = heapless::String::try_from(name).ok();
        self
    }

    /// Set cruise speed in steps per second.
    pub fn speed(mut self, steps_per_sec: f32) -> Self {
        self.speed = steps_per_sec;
        self
    }

    /// Set acceleration in steps per second squared.
    pub fn acceleration(mut self, steps_per_sec2: f32) -> Self {
        self.acceleration = steps_per_sec2;
        self
    }

    /// Set steps per millimeter.
    pub fn steps_per_millimeter(mut self, steps: f32) -> Self {
        self.steps_per_millimeter = steps;
        self
    }

    /// Set steps per revolution.
    pub fn steps_per_revolution(mut self, steps: f32) -> Self {
        self.steps_per_revolution = steps;
        self
    }

    /// Configure from an AxisConfig.
    pub fn from_axis_config(mut self, config: &AxisConfig) -> Self {
        self.name = Some(config.name.clone());
        self.speed = config.speed.0;
        self.acceleration = config.acceleration.0;
        self.steps_per_millimeter = config.steps_per_millimeter;
        self.steps_per_revolution = config.steps_per_revolution;
        self.invert_direction = config.invert_direction;
        self.pulse_width_ns = config.pulse_width_ns;
        self
    }

    /// Configure from SystemConfig by axis name.
    pub fn from_config(self, config: &SystemConfig, axis_name: &str) -> Result<Self> {
        let axis_config = config.axis(axis_name).ok_or_else(|| {
            Error::Config(ConfigError::AxisNotFound(
                heapless::String::try_from(axis_name).unwrap_or_default(),
            ))
        })?;

        Ok(self.from_axis_config(axis_config))
    }

    /// Build the StepperAxis.
    ///
    /// # Errors
    ///
    /// Returns an error if the emitter is missing or a value is out of range.
    pub fn build(self) -> Result<StepperAxis<E>> {
        let emitter = self
            .emitter
            .ok_or(Error::Config(ConfigError::MissingField("emitter")))?;

        if self.speed.is_nan() || self.speed <= 0.0 {
            return Err(Error::Config(ConfigError::InvalidSpeed(self.speed)));
        }
        if self.acceleration.is_nan() || self.acceleration <= 0.0 {
            return Err(Error::Config(ConfigError::InvalidAcceleration(self.acceleration)));
        }

        let scale = StepScale::new(self.steps_per_millimeter, self.steps_per_revolution)?;
        let name = self
            .name
            .unwrap_or_else(|| heapless::String::try_from("axis").unwrap_or_default());

        Ok(StepperAxis::from_parts(
            emitter,
            name,
            self.speed,
            self.acceleration,
            scale,
        ))
    }
}

impl<STEP, DIR, DELAY> StepperAxisBuilder<PinStepEmitter<STEP, DIR, DELAY>>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// Use STEP/DIR pins directly.
    ///
    /// Direction inversion and pulse width come from the configuration
    /// applied so far, so call this after [`from_axis_config`](Self::from_axis_config).
    pub fn pins(self, step_pin: STEP, dir_pin: DIR, delay: DELAY) -> Self {
        let emitter = PinStepEmitter::new(step_pin, dir_pin, delay)
            .with_pulse_width_ns(self.pulse_width_ns)
            .with_inverted_direction(self.invert_direction);
        self.emitter(emitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_build_requires_emitter() {
        let result = StepperAxisBuilder::<PinStepEmitter<PinMock, PinMock, NoopDelay>>::new().build();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField("emitter")))
        ));
    }

    #[test]
    fn test_build_from_config_with_pins() {
        let mut config = AxisConfig::named("gate");
        config.invert_direction = true;
        config.pulse_width_ns = 5_000;

        let step = PinMock::new(&[]);
        let dir = PinMock::new(&[Transaction::set(State::Low)]);

        let mut axis = StepperAxisBuilder::<PinStepEmitter<PinMock, PinMock, NoopDelay>>::new()
            .from_axis_config(&config)
            .pins(step, dir, NoopDelay::new())
            .build()
            .unwrap();

        assert_eq!(axis.name(), "gate");
        assert_eq!(axis.emitter().pulse_width_ns(), 5_000);

        // Forward with inverted logic drives DIR low.
        axis.move_to(10).unwrap();

        let (mut step, mut dir, _) = axis.into_emitter().release();
        step.done();
        dir.done();
    }

    #[test]
    fn test_unknown_axis_name() {
        let config = SystemConfig::default();
        let result =
            StepperAxisBuilder::<PinStepEmitter<PinMock, PinMock, NoopDelay>>::new()
                .from_config(&config, "z");

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::AxisNotFound(_)))
        ));
    }
}
