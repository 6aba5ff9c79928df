//! Error types for stepper-ramp.
//!
//! Provides unified error handling across configuration, motion planning,
//! axis control, and homing. The step-emission path itself is infallible:
//! every error here is raised before a move starts or by the homing sequencer.

use core::fmt;

use crate::homing::HomingPhase;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-ramp operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motion planning error
    Planner(PlannerError),
    /// Axis operation error
    Motor(MotorError),
    /// Homing sequence error
    Homing(HomingError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Axis name not found in configuration
    AxisNotFound(heapless::String<32>),
    /// Cruise speed must be > 0
    InvalidSpeed(f32),
    /// Acceleration must be > 0
    InvalidAcceleration(f32),
    /// Steps-per-unit scale factor must be > 0
    InvalidScale(f32),
    /// Homing speed must be > 0
    InvalidHomingSpeed(f32),
    /// Homing travel bound must be > 0 steps
    InvalidMaxDistance(u32),
    /// Step pulse width must be > 0 ns
    InvalidPulseWidth(u32),
    /// A required builder field was not supplied
    MissingField(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motion planning errors.
///
/// Raised before any axis state is mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlannerError {
    /// Cruise speed was zero or negative (steps/sec)
    InvalidSpeed(f32),
    /// Acceleration was zero or negative (steps/sec²)
    InvalidAcceleration(f32),
}

/// Axis operation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorError {
    /// A configuration mutator or new move was requested while a move is active
    PreconditionViolation,
    /// Pin operation failed
    PinError,
}

/// Homing sequence errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingError {
    /// The phase's move completed without the expected switch transition
    SwitchNotFound {
        /// Phase that ran out of travel
        phase: HomingPhase,
    },
    /// A phase's move could not be armed
    MoveRejected {
        /// Phase whose move was rejected
        phase: HomingPhase,
        /// Underlying axis error
        cause: MotorError,
    },
    /// Polled before a successful `start`
    NotStarted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Planner(e) => write!(f, "Planner error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Homing(e) => write!(f, "Homing error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::AxisNotFound(name) => write!(f, "Axis '{}' not found", name),
            ConfigError::InvalidSpeed(v) => write!(f, "Invalid speed: {}. Must be > 0", v),
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidScale(v) => write!(f, "Invalid steps-per-unit: {}. Must be > 0", v),
            ConfigError::InvalidHomingSpeed(v) => {
                write!(f, "Invalid homing speed: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxDistance(v) => {
                write!(f, "Invalid homing max distance: {}. Must be > 0", v)
            }
            ConfigError::InvalidPulseWidth(v) => write!(f, "Invalid pulse width: {} ns. Must be > 0", v),
            ConfigError::MissingField(field) => write!(f, "{} is required", field),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::InvalidSpeed(v) => {
                write!(f, "Cruise speed {} steps/s must be positive", v)
            }
            PlannerError::InvalidAcceleration(v) => {
                write!(f, "Acceleration {} steps/s² must be positive", v)
            }
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PreconditionViolation => {
                write!(f, "Operation not allowed while a move is active")
            }
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

impl fmt::Display for HomingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomingError::SwitchNotFound { phase } => {
                write!(f, "Switch transition not seen during {:?}", phase)
            }
            HomingError::MoveRejected { phase, cause } => {
                write!(f, "Move for {:?} rejected: {}", phase, cause)
            }
            HomingError::NotStarted => write!(f, "Homing polled before start"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<PlannerError> for Error {
    fn from(e: PlannerError) -> Self {
        Error::Planner(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<HomingError> for Error {
    fn from(e: HomingError) -> Self {
        Error::Homing(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for PlannerError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for HomingError {}
