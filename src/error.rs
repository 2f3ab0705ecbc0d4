//! Error types for drv8825-motion.
//!
//! Provides unified error handling across configuration, pin control and motion execution.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all drv8825-motion operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Invalid configuration (timing, step counts, mode, pins)
    Config(ConfigError),
    /// Pin or driver power state error
    Motor(MotorError),
    /// Motion bookkeeping error
    Motion(MotionError),
}

/// Logical driver line, used to report which pin failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    /// STEP input
    Step,
    /// DIR input
    Direction,
    /// nENBL input
    Enable,
    /// nSLEEP input
    Sleep,
    /// nRESET input
    Reset,
    /// MODE0..MODE2 input, by index
    Mode(u8),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Target time for one revolution must be finite and > 0
    InvalidRevolutionTime(f32),
    /// Steps per revolution must be > 0
    InvalidStepsPerRevolution(u32),
    /// Revolution count must be finite, >= 0 and fit the step counter
    InvalidRevolutions(f32),
    /// Exactly three mode pins are required
    InvalidModePinCount(usize),
    /// Microstepping mode has no entry in the mode table
    UnsupportedMode(heapless::String<16>),
    /// A required pin or capability was not provided to the builder
    MissingPin(&'static str),
    /// Motor name not found in configuration
    MotorNotFound(heapless::String<32>),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Pin and power state errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Writing the given pin failed
    Pin(PinRole),
    /// The operation needs a pin that was not provided at construction
    PinNotProvided(PinRole),
    /// Motion requested while the driver sleeps and the sleep policy rejects it
    Asleep,
}

/// Motion execution errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Another motion is still in flight on this motor
    AlreadyInProgress,
    /// The handle does not belong to the motor's in-flight motion
    NotActive,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinRole::Step => write!(f, "STEP"),
            PinRole::Direction => write!(f, "DIR"),
            PinRole::Enable => write!(f, "EN"),
            PinRole::Sleep => write!(f, "SLP"),
            PinRole::Reset => write!(f, "RST"),
            PinRole::Mode(i) => write!(f, "M{}", i),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidRevolutionTime(v) => {
                write!(f, "Invalid time for one revolution: {} ms. Must be > 0", v)
            }
            ConfigError::InvalidStepsPerRevolution(v) => {
                write!(f, "Invalid steps per revolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidRevolutions(v) => {
                write!(f, "Invalid revolution count: {}", v)
            }
            ConfigError::InvalidModePinCount(n) => {
                write!(f, "Expected 3 mode pins (M0, M1, M2), got {}", n)
            }
            ConfigError::UnsupportedMode(mode) => write!(
                f,
                "Unsupported microstepping mode '{}'. Valid: FULL, HALF, QUARTER, 1/8, 1/16, 1/32",
                mode
            ),
            ConfigError::MissingPin(what) => write!(f, "{} is required", what),
            ConfigError::MotorNotFound(name) => write!(f, "Motor '{}' not found", name),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::Pin(role) => write!(f, "{} pin operation failed", role),
            MotorError::PinNotProvided(role) => {
                write!(f, "{} pin was not provided on construction", role)
            }
            MotorError::Asleep => write!(f, "Driver is asleep"),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::AlreadyInProgress => write!(f, "A motion is already in progress"),
            MotionError::NotActive => write!(f, "Motion handle is not the active motion"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
