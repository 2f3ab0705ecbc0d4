//! Configuration module for drv8825-motion.
//!
//! Provides the microstepping mode table and the types for loading and
//! validating motor configurations from TOML files (with `std` feature) or
//! pre-parsed data.

pub mod mode;
mod motor;
mod system;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use mode::MicrostepMode;
pub use motor::{
    MotorConfig, SleepPolicy, DEFAULT_FULL_STEPS_PER_REVOLUTION, DEFAULT_REVOLUTION_TIME_MS,
    DEFAULT_WAKE_SETTLE_US,
};
pub use system::SystemConfig;
pub use validation::{validate_config, validate_motor};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
