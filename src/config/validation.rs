//! Configuration validation.

use crate::error::Result;
use crate::motion::PulseTiming;

use super::{MotorConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks, for every motor:
/// - Full steps per revolution is non-zero
/// - Target time for one revolution is finite and positive
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for (name, motor) in config.motors.iter() {
        validate_motor(name.as_str(), motor)?;
    }

    Ok(())
}

/// Validate a single motor configuration.
pub fn validate_motor(_name: &str, config: &MotorConfig) -> Result<()> {
    // The timing calculator owns the rules for both values
    PulseTiming::new(
        config.target_time_for_one_revolution_ms,
        config.steps_per_revolution(),
    )?;

    Ok(())
}
