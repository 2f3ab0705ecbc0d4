//! Step pulse timing.
//!
//! Derives the half-pulse delay from a target revolution time and the number
//! of steps in one revolution. One step period is two half-pulse delays: the
//! step line is held high for one and low for the other.

use libm::roundf;

use crate::error::{ConfigError, Result};

use super::clock::Duration;

/// Timing for one step pulse at constant velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseTiming {
    /// Time the step line is held at each level, in milliseconds.
    pub half_pulse_delay_ms: f32,

    /// Steps in one revolution at the active mode.
    pub steps_per_revolution: u32,

    /// Target time for one revolution, in milliseconds.
    pub target_revolution_time_ms: f32,
}

impl PulseTiming {
    /// Compute pulse timing.
    ///
    /// No clamping to the driver's minimum pulse width is applied; keeping the
    /// speed within what the driver can follow is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRevolutionTime` if the time is not a finite
    /// positive number and `ConfigError::InvalidStepsPerRevolution` if the step
    /// count is zero.
    pub fn new(target_revolution_time_ms: f32, steps_per_revolution: u32) -> Result<Self> {
        if !(target_revolution_time_ms.is_finite() && target_revolution_time_ms > 0.0) {
            return Err(ConfigError::InvalidRevolutionTime(target_revolution_time_ms).into());
        }
        if steps_per_revolution == 0 {
            return Err(ConfigError::InvalidStepsPerRevolution(steps_per_revolution).into());
        }

        Ok(Self {
            half_pulse_delay_ms: target_revolution_time_ms / steps_per_revolution as f32 / 2.0,
            steps_per_revolution,
            target_revolution_time_ms,
        })
    }

    /// Half-pulse delay rounded to whole microseconds.
    #[inline]
    pub fn half_pulse(&self) -> Duration {
        Duration::from_ticks(roundf(self.half_pulse_delay_ms * 1_000.0) as u64)
    }

    /// Full step period (high + low).
    #[inline]
    pub fn step_period(&self) -> Duration {
        Duration::from_ticks(self.half_pulse().ticks() * 2)
    }
}
