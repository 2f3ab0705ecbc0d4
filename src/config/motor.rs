//! Motor configuration from TOML.

use heapless::String;
use serde::Deserialize;

use super::mode::MicrostepMode;

/// What a motion does when it is started while the driver sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum SleepPolicy {
    /// Wake the driver and wait for it to settle before the first step.
    #[default]
    AutoWake,
    /// Fail the motion with `MotorError::Asleep`.
    Reject,
}

/// Complete motor configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Human-readable name (max 32 chars).
    #[serde(default = "default_name")]
    pub name: String<32>,

    /// Microstepping mode, by name (`"1/16"`) or count (`16`).
    #[serde(default)]
    pub mode: MicrostepMode,

    /// Full steps per revolution (typically 200 for 1.8° motors).
    #[serde(default = "default_full_steps")]
    pub full_steps_per_revolution: u16,

    /// Desired duration of one revolution in milliseconds. Sets the speed.
    #[serde(default = "default_revolution_time")]
    pub target_time_for_one_revolution_ms: f32,

    /// Delay between waking the driver and the first step, in microseconds.
    #[serde(default = "default_wake_settle")]
    pub wake_settle_us: u32,

    /// Behavior when a motion starts while asleep.
    #[serde(default)]
    pub sleep_policy: SleepPolicy,

    /// Drive enable, reset, sleep and mode lines to their run levels on build.
    #[serde(default = "default_init_on_build")]
    pub init_on_build: bool,
}

/// Base full-step count of a 1.8° motor.
pub const DEFAULT_FULL_STEPS_PER_REVOLUTION: u16 = 200;

/// Default time for one revolution.
pub const DEFAULT_REVOLUTION_TIME_MS: f32 = 500.0;

/// DRV8825 tWAKE (nSLEEP inactive to STEP input accepted).
pub const DEFAULT_WAKE_SETTLE_US: u32 = 1_700;

fn default_name() -> String<32> {
    String::try_from("drv8825").unwrap_or_default()
}

fn default_full_steps() -> u16 {
    DEFAULT_FULL_STEPS_PER_REVOLUTION
}

fn default_revolution_time() -> f32 {
    DEFAULT_REVOLUTION_TIME_MS
}

fn default_wake_settle() -> u32 {
    DEFAULT_WAKE_SETTLE_US
}

fn default_init_on_build() -> bool {
    true
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            mode: MicrostepMode::default(),
            full_steps_per_revolution: default_full_steps(),
            target_time_for_one_revolution_ms: default_revolution_time(),
            wake_settle_us: default_wake_settle(),
            sleep_policy: SleepPolicy::default(),
            init_on_build: default_init_on_build(),
        }
    }
}

impl MotorConfig {
    /// Steps per revolution at the configured mode.
    pub fn steps_per_revolution(&self) -> u32 {
        self.full_steps_per_revolution as u32 * self.mode.multiplier() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_per_revolution() {
        let config = MotorConfig {
            mode: MicrostepMode::Sixteenth,
            ..MotorConfig::default()
        };

        // 200 * 16 = 3200
        assert_eq!(config.steps_per_revolution(), 3200);
    }

    #[test]
    fn test_defaults() {
        let config = MotorConfig::default();
        assert_eq!(config.name.as_str(), "drv8825");
        assert_eq!(config.mode, MicrostepMode::Full);
        assert_eq!(config.full_steps_per_revolution, 200);
        assert_eq!(config.sleep_policy, SleepPolicy::AutoWake);
        assert!(config.init_on_build);
    }
}
