//! Builder pattern for Drv8825.

use embedded_hal::digital::OutputPin;

use crate::config::{
    MicrostepMode, MotorConfig, SleepPolicy, SystemConfig, DEFAULT_FULL_STEPS_PER_REVOLUTION,
    DEFAULT_REVOLUTION_TIME_MS, DEFAULT_WAKE_SETTLE_US,
};
use crate::error::{ConfigError, Error, Result};
use crate::motion::Clock;

use super::driver::{Drv8825, Settings};
use super::pins::{Drv8825Pins, NoPin};

/// Motor type produced by [`Drv8825Builder::build`].
pub type BuiltDrv8825<STEP, DIR, EN, MODE, D, C, SLP, RST> =
    Drv8825<Drv8825Pins<STEP, DIR, EN, MODE, SLP, RST>, D, C>;

/// Builder for creating Drv8825 instances.
///
/// Step, direction, enable and the three mode pins are required, as are a
/// delay provider and a clock. Sleep and reset lines are optional.
pub struct Drv8825Builder<STEP, DIR, EN, MODE, D, C, SLP = NoPin, RST = NoPin> {
    step_pin: Option<STEP>,
    direction_pin: Option<DIR>,
    enable_pin: Option<EN>,
    mode_pins: Option<[MODE; 3]>,
    sleep_pin: Option<SLP>,
    reset_pin: Option<RST>,
    delay: Option<D>,
    clock: Option<C>,
    name: Option<heapless::String<32>>,
    mode: MicrostepMode,
    full_steps_per_revolution: u16,
    target_time_for_one_revolution_ms: f32,
    wake_settle_us: u32,
    sleep_policy: SleepPolicy,
    init_on_build: bool,
}

impl<STEP, DIR, EN, MODE, D, C> Default for Drv8825Builder<STEP, DIR, EN, MODE, D, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<STEP, DIR, EN, MODE, D, C> Drv8825Builder<STEP, DIR, EN, MODE, D, C> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            step_pin: None,
            direction_pin: None,
            enable_pin: None,
            mode_pins: None,
            sleep_pin: None,
            reset_pin: None,
            delay: None,
            clock: None,
            name: None,
            mode: MicrostepMode::default(),
            full_steps_per_revolution: DEFAULT_FULL_STEPS_PER_REVOLUTION,
            target_time_for_one_revolution_ms: DEFAULT_REVOLUTION_TIME_MS,
            wake_settle_us: DEFAULT_WAKE_SETTLE_US,
            sleep_policy: SleepPolicy::default(),
            init_on_build: true,
        }
    }
}

impl<STEP, DIR, EN, MODE, D, C, SLP, RST> Drv8825Builder<STEP, DIR, EN, MODE, D, C, SLP, RST> {
    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn direction_pin(mut self, pin: DIR) -> Self {
        self.direction_pin = Some(pin);
        self
    }

    /// Set the nENBL pin.
    pub fn enable_pin(mut self, pin: EN) -> Self {
        self.enable_pin = Some(pin);
        self
    }

    /// Set the MODE0, MODE1, MODE2 pins.
    pub fn mode_pins(mut self, pins: [MODE; 3]) -> Self {
        self.mode_pins = Some(pins);
        self
    }

    /// Set the mode pins from any collection, in M0, M1, M2 order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidModePinCount` unless exactly three pins
    /// are given.
    pub fn try_mode_pins<I>(mut self, pins: I) -> Result<Self>
    where
        I: IntoIterator<Item = MODE>,
    {
        let mut pins = pins.into_iter();
        let lines = (pins.next(), pins.next(), pins.next());
        let extra = pins.count();

        let pins = match lines {
            (Some(m0), Some(m1), Some(m2)) if extra == 0 => [m0, m1, m2],
            (m0, m1, m2) => {
                let count = m0.is_some() as usize + m1.is_some() as usize + m2.is_some() as usize;
                return Err(ConfigError::InvalidModePinCount(count + extra).into());
            }
        };

        self.mode_pins = Some(pins);
        Ok(self)
    }

    /// Set the nSLEEP pin.
    pub fn sleep_pin<S>(self, pin: S) -> Drv8825Builder<STEP, DIR, EN, MODE, D, C, S, RST>
    where
        S: OutputPin,
    {
        Drv8825Builder {
            step_pin: self.step_pin,
            direction_pin: self.direction_pin,
            enable_pin: self.enable_pin,
            mode_pins: self.mode_pins,
            sleep_pin: Some(pin),
            reset_pin: self.reset_pin,
            delay: self.delay,
            clock: self.clock,
            name: self.name,
            mode: self.mode,
            full_steps_per_revolution: self.full_steps_per_revolution,
            target_time_for_one_revolution_ms: self.target_time_for_one_revolution_ms,
            wake_settle_us: self.wake_settle_us,
            sleep_policy: self.sleep_policy,
            init_on_build: self.init_on_build,
        }
    }

    /// Set the nRESET pin.
    pub fn reset_pin<R>(self, pin: R) -> Drv8825Builder<STEP, DIR, EN, MODE, D, C, SLP, R>
    where
        R: OutputPin,
    {
        Drv8825Builder {
            step_pin: self.step_pin,
            direction_pin: self.direction_pin,
            enable_pin: self.enable_pin,
            mode_pins: self.mode_pins,
            sleep_pin: self.sleep_pin,
            reset_pin: Some(pin),
            delay: self.delay,
            clock: self.clock,
            name: self.name,
            mode: self.mode,
            full_steps_per_revolution: self.full_steps_per_revolution,
            target_time_for_one_revolution_ms: self.target_time_for_one_revolution_ms,
            wake_settle_us: self.wake_settle_us,
            sleep_policy: self.sleep_policy,
            init_on_build: self.init_on_build,
        }
    }

    /// Set the delay provider.
    pub fn delay(mut self, delay: D) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the clock.
    pub fn clock(mut self, clock: C) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the motor name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = heapless::String::try_from(name).ok();
        self
    }

    /// Set the microstepping mode (default FULL).
    pub fn mode(mut self, mode: MicrostepMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the motor's full steps per revolution (default 200).
    pub fn full_steps_per_revolution(mut self, steps: u16) -> Self {
        self.full_steps_per_revolution = steps;
        self
    }

    /// Set the time one revolution should take (default 500 ms).
    pub fn target_time_for_one_revolution_ms(mut self, ms: f32) -> Self {
        self.target_time_for_one_revolution_ms = ms;
        self
    }

    /// Set the wake-to-first-step delay (default 1700 µs).
    pub fn wake_settle_us(mut self, us: u32) -> Self {
        self.wake_settle_us = us;
        self
    }

    /// Set what a motion does when started while asleep.
    pub fn sleep_policy(mut self, policy: SleepPolicy) -> Self {
        self.sleep_policy = policy;
        self
    }

    /// Whether `build` drives the lines to their run levels (default `true`).
    pub fn init_on_build(mut self, init: bool) -> Self {
        self.init_on_build = init;
        self
    }

    /// Configure from a MotorConfig.
    pub fn from_motor_config(mut self, config: &MotorConfig) -> Self {
        self.name = Some(config.name.clone());
        self.mode = config.mode;
        self.full_steps_per_revolution = config.full_steps_per_revolution;
        self.target_time_for_one_revolution_ms = config.target_time_for_one_revolution_ms;
        self.wake_settle_us = config.wake_settle_us;
        self.sleep_policy = config.sleep_policy;
        self.init_on_build = config.init_on_build;
        self
    }

    /// Configure from SystemConfig by motor name.
    pub fn from_config(self, config: &SystemConfig, motor_name: &str) -> Result<Self> {
        let motor_config = config.motor(motor_name).ok_or_else(|| {
            Error::Config(ConfigError::MotorNotFound(
                heapless::String::try_from(motor_name).unwrap_or_default(),
            ))
        })?;

        Ok(self.from_motor_config(motor_config))
    }
}

impl<STEP, DIR, EN, MODE, D, C, SLP, RST> Drv8825Builder<STEP, DIR, EN, MODE, D, C, SLP, RST>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    MODE: OutputPin,
    SLP: OutputPin,
    RST: OutputPin,
    C: Clock,
{
    /// Build the Drv8825.
    ///
    /// With `init_on_build` the driver is enabled, released from reset, woken
    /// and set to the configured mode before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing, the timing parameters
    /// are invalid or a pin write fails during initialization.
    pub fn build(self) -> Result<BuiltDrv8825<STEP, DIR, EN, MODE, D, C, SLP, RST>> {
        let step = self.step_pin.ok_or(ConfigError::MissingPin("step_pin"))?;
        let direction = self
            .direction_pin
            .ok_or(ConfigError::MissingPin("direction_pin"))?;
        let enable = self.enable_pin.ok_or(ConfigError::MissingPin("enable_pin"))?;
        let mode = self.mode_pins.ok_or(ConfigError::MissingPin("mode_pins"))?;
        let delay = self.delay.ok_or(ConfigError::MissingPin("delay"))?;
        let clock = self.clock.ok_or(ConfigError::MissingPin("clock"))?;

        let pins = Drv8825Pins {
            step,
            direction,
            enable,
            mode,
            sleep: self.sleep_pin,
            reset: self.reset_pin,
        };

        let settings = Settings {
            name: self
                .name
                .unwrap_or_else(|| heapless::String::try_from("drv8825").unwrap_or_default()),
            mode: self.mode,
            full_steps_per_revolution: self.full_steps_per_revolution,
            target_time_for_one_revolution_ms: self.target_time_for_one_revolution_ms,
            wake_settle_us: self.wake_settle_us,
            sleep_policy: self.sleep_policy,
        };

        let mut motor = Drv8825::new(pins, delay, clock, settings)?;
        if self.init_on_build {
            motor.init()?;
        }
        Ok(motor)
    }
}
