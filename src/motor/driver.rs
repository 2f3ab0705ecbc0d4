//! DRV8825 driver.
//!
//! Owns the control lines, the delay provider and the clock. Lifecycle and
//! configuration live here together with the blocking strategy; the polled and
//! cooperative strategies are in sibling modules and share [`Drv8825::begin`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::config::{MicrostepMode, SleepPolicy};
use crate::error::{Error, MotionError, MotorError, PinRole, Result};
use crate::motion::clock::since;
use crate::motion::{
    Clock, Direction, Duration, MotionExecutor, MotionRequest, MotionResult, Polarity, Progress,
    PulseTiming,
};

use super::pins::DriverPins;
use super::state::{Lifecycle, PowerState};

/// Identifies the motion currently holding a motor.
///
/// Carries the id of the motor that issued it, so a handle from one motor
/// never matches another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionToken {
    motor: u32,
    motion: u32,
}

#[cfg(target_has_atomic = "32")]
fn next_motor_id() -> u32 {
    use core::sync::atomic::{AtomicU32, Ordering};

    static NEXT_MOTOR_ID: AtomicU32 = AtomicU32::new(0);
    NEXT_MOTOR_ID.fetch_add(1, Ordering::Relaxed)
}

// No atomic read-modify-write on this target: every motor shares id 0.
#[cfg(not(target_has_atomic = "32"))]
fn next_motor_id() -> u32 {
    0
}

/// Static settings of a motor, resolved by the builder.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub name: heapless::String<32>,
    pub mode: MicrostepMode,
    pub full_steps_per_revolution: u16,
    pub target_time_for_one_revolution_ms: f32,
    pub wake_settle_us: u32,
    pub sleep_policy: SleepPolicy,
}

/// A stepper motor behind a DRV8825.
///
/// Generic over:
/// - `P`: the control lines (see [`DriverPins`])
/// - `D`: delay provider, blocking (`embedded_hal::delay::DelayNs`) and/or
///   async (`embedded_hal_async::delay::DelayNs`)
/// - `C`: monotonic [`Clock`]
pub struct Drv8825<P, D, C> {
    pins: P,
    delay: D,
    clock: C,

    /// Motor name for logging/debugging.
    name: heapless::String<32>,

    mode: MicrostepMode,
    full_steps_per_revolution: u16,
    timing: PulseTiming,

    lifecycle: Lifecycle,
    wake_settle: Duration,
    sleep_policy: SleepPolicy,

    /// Last direction written to DIR.
    direction: Option<Direction>,

    /// In-flight motion, if any.
    pub(crate) current_motion: Option<MotionToken>,
    id: u32,
    next_token: u32,
}

impl<P, D, C> Drv8825<P, D, C>
where
    P: DriverPins,
    C: Clock,
{
    /// Create a motor. No line is written.
    pub(crate) fn new(pins: P, delay: D, clock: C, settings: Settings) -> Result<Self> {
        let steps_per_revolution =
            settings.full_steps_per_revolution as u32 * settings.mode.multiplier() as u32;
        let timing = PulseTiming::new(
            settings.target_time_for_one_revolution_ms,
            steps_per_revolution,
        )?;

        Ok(Self {
            pins,
            delay,
            clock,
            name: settings.name,
            mode: settings.mode,
            full_steps_per_revolution: settings.full_steps_per_revolution,
            timing,
            lifecycle: Lifecycle::awake(),
            wake_settle: Duration::from_ticks(settings.wake_settle_us as u64),
            sleep_policy: settings.sleep_policy,
            direction: None,
            current_motion: None,
            id: next_motor_id(),
            next_token: 0,
        })
    }

    /// Drive every line to its run level: enable, release reset, wake and
    /// apply the configured mode.
    ///
    /// Called by the builder unless `init_on_build(false)` was given.
    pub fn init(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.enable()?;
        self.pins.set_reset(PinState::High)?;
        // Line state is unknown before init, so treat it as a real wake-up.
        self.lifecycle.asleep = true;
        self.wake()?;
        self.pins.set_mode_lines(self.mode.lines())?;

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: initialized in {} mode", self.name.as_str(), self.mode);

        Ok(())
    }

    /// Get the motor name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Active microstepping mode.
    #[inline]
    pub fn mode(&self) -> MicrostepMode {
        self.mode
    }

    /// Pulse timing at the active mode and speed.
    #[inline]
    pub fn timing(&self) -> &PulseTiming {
        &self.timing
    }

    /// Steps in one revolution at the active mode.
    #[inline]
    pub fn steps_per_revolution(&self) -> u32 {
        self.timing.steps_per_revolution
    }

    /// Full steps per revolution of the motor itself.
    #[inline]
    pub fn full_steps_per_revolution(&self) -> u16 {
        self.full_steps_per_revolution
    }

    /// Current power state.
    #[inline]
    pub fn power_state(&self) -> PowerState {
        self.lifecycle.state()
    }

    /// Direction of the last motion, `None` before the first one.
    #[inline]
    pub fn is_direction_clockwise(&self) -> Option<bool> {
        self.direction.map(Direction::is_clockwise)
    }

    /// Whether a motion is in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.current_motion.is_some()
    }

    /// Give back the pins, delay and clock.
    pub fn release(self) -> (P, D, C) {
        (self.pins, self.delay, self.clock)
    }

    /// Energize the outputs (nENBL low).
    pub fn enable(&mut self) -> Result<()> {
        self.pins.set_enable(PinState::Low)?;
        self.lifecycle.enabled = true;

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: enabled", self.name.as_str());

        Ok(())
    }

    /// Release the outputs (nENBL high). The rotor is free to turn.
    pub fn disable(&mut self) -> Result<()> {
        self.pins.set_enable(PinState::High)?;
        self.lifecycle.enabled = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: disabled", self.name.as_str());

        Ok(())
    }

    /// Put the driver into low-power sleep (nSLEEP low).
    ///
    /// Without a sleep line only the tracked state changes.
    pub fn sleep(&mut self) -> Result<()> {
        self.pins.set_sleep(PinState::Low)?;
        self.lifecycle.sleep();

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: asleep", self.name.as_str());

        Ok(())
    }

    /// Wake the driver (nSLEEP high).
    ///
    /// Coming out of sleep, the next motion waits for the wake settle time
    /// before its first step.
    pub fn wake(&mut self) -> Result<()> {
        let wired = self.pins.set_sleep(PinState::High)?;
        let now = self.clock.now();
        self.lifecycle.wake(wired.then_some(now));

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: awake", self.name.as_str());

        Ok(())
    }

    /// Hold (`true`) or release (`false`) the driver in reset (nRESET low
    /// while held).
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinNotProvided` if no reset line is wired.
    pub fn reset(&mut self, active: bool) -> Result<()> {
        let level = if active { PinState::Low } else { PinState::High };
        if !self.pins.set_reset(level)? {
            return Err(MotorError::PinNotProvided(PinRole::Reset).into());
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: reset {}", self.name.as_str(), active);

        Ok(())
    }

    /// Select a microstepping mode and recompute the pulse timing.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::AlreadyInProgress` while a motion is in flight.
    pub fn set_mode(&mut self, mode: MicrostepMode) -> Result<()> {
        self.ensure_idle()?;
        let steps_per_revolution = self.full_steps_per_revolution as u32 * mode.multiplier() as u32;
        let timing = PulseTiming::new(self.timing.target_revolution_time_ms, steps_per_revolution)?;

        self.pins.set_mode_lines(mode.lines())?;
        self.mode = mode;
        self.timing = timing;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "{}: mode {}, half pulse {} us",
            self.name.as_str(),
            mode,
            timing.half_pulse().ticks()
        );

        Ok(())
    }

    /// Change the speed by setting the time one revolution should take.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRevolutionTime` for non-positive or
    /// non-finite values and `MotionError::AlreadyInProgress` while a motion
    /// is in flight.
    pub fn set_target_time_for_one_revolution_ms(&mut self, ms: f32) -> Result<()> {
        self.ensure_idle()?;
        self.timing = PulseTiming::new(ms, self.timing.steps_per_revolution)?;
        Ok(())
    }

    /// Start a motion: claim the motor, apply the sleep policy and set DIR.
    ///
    /// Every strategy goes through here. The returned token must be released
    /// with [`Drv8825::finish_motion`] however the motion ends.
    pub(crate) fn begin(
        &mut self,
        request: MotionRequest,
        clockwise: bool,
    ) -> Result<(MotionToken, MotionExecutor)> {
        self.ensure_idle()?;
        let termination = request.resolve(self.timing.steps_per_revolution)?;

        if self.lifecycle.asleep {
            match self.sleep_policy {
                SleepPolicy::Reject => return Err(MotorError::Asleep.into()),
                SleepPolicy::AutoWake => self.wake()?,
            }
        }

        #[cfg(feature = "defmt")]
        {
            if !self.lifecycle.enabled {
                defmt::warn!("{}: motion started while disabled", self.name.as_str());
            }
        }

        let direction = Direction::from(clockwise);
        let level = if clockwise { PinState::High } else { PinState::Low };
        self.pins.set_direction(level)?;
        self.direction = Some(direction);

        let now = self.clock.now();
        let settle = match self.lifecycle.woke_at.take() {
            Some(woke_at) => self
                .wake_settle
                .checked_sub(since(now, woke_at))
                .unwrap_or(Duration::from_ticks(0)),
            None => Duration::from_ticks(0),
        };

        let token = MotionToken {
            motor: self.id,
            motion: self.next_token,
        };
        self.next_token = self.next_token.wrapping_add(1);
        self.current_motion = Some(token);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "{}: start {} {}",
            self.name.as_str(),
            termination,
            direction
        );

        let executor = MotionExecutor::new(termination, self.timing.half_pulse(), settle, now);
        Ok((token, executor))
    }

    /// Release the motor if `token` still holds it.
    pub(crate) fn finish_motion(&mut self, token: MotionToken) {
        if self.current_motion == Some(token) {
            self.current_motion = None;
        }
    }

    pub(crate) fn log_finished<R>(&self, _result: &MotionResult<R>) {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "{}: {} steps in {} us",
            self.name.as_str(),
            _result.steps_done(),
            _result.run_time().ticks()
        );
    }

    pub(crate) fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    pub(crate) fn now(&self) -> crate::motion::Instant {
        self.clock.now()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.current_motion.is_some() {
            return Err(MotionError::AlreadyInProgress.into());
        }
        Ok(())
    }
}

/// Holds the motor for the duration of one awaited or blocking motion and
/// frees it on every exit path, including a dropped future.
pub(crate) struct ActiveMotion<'a, P, D, C> {
    motor: &'a mut Drv8825<P, D, C>,
    token: MotionToken,
}

impl<'a, P, D, C> ActiveMotion<'a, P, D, C> {
    pub fn new(motor: &'a mut Drv8825<P, D, C>, token: MotionToken) -> Self {
        Self { motor, token }
    }

    /// Pins, delay and clock borrowed at once.
    pub fn parts(&mut self) -> (&mut P, &mut D, &C) {
        (&mut self.motor.pins, &mut self.motor.delay, &self.motor.clock)
    }
}

impl<P, D, C> Drop for ActiveMotion<'_, P, D, C> {
    fn drop(&mut self) {
        if self.motor.current_motion == Some(self.token) {
            self.motor.current_motion = None;
        }
    }
}

/// Wait time for the `delay_us` primitives, saturated to `u32`.
#[inline]
pub(crate) fn wait_us(wait: Duration) -> u32 {
    u32::try_from(wait.ticks()).unwrap_or(u32::MAX)
}

impl<P, D, C> Drv8825<P, D, C>
where
    P: DriverPins,
    D: DelayNs,
    C: Clock,
{
    /// Emit `count` steps and return once the last one is done.
    ///
    /// A count of 0 returns immediately with 0 steps. Fixed-count motions
    /// cannot be interrupted.
    pub fn steps(&mut self, count: u32, clockwise: bool) -> Result<MotionResult> {
        self.run_blocking(MotionRequest::Steps(count), clockwise, || Ok::<bool, Error>(true))
    }

    /// Turn by `revolutions` at the active mode. Fractions are rounded to the
    /// nearest step.
    pub fn rotate(&mut self, revolutions: f32, clockwise: bool) -> Result<MotionResult> {
        self.run_blocking(
            MotionRequest::Revolutions(revolutions),
            clockwise,
            || Ok::<bool, Error>(true),
        )
    }

    /// Step while `condition` returns `true`, checked before every step.
    pub fn rotate_while<F>(&mut self, mut condition: F, clockwise: bool) -> Result<MotionResult>
    where
        F: FnMut() -> bool,
    {
        self.run_blocking(
            MotionRequest::Condition(Polarity::ContinueWhile),
            clockwise,
            || Ok::<bool, Error>(condition()),
        )
    }

    /// Step until `condition` returns `true`, checked before every step.
    pub fn rotate_until<F>(&mut self, mut condition: F, clockwise: bool) -> Result<MotionResult>
    where
        F: FnMut() -> bool,
    {
        self.run_blocking(
            MotionRequest::Condition(Polarity::StopWhen),
            clockwise,
            || Ok::<bool, Error>(condition()),
        )
    }

    /// Like [`rotate_while`](Self::rotate_while) with a fallible predicate.
    ///
    /// The first predicate error ends the motion and is returned as is.
    pub fn try_rotate_while<F, E>(
        &mut self,
        condition: F,
        clockwise: bool,
    ) -> core::result::Result<MotionResult, E>
    where
        F: FnMut() -> core::result::Result<bool, E>,
        E: From<Error>,
    {
        self.run_blocking(
            MotionRequest::Condition(Polarity::ContinueWhile),
            clockwise,
            condition,
        )
    }

    fn run_blocking<F, E>(
        &mut self,
        request: MotionRequest,
        clockwise: bool,
        mut condition: F,
    ) -> core::result::Result<MotionResult, E>
    where
        F: FnMut() -> core::result::Result<bool, E>,
        E: From<Error>,
    {
        let (token, mut executor) = self.begin(request, clockwise)?;
        let mut active = ActiveMotion::new(self, token);

        let mut waited = false;
        let result = loop {
            let (pins, delay, clock) = active.parts();
            let now = if waited {
                executor.after_wait(clock.now())
            } else {
                clock.now()
            };
            match executor.advance(pins, now, &mut condition)? {
                Progress::Wait(wait) => {
                    delay.delay_us(wait_us(wait));
                    waited = true;
                }
                Progress::Finished(result) => break result,
                Progress::Condition => {}
            }
        };

        drop(active);
        self.log_finished(&result);
        Ok(result)
    }
}
