//! Polled motions.
//!
//! A `*_non_blocking` call claims the motor and returns a [`NonBlockingMotion`]
//! handle. The caller then drives it with [`Drv8825::tick`] from its own loop;
//! each tick performs at most one step line transition, and only once it is
//! due according to the motor's clock. Ticking rarely slows the motor down,
//! the lost time is never made up.

use crate::error::{Error, MotionError, Result};
use crate::motion::{
    Clock, Duration, MotionExecutor, MotionRequest, MotionResult, Polarity, Progress,
};

use super::driver::{Drv8825, MotionToken};
use super::pins::DriverPins;

/// Step predicate of a polled motion, asked at every step boundary.
pub trait StepCondition {
    /// Error ending the motion when the predicate cannot be evaluated.
    type Error: From<Error>;

    /// Raw predicate answer, interpreted by the motion's polarity.
    fn check(&mut self) -> core::result::Result<bool, Self::Error>;
}

/// Infallible predicate `FnMut() -> bool`.
pub struct Predicate<F>(F);

impl<F> StepCondition for Predicate<F>
where
    F: FnMut() -> bool,
{
    type Error = Error;

    fn check(&mut self) -> Result<bool> {
        Ok((self.0)())
    }
}

/// Fallible predicate `FnMut() -> Result<bool, E>`.
pub struct TryPredicate<F>(F);

impl<F, E> StepCondition for TryPredicate<F>
where
    F: FnMut() -> core::result::Result<bool, E>,
    E: From<Error>,
{
    type Error = E;

    fn check(&mut self) -> core::result::Result<bool, E> {
        (self.0)()
    }
}

/// Predicate of fixed-count motions. It is never called.
pub type NoCondition = Predicate<fn() -> bool>;

fn no_condition() -> bool {
    true
}

/// Handle of an in-flight polled motion.
///
/// `F` is the step predicate, `CB` the completion callback and `R` the
/// callback's return type.
pub struct NonBlockingMotion<F, CB, R> {
    token: MotionToken,
    executor: MotionExecutor,
    condition: F,
    callback: Option<CB>,
    result: Option<MotionResult<R>>,
}

impl<F, CB, R> NonBlockingMotion<F, CB, R> {
    fn new(token: MotionToken, executor: MotionExecutor, condition: F, callback: CB) -> Self {
        Self {
            token,
            executor,
            condition,
            callback: Some(callback),
            result: None,
        }
    }

    /// Whether the motion has finished. Only a tick can make this true.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.result.is_some()
    }

    /// Steps completed so far.
    #[inline]
    pub fn steps_done(&self) -> u32 {
        self.executor.steps_done()
    }

    /// Step target, `None` for predicate-driven motions.
    #[inline]
    pub fn steps_target(&self) -> Option<u32> {
        self.executor.steps_target()
    }

    /// Run time so far (final once done).
    #[inline]
    pub fn run_time(&self) -> Duration {
        self.executor.run_time()
    }

    /// Run time so far in whole milliseconds.
    #[inline]
    pub fn run_time_ms(&self) -> u64 {
        self.run_time().to_millis()
    }

    /// Outcome, once done. Carries the completion callback's value.
    #[inline]
    pub fn result(&self) -> Option<&MotionResult<R>> {
        self.result.as_ref()
    }

    /// Consume the handle and take the outcome.
    pub fn into_result(self) -> Option<MotionResult<R>> {
        self.result
    }
}

impl<P, D, C> Drv8825<P, D, C>
where
    P: DriverPins,
    C: Clock,
{
    /// Start emitting `count` steps. See [`Drv8825::tick`].
    pub fn steps_non_blocking<CB, R>(
        &mut self,
        count: u32,
        clockwise: bool,
        callback: CB,
    ) -> Result<NonBlockingMotion<NoCondition, CB, R>>
    where
        CB: FnOnce(&MotionResult) -> R,
    {
        self.start_non_blocking(
            MotionRequest::Steps(count),
            clockwise,
            Predicate(no_condition as fn() -> bool),
            callback,
        )
    }

    /// Start turning by `revolutions` at the active mode.
    pub fn rotate_non_blocking<CB, R>(
        &mut self,
        revolutions: f32,
        clockwise: bool,
        callback: CB,
    ) -> Result<NonBlockingMotion<NoCondition, CB, R>>
    where
        CB: FnOnce(&MotionResult) -> R,
    {
        self.start_non_blocking(
            MotionRequest::Revolutions(revolutions),
            clockwise,
            Predicate(no_condition as fn() -> bool),
            callback,
        )
    }

    /// Start stepping while `condition` returns `true`.
    ///
    /// The predicate is called from [`Drv8825::tick`] at each step boundary.
    pub fn rotate_while_non_blocking<F, CB, R>(
        &mut self,
        condition: F,
        clockwise: bool,
        callback: CB,
    ) -> Result<NonBlockingMotion<Predicate<F>, CB, R>>
    where
        F: FnMut() -> bool,
        CB: FnOnce(&MotionResult) -> R,
    {
        self.start_non_blocking(
            MotionRequest::Condition(Polarity::ContinueWhile),
            clockwise,
            Predicate(condition),
            callback,
        )
    }

    /// Start stepping until `condition` returns `true`.
    pub fn rotate_until_non_blocking<F, CB, R>(
        &mut self,
        condition: F,
        clockwise: bool,
        callback: CB,
    ) -> Result<NonBlockingMotion<Predicate<F>, CB, R>>
    where
        F: FnMut() -> bool,
        CB: FnOnce(&MotionResult) -> R,
    {
        self.start_non_blocking(
            MotionRequest::Condition(Polarity::StopWhen),
            clockwise,
            Predicate(condition),
            callback,
        )
    }

    /// Like [`rotate_while_non_blocking`](Self::rotate_while_non_blocking)
    /// with a fallible predicate.
    ///
    /// The tick that gets a predicate error frees the motor and returns the
    /// error as is. The callback does not run.
    pub fn try_rotate_while_non_blocking<F, E, CB, R>(
        &mut self,
        condition: F,
        clockwise: bool,
        callback: CB,
    ) -> Result<NonBlockingMotion<TryPredicate<F>, CB, R>>
    where
        F: FnMut() -> core::result::Result<bool, E>,
        E: From<Error>,
        CB: FnOnce(&MotionResult) -> R,
    {
        self.start_non_blocking(
            MotionRequest::Condition(Polarity::ContinueWhile),
            clockwise,
            TryPredicate(condition),
            callback,
        )
    }

    /// Drive a polled motion.
    ///
    /// Returns `Ok(true)` once the motion is done. The tick that finishes the
    /// motion frees the motor and runs the completion callback. Ticking a
    /// finished motion again is a no-op returning `Ok(true)`.
    ///
    /// # Errors
    ///
    /// A pin or predicate error aborts the motion. Ticking a handle that no
    /// longer holds this motor (after an error or an [`abort`](Self::abort),
    /// or a handle issued by another motor) returns `MotionError::NotActive`.
    pub fn tick<F, CB, R>(
        &mut self,
        motion: &mut NonBlockingMotion<F, CB, R>,
    ) -> core::result::Result<bool, F::Error>
    where
        F: StepCondition,
        CB: FnOnce(&MotionResult) -> R,
    {
        if motion.result.is_some() {
            return Ok(true);
        }
        if self.current_motion != Some(motion.token) {
            return Err(Error::from(MotionError::NotActive).into());
        }

        let now = self.now();
        let condition = &mut motion.condition;
        let mut answer = || condition.check();
        let progress = match motion.executor.advance(self.pins_mut(), now, &mut answer) {
            Ok(progress) => progress,
            Err(e) => {
                self.finish_motion(motion.token);
                return Err(e);
            }
        };

        match progress {
            Progress::Finished(result) => {
                self.finish_motion(motion.token);
                self.log_finished(&result);
                if let Some(callback) = motion.callback.take() {
                    let value = callback(&result);
                    motion.result = Some(result.with_callback_result(value));
                }
                Ok(true)
            }
            Progress::Wait(_) | Progress::Condition => Ok(false),
        }
    }

    /// Abandon a polled motion and free the motor.
    ///
    /// The step line is left as it is. The callback does not run. Returns the
    /// progress made so far.
    pub fn abort<F, CB, R>(&mut self, motion: NonBlockingMotion<F, CB, R>) -> MotionResult {
        self.finish_motion(motion.token);

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: aborted after {} steps", self.name(), motion.steps_done());

        MotionResult::new(motion.executor.steps_done(), motion.executor.run_time())
    }

    fn start_non_blocking<F, CB, R>(
        &mut self,
        request: MotionRequest,
        clockwise: bool,
        condition: F,
        callback: CB,
    ) -> Result<NonBlockingMotion<F, CB, R>>
    where
        CB: FnOnce(&MotionResult) -> R,
    {
        let (token, executor) = self.begin(request, clockwise)?;
        Ok(NonBlockingMotion::new(token, executor, condition, callback))
    }
}
