//! Cooperative motions.
//!
//! Every wait awaits `embedded_hal_async::delay::DelayNs`, so other tasks on
//! the same executor run while the step line holds its level. Predicates are
//! async too and may await inputs themselves.
//!
//! Dropping one of these futures mid-motion frees the motor; the step line is
//! left at whatever level it had.

use core::future::{ready, Future};

use embedded_hal_async::delay::DelayNs as AsyncDelayNs;

use crate::error::{Error, Result};
use crate::motion::{Clock, MotionRequest, MotionResult, Polarity, Progress};

use super::driver::{wait_us, ActiveMotion, Drv8825};
use super::pins::DriverPins;

impl<P, D, C> Drv8825<P, D, C>
where
    P: DriverPins,
    D: AsyncDelayNs,
    C: Clock,
{
    /// Emit `count` steps, yielding during every wait.
    pub async fn steps_async(&mut self, count: u32, clockwise: bool) -> Result<MotionResult> {
        self.run_async(MotionRequest::Steps(count), clockwise, || ready(Ok(true)))
            .await
    }

    /// Turn by `revolutions` at the active mode, yielding during every wait.
    pub async fn rotate_async(&mut self, revolutions: f32, clockwise: bool) -> Result<MotionResult> {
        self.run_async(
            MotionRequest::Revolutions(revolutions),
            clockwise,
            || ready(Ok(true)),
        )
        .await
    }

    /// Step while `condition` resolves to `true`.
    pub async fn rotate_while_async<F, Fut>(
        &mut self,
        mut condition: F,
        clockwise: bool,
    ) -> Result<MotionResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.run_async(
            MotionRequest::Condition(Polarity::ContinueWhile),
            clockwise,
            move || {
                let answer = condition();
                async move { Ok(answer.await) }
            },
        )
        .await
    }

    /// Step until `condition` resolves to `true`.
    pub async fn rotate_until_async<F, Fut>(
        &mut self,
        mut condition: F,
        clockwise: bool,
    ) -> Result<MotionResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.run_async(
            MotionRequest::Condition(Polarity::StopWhen),
            clockwise,
            move || {
                let answer = condition();
                async move { Ok(answer.await) }
            },
        )
        .await
    }

    /// Like [`rotate_while_async`](Self::rotate_while_async) with a fallible
    /// predicate.
    ///
    /// The first predicate error ends the motion, frees the motor and is
    /// returned as is.
    pub async fn try_rotate_while_async<F, Fut, E>(
        &mut self,
        condition: F,
        clockwise: bool,
    ) -> core::result::Result<MotionResult, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = core::result::Result<bool, E>>,
        E: From<Error>,
    {
        self.run_async(
            MotionRequest::Condition(Polarity::ContinueWhile),
            clockwise,
            condition,
        )
        .await
    }

    async fn run_async<F, Fut, E>(
        &mut self,
        request: MotionRequest,
        clockwise: bool,
        mut condition: F,
    ) -> core::result::Result<MotionResult, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = core::result::Result<bool, E>>,
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
            match executor.poll(pins, now)? {
                Progress::Wait(wait) => {
                    delay.delay_us(wait_us(wait)).await;
                    waited = true;
                }
                Progress::Condition => {
                    let answer = condition().await?;
                    executor.answer(answer);
                }
                Progress::Finished(result) => break result,
            }
        };

        drop(active);
        self.log_finished(&result);
        Ok(result)
    }
}
