//! Completed motion snapshots.

use super::clock::Duration;

/// Immutable outcome of a finished motion.
///
/// `R` is the return type of the completion callback for non-blocking
/// motions; it is `()` when no callback result is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionResult<R = ()> {
    steps_done: u32,
    run_time: Duration,
    callback_result: Option<R>,
}

impl MotionResult<()> {
    pub(crate) fn new(steps_done: u32, run_time: Duration) -> Self {
        Self {
            steps_done,
            run_time,
            callback_result: None,
        }
    }
}

impl<R> MotionResult<R> {
    /// Steps emitted.
    #[inline]
    pub fn steps_done(&self) -> u32 {
        self.steps_done
    }

    /// Time from the first step to the step boundary that ended the motion.
    #[inline]
    pub fn run_time(&self) -> Duration {
        self.run_time
    }

    /// Run time in whole milliseconds.
    #[inline]
    pub fn run_time_ms(&self) -> u64 {
        self.run_time.to_millis()
    }

    /// Value returned by the completion callback, if one ran.
    #[inline]
    pub fn callback_result(&self) -> Option<&R> {
        self.callback_result.as_ref()
    }

    /// Take the callback's value out of the result.
    #[inline]
    pub fn into_callback_result(self) -> Option<R> {
        self.callback_result
    }

    /// Attach a completion callback's value.
    pub(crate) fn with_callback_result<T>(self, value: T) -> MotionResult<T> {
        MotionResult {
            steps_done: self.steps_done,
            run_time: self.run_time,
            callback_result: Some(value),
        }
    }
}
