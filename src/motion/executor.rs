//! Motion execution - step pulse generation.
//!
//! `MotionExecutor` is the single state machine behind every motion strategy.
//! It never waits by itself: each [`poll`](MotionExecutor::poll) performs at
//! most one step-line transition that is due at `now` and reports what the
//! caller has to do next. The blocking, polled and cooperative strategies
//! differ only in how they honor [`Progress::Wait`] and where the predicate
//! answer for [`Progress::Condition`] comes from.

use embedded_hal::digital::PinState;

use crate::error::{Error, Result};
use crate::motor::DriverPins;

use super::clock::{since, Duration, Instant};
use super::request::Termination;
use super::result::MotionResult;

/// Where the executor is within the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Waiting for the driver to come out of sleep.
    Settling,
    /// Between two steps, deciding whether to take another.
    Boundary,
    /// Step line high, holding for one half-pulse.
    High,
    /// Step line low, holding for one half-pulse.
    Low,
    /// Motion complete.
    Done,
}

/// What the strategy driving the executor must do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Call `poll` again once this much time has passed.
    Wait(Duration),
    /// Evaluate the predicate, hand the answer to
    /// [`MotionExecutor::answer`] and poll again.
    Condition,
    /// The motion has finished.
    Finished(MotionResult),
}

/// Runtime state of one motion.
#[derive(Debug, Clone)]
pub struct MotionExecutor {
    termination: Termination,

    /// Hold time for each step line level.
    half_pulse: Duration,

    /// Wake-to-first-step delay still owed before the motion may start.
    settle: Duration,

    phase: MotionPhase,

    steps_done: u32,

    /// Start of the first step (after settling).
    started_at: Instant,

    /// Time of the last step line edge, or of creation while settling.
    last_edge_at: Instant,

    /// Latest time the executor was polled with.
    last_seen: Instant,

    /// Predicate answer handed in for the current boundary.
    answer: Option<bool>,

    /// Set once the motion has finished.
    run_time: Option<Duration>,
}

impl MotionExecutor {
    /// Create an executor starting at `now`.
    ///
    /// A non-zero `settle` delays the first step by that amount.
    pub fn new(termination: Termination, half_pulse: Duration, settle: Duration, now: Instant) -> Self {
        let phase = if settle.ticks() == 0 {
            MotionPhase::Boundary
        } else {
            MotionPhase::Settling
        };

        Self {
            termination,
            half_pulse,
            settle,
            phase,
            steps_done: 0,
            started_at: now,
            last_edge_at: now,
            last_seen: now,
            answer: None,
            run_time: None,
        }
    }

    /// Check if motion is complete.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.phase == MotionPhase::Done
    }

    /// Steps completed so far.
    #[inline]
    pub fn steps_done(&self) -> u32 {
        self.steps_done
    }

    /// Step target, `None` for predicate-driven motions.
    #[inline]
    pub fn steps_target(&self) -> Option<u32> {
        self.termination.steps_target()
    }

    /// Get the current phase.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// When the pending transition is due, `None` at a step boundary or once
    /// done.
    pub fn deadline(&self) -> Option<Instant> {
        let hold = match self.phase {
            MotionPhase::Settling => self.settle,
            MotionPhase::High | MotionPhase::Low => self.half_pulse,
            MotionPhase::Boundary | MotionPhase::Done => return None,
        };
        Some(self.last_edge_at + hold)
    }

    /// Time to poll with after sleeping out the last [`Progress::Wait`].
    ///
    /// A delay provider waits at least as long as asked, so the pending
    /// deadline has passed even if a coarse clock does not show it yet.
    pub fn after_wait(&self, now: Instant) -> Instant {
        match self.deadline() {
            Some(deadline) if deadline > now => deadline,
            _ => now,
        }
    }

    /// Run time so far, or the final run time once done.
    pub fn run_time(&self) -> Duration {
        match (self.run_time, self.phase) {
            (Some(run_time), _) => run_time,
            (None, MotionPhase::Settling) => Duration::from_ticks(0),
            (None, _) => since(self.last_seen, self.started_at),
        }
    }

    /// Hand in the predicate answer requested by [`Progress::Condition`].
    ///
    /// The raw answer is interpreted according to the motion's [`Polarity`].
    ///
    /// [`Polarity`]: super::Polarity
    #[inline]
    pub fn answer(&mut self, answer: bool) {
        if self.phase == MotionPhase::Boundary {
            self.answer = Some(answer);
        }
    }

    /// Advance the motion to `now`.
    ///
    /// Performs at most one step line transition. Does nothing but report
    /// the remaining wait if the next transition is not due yet.
    pub fn poll<P: DriverPins>(&mut self, pins: &mut P, now: Instant) -> Result<Progress> {
        if now > self.last_seen {
            self.last_seen = now;
        }

        match self.phase {
            MotionPhase::Settling => {
                let elapsed = since(now, self.last_edge_at);
                if elapsed < self.settle {
                    return Ok(Progress::Wait(self.settle - elapsed));
                }
                self.started_at = now;
                self.phase = MotionPhase::Boundary;
                self.boundary(pins, now)
            }
            MotionPhase::Boundary => self.boundary(pins, now),
            MotionPhase::High => {
                let elapsed = since(now, self.last_edge_at);
                if elapsed < self.half_pulse {
                    return Ok(Progress::Wait(self.half_pulse - elapsed));
                }
                pins.set_step(PinState::Low)?;
                self.last_edge_at = now;
                self.phase = MotionPhase::Low;
                Ok(Progress::Wait(self.half_pulse))
            }
            MotionPhase::Low => {
                let elapsed = since(now, self.last_edge_at);
                if elapsed < self.half_pulse {
                    return Ok(Progress::Wait(self.half_pulse - elapsed));
                }
                self.steps_done = self.steps_done.saturating_add(1);
                self.phase = MotionPhase::Boundary;
                self.boundary(pins, now)
            }
            MotionPhase::Done => Ok(Progress::Finished(self.result())),
        }
    }

    /// Poll, answering predicate requests synchronously with `condition`.
    ///
    /// Shared by the blocking and polled strategies. Errors from the
    /// predicate abort the poll and are returned unchanged.
    pub fn advance<P, F, E>(
        &mut self,
        pins: &mut P,
        now: Instant,
        condition: &mut F,
    ) -> core::result::Result<Progress, E>
    where
        P: DriverPins,
        F: FnMut() -> core::result::Result<bool, E>,
        E: From<Error>,
    {
        loop {
            match self.poll(pins, now)? {
                Progress::Condition => {
                    let answer = condition()?;
                    self.answer(answer);
                }
                progress => return Ok(progress),
            }
        }
    }

    fn boundary<P: DriverPins>(&mut self, pins: &mut P, now: Instant) -> Result<Progress> {
        let keep_going = match self.termination {
            Termination::AfterSteps(target) => self.steps_done < target,
            Termination::Condition(polarity) => match self.answer.take() {
                Some(answer) => polarity.keep_going(answer),
                None => return Ok(Progress::Condition),
            },
        };

        if !keep_going {
            self.run_time = Some(since(now, self.started_at));
            self.phase = MotionPhase::Done;
            return Ok(Progress::Finished(self.result()));
        }

        pins.set_step(PinState::High)?;
        self.last_edge_at = now;
        self.phase = MotionPhase::High;
        Ok(Progress::Wait(self.half_pulse))
    }

    fn result(&self) -> MotionResult {
        MotionResult::new(self.steps_done, self.run_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MotorError;
    use crate::motion::Polarity;

    /// Records step line writes, ignores everything else.
    #[derive(Default)]
    struct StepLog {
        levels: heapless::Vec<PinState, 64>,
    }

    impl DriverPins for StepLog {
        fn set_step(&mut self, state: PinState) -> core::result::Result<(), MotorError> {
            let _ = self.levels.push(state);
            Ok(())
        }
        fn set_direction(&mut self, _: PinState) -> core::result::Result<(), MotorError> {
            Ok(())
        }
        fn set_enable(&mut self, _: PinState) -> core::result::Result<(), MotorError> {
            Ok(())
        }
        fn set_sleep(&mut self, _: PinState) -> core::result::Result<bool, MotorError> {
            Ok(false)
        }
        fn set_reset(&mut self, _: PinState) -> core::result::Result<bool, MotorError> {
            Ok(false)
        }
        fn set_mode_lines(&mut self, _: [PinState; 3]) -> core::result::Result<(), MotorError> {
            Ok(())
        }
    }

    fn at(us: u64) -> Instant {
        Instant::from_ticks(us)
    }

    fn us(ticks: u64) -> Duration {
        Duration::from_ticks(ticks)
    }

    #[test]
    fn test_executor_complete() {
        let mut pins = StepLog::default();
        let mut executor = MotionExecutor::new(Termination::AfterSteps(3), us(100), us(0), at(0));

        let mut now = 0;
        let result = loop {
            match executor.poll(&mut pins, at(now)).unwrap() {
                Progress::Wait(d) => now += d.ticks(),
                Progress::Condition => unreachable!(),
                Progress::Finished(r) => break r,
            }
        };

        assert!(executor.is_done());
        assert_eq!(result.steps_done(), 3);
        assert_eq!(result.run_time().ticks(), 600);
        assert_eq!(pins.levels.len(), 6);
        assert_eq!(pins.levels[0], PinState::High);
        assert_eq!(pins.levels[5], PinState::Low);
    }

    #[test]
    fn test_zero_steps() {
        let mut pins = StepLog::default();
        let mut executor = MotionExecutor::new(Termination::AfterSteps(0), us(100), us(0), at(5));

        let progress = executor.poll(&mut pins, at(5)).unwrap();
        assert_eq!(progress, Progress::Finished(MotionResult::new(0, us(0))));
        assert!(pins.levels.is_empty());
    }

    #[test]
    fn test_early_poll_reports_remaining_wait() {
        let mut pins = StepLog::default();
        let mut executor = MotionExecutor::new(Termination::AfterSteps(1), us(100), us(0), at(0));

        assert_eq!(executor.poll(&mut pins, at(0)).unwrap(), Progress::Wait(us(100)));
        assert_eq!(executor.poll(&mut pins, at(40)).unwrap(), Progress::Wait(us(60)));
        assert_eq!(executor.phase(), MotionPhase::High);
        assert_eq!(pins.levels.len(), 1);
    }

    #[test]
    fn test_settle_precedes_first_edge() {
        let mut pins = StepLog::default();
        let mut executor = MotionExecutor::new(Termination::AfterSteps(1), us(100), us(1_700), at(0));

        assert_eq!(executor.poll(&mut pins, at(0)).unwrap(), Progress::Wait(us(1_700)));
        assert!(pins.levels.is_empty());

        assert_eq!(executor.poll(&mut pins, at(1_700)).unwrap(), Progress::Wait(us(100)));
        assert_eq!(pins.levels[0], PinState::High);
        assert_eq!(executor.run_time().ticks(), 0);
    }

    #[test]
    fn test_after_wait_trusts_the_delay() {
        let mut pins = StepLog::default();
        let mut executor = MotionExecutor::new(Termination::AfterSteps(1), us(39), us(0), at(1_000));

        assert_eq!(executor.deadline(), None);
        assert_eq!(executor.poll(&mut pins, at(1_000)).unwrap(), Progress::Wait(us(39)));
        assert_eq!(executor.deadline(), Some(at(1_039)));

        // Millisecond clock still reads 1000 after the 39 us delay
        let now = executor.after_wait(at(1_000));
        assert_eq!(now, at(1_039));
        assert_eq!(executor.poll(&mut pins, now).unwrap(), Progress::Wait(us(39)));

        // A clock past the deadline wins
        assert_eq!(executor.after_wait(at(2_000)), at(2_000));
    }

    #[test]
    fn test_condition_answers() {
        let mut pins = StepLog::default();
        let termination = Termination::Condition(Polarity::StopWhen);
        let mut executor = MotionExecutor::new(termination, us(10), us(0), at(0));

        let mut answers = [false, false, true].into_iter();
        let mut now = 0;
        let result = loop {
            match executor.poll(&mut pins, at(now)).unwrap() {
                Progress::Wait(d) => now += d.ticks(),
                Progress::Condition => executor.answer(answers.next().unwrap()),
                Progress::Finished(r) => break r,
            }
        };

        assert_eq!(result.steps_done(), 2);
        assert_eq!(result.run_time().ticks(), 40);
        assert_eq!(executor.steps_target(), None);
    }

    #[test]
    fn test_advance_propagates_predicate_error() {
        let mut pins = StepLog::default();
        let termination = Termination::Condition(Polarity::ContinueWhile);
        let mut executor = MotionExecutor::new(termination, us(10), us(0), at(0));

        let mut failing = || -> core::result::Result<bool, Error> {
            Err(MotorError::PinNotProvided(crate::error::PinRole::Sleep).into())
        };
        let outcome = executor.advance(&mut pins, at(0), &mut failing);
        assert!(outcome.is_err());
        assert!(pins.levels.is_empty());
        assert!(!executor.is_done());
    }
}
