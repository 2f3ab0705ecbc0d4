//! Simulated time and recording pins shared by the integration tests.

#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::rc::Rc;

use drv8825_motion::{Clock, Drv8825, Drv8825Builder, Drv8825Pins, Instant, NoPin};
use embedded_hal::digital::{ErrorType, OutputPin, PinState};

/// Simulated monotonic time in nanoseconds. Only delays move it forward.
#[derive(Clone, Default)]
pub struct SimTime(Rc<Cell<u64>>);

impl SimTime {
    pub fn now_us(&self) -> u64 {
        self.0.get() / 1_000
    }

    pub fn advance_us(&self, us: u64) {
        self.0.set(self.0.get() + us * 1_000);
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

impl Clock for SimTime {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.now_us())
    }
}

/// Reads [`SimTime`] at millisecond resolution, like a 1 kHz tick counter.
#[derive(Clone)]
pub struct MillisClock(pub SimTime);

impl Clock for MillisClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.0.now_us() / 1_000 * 1_000)
    }
}

/// Delay that advances [`SimTime`] instead of sleeping.
///
/// The async flavor yields once after advancing, so joined tasks get to run
/// during every wait.
pub struct SimDelay {
    time: SimTime,
}

impl SimDelay {
    pub fn new(time: SimTime) -> Self {
        Self { time }
    }
}

impl embedded_hal::delay::DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.time.advance_ns(ns as u64);
    }
}

impl embedded_hal_async::delay::DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.time.advance_ns(ns as u64);
        yield_now().await;
    }
}

/// Future that is pending exactly once.
pub struct YieldNow(bool);

pub fn yield_now() -> YieldNow {
    YieldNow(false)
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Output pin that records every write with its simulated timestamp (µs).
#[derive(Clone)]
pub struct RecordingPin {
    time: SimTime,
    log: Rc<RefCell<Vec<(u64, PinState)>>>,
}

impl RecordingPin {
    pub fn new(time: &SimTime) -> Self {
        Self {
            time: time.clone(),
            log: Rc::default(),
        }
    }

    pub fn writes(&self) -> Vec<(u64, PinState)> {
        self.log.borrow().clone()
    }

    pub fn levels(&self) -> Vec<PinState> {
        self.log.borrow().iter().map(|(_, s)| *s).collect()
    }

    pub fn last(&self) -> Option<PinState> {
        self.log.borrow().last().map(|(_, s)| *s)
    }

    /// Times of low-to-high transitions (the first high counts).
    pub fn rising_edges(&self) -> Vec<u64> {
        let mut previous = PinState::Low;
        let mut edges = Vec::new();
        for (at, state) in self.log.borrow().iter() {
            if *state == PinState::High && previous == PinState::Low {
                edges.push(*at);
            }
            previous = *state;
        }
        edges
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.time.now_us(), PinState::Low));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.time.now_us(), PinState::High));
        Ok(())
    }
}

pub type SimPins = Drv8825Pins<RecordingPin, RecordingPin, RecordingPin, RecordingPin, RecordingPin, NoPin>;
pub type SimMotor = Drv8825<SimPins, SimDelay, SimTime>;
pub type SimBuilder = Drv8825Builder<
    RecordingPin,
    RecordingPin,
    RecordingPin,
    RecordingPin,
    SimDelay,
    SimTime,
    RecordingPin,
    NoPin,
>;

/// One simulated driver board: shared time plus a handle on every line.
pub struct Rig {
    pub time: SimTime,
    pub step: RecordingPin,
    pub dir: RecordingPin,
    pub enable: RecordingPin,
    pub mode: [RecordingPin; 3],
    pub sleep: RecordingPin,
}

impl Rig {
    pub fn new() -> Self {
        let time = SimTime::default();
        Self {
            step: RecordingPin::new(&time),
            dir: RecordingPin::new(&time),
            enable: RecordingPin::new(&time),
            mode: [
                RecordingPin::new(&time),
                RecordingPin::new(&time),
                RecordingPin::new(&time),
            ],
            sleep: RecordingPin::new(&time),
            time,
        }
    }

    /// Builder with every line of this rig wired in.
    pub fn builder(&self) -> SimBuilder {
        self.builder_with_clock(self.time.clone())
    }

    /// Same as [`builder`](Self::builder) with another view of the rig's time.
    pub fn builder_with_clock<C: Clock>(
        &self,
        clock: C,
    ) -> Drv8825Builder<RecordingPin, RecordingPin, RecordingPin, RecordingPin, SimDelay, C, RecordingPin, NoPin>
    {
        Drv8825Builder::new()
            .step_pin(self.step.clone())
            .direction_pin(self.dir.clone())
            .enable_pin(self.enable.clone())
            .mode_pins(self.mode.clone())
            .delay(SimDelay::new(self.time.clone()))
            .clock(clock)
            .sleep_pin(self.sleep.clone())
    }

    /// Default motor (FULL, 500 ms per revolution, settle not yet consumed).
    pub fn motor(&self) -> SimMotor {
        self.builder().build().unwrap()
    }

    /// Levels currently on M0, M1, M2.
    pub fn mode_lines(&self) -> [Option<PinState>; 3] {
        [self.mode[0].last(), self.mode[1].last(), self.mode[2].last()]
    }
}
