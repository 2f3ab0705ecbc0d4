//! Monotonic time source.

/// Point in time with microsecond ticks.
pub type Instant = fugit::TimerInstantU64<1_000_000>;

/// Span of time with microsecond ticks.
pub type Duration = fugit::MicrosDurationU64;

/// Something which reports monotonic time.
///
/// Times step edges of polled motions and measures run time everywhere.
/// Blocking and async motions take their edge timing from the delay, so a
/// millisecond tick source adapted with
/// `|| Instant::from_ticks(millis() * 1_000)` still gives exact pulses there.
pub trait Clock {
    /// Current time. Must never go backwards.
    fn now(&self) -> Instant;
}

impl<F> Clock for F
where
    F: Fn() -> Instant,
{
    fn now(&self) -> Instant {
        self()
    }
}

/// A monotonically non-decreasing clock backed by the operating system.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct StdClock {
    created_at: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose zero is now.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self {
            created_at: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&self) -> Instant {
        let micros = self.created_at.elapsed().as_micros();
        Instant::from_ticks(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}

/// Time between `earlier` and `later`, zero if the clock was sampled out of order.
#[inline]
pub(crate) fn since(later: Instant, earlier: Instant) -> Duration {
    later
        .checked_duration_since(earlier)
        .unwrap_or(Duration::from_ticks(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_clock() {
        let clock = || Instant::from_ticks(1_500);
        assert_eq!(clock.now().ticks(), 1_500);
    }

    #[test]
    fn test_since_saturates() {
        let a = Instant::from_ticks(10);
        let b = Instant::from_ticks(25);
        assert_eq!(since(b, a).ticks(), 15);
        assert_eq!(since(a, b).ticks(), 0);
    }
}
