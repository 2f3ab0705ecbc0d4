//! Motion module for drv8825-motion.
//!
//! Provides pulse timing, request resolution and the step execution state
//! machine shared by all motion strategies.

pub mod clock;
mod executor;
mod request;
mod result;
mod timing;

pub use clock::{Clock, Duration, Instant};
#[cfg(feature = "std")]
pub use clock::StdClock;
pub use executor::{MotionExecutor, MotionPhase, Progress};
pub use request::{Direction, MotionRequest, Polarity, Termination};
pub use result::MotionResult;
pub use timing::PulseTiming;
