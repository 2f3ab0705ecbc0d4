//! Motor module for drv8825-motion.
//!
//! Provides the DRV8825 driver with its lifecycle controller and the three
//! motion strategies: blocking, polled and cooperative.

#[cfg(feature = "async")]
mod asynch;
mod builder;
mod driver;
mod non_blocking;
mod pins;
pub mod state;

pub use builder::{BuiltDrv8825, Drv8825Builder};
pub use driver::{Drv8825, MotionToken};
pub use non_blocking::{NoCondition, NonBlockingMotion, Predicate, StepCondition, TryPredicate};
pub use pins::{DriverPins, Drv8825Pins, NoPin};
pub use state::PowerState;
