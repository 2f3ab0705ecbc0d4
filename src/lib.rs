//! # drv8825-motion
//!
//! DRV8825 stepper driver control over embedded-hal 1.0.
//!
//! ## Features
//!
//! - **Three motion strategies** on one timing model: blocking, polled
//!   (`tick` from your own loop) and cooperative (`async`)
//! - **Mode table**: FULL to 1/32 microstepping through the M0..M2 lines
//! - **Lifecycle control**: enable, disable, sleep, wake and reset, with the
//!   wake settle time honored before the first step
//! - **Configuration-driven**: define motors in TOML files
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drv8825_motion::{Drv8825Builder, MicrostepMode, StdClock};
//!
//! let mut motor = Drv8825Builder::new()
//!     .step_pin(step)
//!     .direction_pin(dir)
//!     .enable_pin(en)
//!     .mode_pins([m0, m1, m2])
//!     .mode(MicrostepMode::Half)
//!     .delay(delay)
//!     .clock(StdClock::new())
//!     .build()?;
//!
//! // Two turns clockwise, 500 ms each
//! let result = motor.rotate(2.0, true)?;
//! assert_eq!(result.steps_done(), 800);
//!
//! // Polled: drive from your own loop
//! let mut motion = motor.steps_non_blocking(100, false, |r| r.steps_done())?;
//! while !motor.tick(&mut motion)? {
//!     // other work
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O, TOML parsing and `StdClock`
//! - `async` (default): Enables the `*_async` motions over embedded-hal-async
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod error;
pub mod motion;
pub mod motor;

// Re-exports for ergonomic API
pub use config::{validate_config, MicrostepMode, MotorConfig, SleepPolicy, SystemConfig};
pub use error::{Error, Result};
pub use motion::{
    Clock, Direction, Duration, Instant, MotionExecutor, MotionPhase, MotionRequest,
    MotionResult, Polarity, Progress, PulseTiming,
};
pub use motor::{
    state, Drv8825, Drv8825Builder, Drv8825Pins, DriverPins, NoPin, NonBlockingMotion,
    PowerState, StepCondition,
};

#[cfg(feature = "std")]
pub use motion::StdClock;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
