//! Basic motor control example.
//!
//! Builds a DRV8825 motor on host "pins" that print their transitions and
//! runs one motion with each strategy.
//!
//! Run with: `cargo run --example basic_motor`

use std::task::Poll;

use drv8825_motion::{Drv8825Builder, MicrostepMode, StdClock};

/// Real-time delay on the host.
struct StdDelay;

impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}

/// Sleeps the thread, then yields once so other tasks get a turn. A real
/// async delay would yield for the whole wait.
impl embedded_hal_async::delay::DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));

        let mut yielded = false;
        core::future::poll_fn(|cx| {
            if yielded {
                Poll::Ready(())
            } else {
                yielded = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        })
        .await;
    }
}

/// Output pin that only reports level changes.
struct ConsolePin {
    name: &'static str,
    state: Option<bool>,
    quiet: bool,
}

impl ConsolePin {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            state: None,
            quiet: false,
        }
    }

    fn quiet(name: &'static str) -> Self {
        Self {
            quiet: true,
            ..Self::new(name)
        }
    }

    fn set(&mut self, high: bool) {
        if self.state != Some(high) && !self.quiet {
            println!("  {} -> {}", self.name, if high { "HIGH" } else { "LOW" });
        }
        self.state = Some(high);
    }
}

impl embedded_hal::digital::ErrorType for ConsolePin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for ConsolePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

fn main() -> drv8825_motion::Result<()> {
    println!("=== DRV8825 Basic Example ===\n");

    println!("Init:");
    let mut motor = Drv8825Builder::new()
        .name("demo")
        .step_pin(ConsolePin::quiet("STEP"))
        .direction_pin(ConsolePin::new("DIR"))
        .enable_pin(ConsolePin::new("EN"))
        .mode_pins([
            ConsolePin::new("M0"),
            ConsolePin::new("M1"),
            ConsolePin::new("M2"),
        ])
        .sleep_pin(ConsolePin::new("SLP"))
        .mode(MicrostepMode::Quarter)
        .target_time_for_one_revolution_ms(1_000.0)
        .delay(StdDelay)
        .clock(StdClock::new())
        .build()?;

    println!(
        "\n{}: {} mode, {} steps/rev, half pulse {} us",
        motor.name(),
        motor.mode(),
        motor.steps_per_revolution(),
        motor.timing().half_pulse().ticks()
    );

    println!("\nBlocking: a quarter turn clockwise");
    let result = motor.rotate(0.25, true)?;
    println!("  {} steps in {} ms", result.steps_done(), result.run_time_ms());

    println!("\nPolled: 100 steps counter-clockwise");
    let mut motion = motor.steps_non_blocking(100, false, |r| r.steps_done() * 2)?;
    let mut ticks = 0u32;
    while !motor.tick(&mut motion)? {
        ticks += 1;
    }
    if let Some(result) = motion.result() {
        println!(
            "  {} steps in {} ms over {} ticks, callback returned {:?}",
            result.steps_done(),
            result.run_time_ms(),
            ticks,
            result.callback_result()
        );
    }

    println!("\nAsync: step until 50 predicate calls, after a sleep");
    motor.sleep()?;
    let mut calls = 0;
    let result = futures::executor::block_on(motor.rotate_until_async(
        || {
            calls += 1;
            core::future::ready(calls > 50)
        },
        true,
    ))?;
    println!("  {} steps in {} ms", result.steps_done(), result.run_time_ms());

    println!("\nShutdown:");
    motor.disable()?;
    motor.sleep()?;
    println!("  state: {}", motor.power_state().name());

    Ok(())
}
