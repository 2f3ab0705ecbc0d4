//! Driver line bundle.
//!
//! The motor talks to the DRV8825 exclusively through [`DriverPins`], so any
//! set of embedded-hal output pins (or a test double) can drive it.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use crate::error::{MotorError, PinRole};

/// Write access to the logical driver lines.
///
/// Levels are electrical levels; active-low handling is done by the motor.
pub trait DriverPins {
    /// Drive the STEP line.
    fn set_step(&mut self, state: PinState) -> Result<(), MotorError>;

    /// Drive the DIR line.
    fn set_direction(&mut self, state: PinState) -> Result<(), MotorError>;

    /// Drive the nENBL line.
    fn set_enable(&mut self, state: PinState) -> Result<(), MotorError>;

    /// Drive the nSLEEP line. Returns `false` if no sleep line is wired.
    fn set_sleep(&mut self, state: PinState) -> Result<bool, MotorError>;

    /// Drive the nRESET line. Returns `false` if no reset line is wired.
    fn set_reset(&mut self, state: PinState) -> Result<bool, MotorError>;

    /// Drive M0, M1, M2, in that order.
    fn set_mode_lines(&mut self, lines: [PinState; 3]) -> Result<(), MotorError>;
}

/// Placeholder for an optional line that is not wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// The six DRV8825 control lines.
///
/// Sleep and reset are optional; on many breakout boards they are tied
/// together and pulled up.
pub struct Drv8825Pins<STEP, DIR, EN, MODE, SLP = NoPin, RST = NoPin> {
    /// STEP pin (one rising edge per microstep).
    pub step: STEP,
    /// DIR pin (high = clockwise).
    pub direction: DIR,
    /// nENBL pin (low = outputs enabled).
    pub enable: EN,
    /// MODE0, MODE1, MODE2 pins.
    pub mode: [MODE; 3],
    /// nSLEEP pin (low = sleep).
    pub sleep: Option<SLP>,
    /// nRESET pin (low = reset).
    pub reset: Option<RST>,
}

impl<STEP, DIR, EN, MODE> Drv8825Pins<STEP, DIR, EN, MODE>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    MODE: OutputPin,
{
    /// Bundle the required lines.
    pub fn new(step: STEP, direction: DIR, enable: EN, mode: [MODE; 3]) -> Self {
        Self {
            step,
            direction,
            enable,
            mode,
            sleep: None,
            reset: None,
        }
    }
}

impl<STEP, DIR, EN, MODE, SLP, RST> Drv8825Pins<STEP, DIR, EN, MODE, SLP, RST> {
    /// Add the nSLEEP line.
    pub fn with_sleep<S: OutputPin>(self, sleep: S) -> Drv8825Pins<STEP, DIR, EN, MODE, S, RST> {
        Drv8825Pins {
            step: self.step,
            direction: self.direction,
            enable: self.enable,
            mode: self.mode,
            sleep: Some(sleep),
            reset: self.reset,
        }
    }

    /// Add the nRESET line.
    pub fn with_reset<R: OutputPin>(self, reset: R) -> Drv8825Pins<STEP, DIR, EN, MODE, SLP, R> {
        Drv8825Pins {
            step: self.step,
            direction: self.direction,
            enable: self.enable,
            mode: self.mode,
            sleep: self.sleep,
            reset: Some(reset),
        }
    }
}

impl<STEP, DIR, EN, MODE, SLP, RST> DriverPins for Drv8825Pins<STEP, DIR, EN, MODE, SLP, RST>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    MODE: OutputPin,
    SLP: OutputPin,
    RST: OutputPin,
{
    #[inline]
    fn set_step(&mut self, state: PinState) -> Result<(), MotorError> {
        self.step
            .set_state(state)
            .map_err(|_| MotorError::Pin(PinRole::Step))
    }

    fn set_direction(&mut self, state: PinState) -> Result<(), MotorError> {
        self.direction
            .set_state(state)
            .map_err(|_| MotorError::Pin(PinRole::Direction))
    }

    fn set_enable(&mut self, state: PinState) -> Result<(), MotorError> {
        self.enable
            .set_state(state)
            .map_err(|_| MotorError::Pin(PinRole::Enable))
    }

    fn set_sleep(&mut self, state: PinState) -> Result<bool, MotorError> {
        match self.sleep.as_mut() {
            Some(pin) => {
                pin.set_state(state)
                    .map_err(|_| MotorError::Pin(PinRole::Sleep))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_reset(&mut self, state: PinState) -> Result<bool, MotorError> {
        match self.reset.as_mut() {
            Some(pin) => {
                pin.set_state(state)
                    .map_err(|_| MotorError::Pin(PinRole::Reset))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_mode_lines(&mut self, lines: [PinState; 3]) -> Result<(), MotorError> {
        for (index, (pin, state)) in self.mode.iter_mut().zip(lines).enumerate() {
            pin.set_state(state)
                .map_err(|_| MotorError::Pin(PinRole::Mode(index as u8)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn idle() -> PinMock {
        let none: [Transaction; 0] = [];
        PinMock::new(&none)
    }

    #[test]
    fn test_mode_lines_written_in_order() {
        let m0 = PinMock::new(&[Transaction::set(State::High)]);
        let m1 = PinMock::new(&[Transaction::set(State::Low)]);
        let m2 = PinMock::new(&[Transaction::set(State::High)]);
        let mut handles = [m0.clone(), m1.clone(), m2.clone()];

        let mut pins = Drv8825Pins::new(idle(), idle(), idle(), [m0, m1, m2]);
        pins.set_mode_lines([PinState::High, PinState::Low, PinState::High])
            .unwrap();

        for handle in handles.iter_mut() {
            handle.done();
        }
        pins.step.done();
        pins.direction.done();
        pins.enable.done();
    }

    #[test]
    fn test_missing_optional_lines() {
        let mut pins = Drv8825Pins::new(idle(), idle(), idle(), [idle(), idle(), idle()]);
        assert_eq!(pins.set_sleep(PinState::Low), Ok(false));
        assert_eq!(pins.set_reset(PinState::Low), Ok(false));

        let sleep = PinMock::new(&[Transaction::set(State::Low)]);
        let mut sleep_handle = sleep.clone();
        let mut pins = pins.with_sleep(sleep);
        assert_eq!(pins.set_sleep(PinState::Low), Ok(true));
        sleep_handle.done();

        pins.step.done();
        pins.direction.done();
        pins.enable.done();
        for pin in pins.mode.iter_mut() {
            pin.done();
        }
    }
}
