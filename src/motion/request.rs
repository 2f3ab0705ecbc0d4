//! Motion requests and their resolution into a termination rule.

use libm::roundf;

use crate::error::{ConfigError, Result};

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise (DIR high).
    Clockwise,
    /// Counter-clockwise (DIR low).
    CounterClockwise,
}

impl Direction {
    /// Whether this is clockwise.
    #[inline]
    pub fn is_clockwise(self) -> bool {
        self == Direction::Clockwise
    }
}

impl From<bool> for Direction {
    #[inline]
    fn from(clockwise: bool) -> Self {
        if clockwise {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }
}

/// How a predicate's answer is read at each step boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Step while the predicate returns `true`.
    ContinueWhile,
    /// Stop as soon as the predicate returns `true`.
    StopWhen,
}

impl Polarity {
    /// Whether another step should be taken for a raw predicate answer.
    #[inline]
    pub fn keep_going(self, answer: bool) -> bool {
        match self {
            Polarity::ContinueWhile => answer,
            Polarity::StopWhen => !answer,
        }
    }
}

/// Parameters of one motion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionRequest {
    /// A fixed number of steps.
    Steps(u32),
    /// A number of revolutions at the active mode; may be fractional.
    Revolutions(f32),
    /// Unbounded, terminated by a predicate.
    Condition(Polarity),
}

/// Resolved termination rule of a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Termination {
    /// Stop once this many steps are done.
    AfterSteps(u32),
    /// Ask the predicate before every step.
    Condition(Polarity),
}

impl Termination {
    /// Step target, if the motion is bounded.
    #[inline]
    pub fn steps_target(self) -> Option<u32> {
        match self {
            Termination::AfterSteps(n) => Some(n),
            Termination::Condition(_) => None,
        }
    }
}

impl MotionRequest {
    /// Resolve into a termination rule.
    ///
    /// Revolutions convert to `round(revolutions × steps_per_revolution)`,
    /// with halves rounded away from zero. Rounding happens once here, never
    /// per step.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRevolutions` for negative, non-finite or
    /// out-of-range revolution counts.
    pub fn resolve(self, steps_per_revolution: u32) -> Result<Termination> {
        match self {
            MotionRequest::Steps(n) => Ok(Termination::AfterSteps(n)),
            MotionRequest::Revolutions(revolutions) => {
                if !(revolutions.is_finite() && revolutions >= 0.0) {
                    return Err(ConfigError::InvalidRevolutions(revolutions).into());
                }
                let steps = roundf(revolutions * steps_per_revolution as f32);
                if steps >= u32::MAX as f32 {
                    return Err(ConfigError::InvalidRevolutions(revolutions).into());
                }
                Ok(Termination::AfterSteps(steps as u32))
            }
            MotionRequest::Condition(polarity) => Ok(Termination::Condition(polarity)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MicrostepMode;
    use crate::error::Error;

    #[test]
    fn test_revolutions_at_half_step() {
        let spr = 200 * MicrostepMode::Half.multiplier() as u32;
        let target = MotionRequest::Revolutions(2.0).resolve(spr).unwrap();
        assert_eq!(target.steps_target(), Some(800));
    }

    #[test]
    fn test_fractional_revolutions_round_half_away() {
        // 0.0025 * 200 = 0.5 -> 1
        let target = MotionRequest::Revolutions(0.0025).resolve(200).unwrap();
        assert_eq!(target, Termination::AfterSteps(1));

        let target = MotionRequest::Revolutions(1.5).resolve(200).unwrap();
        assert_eq!(target, Termination::AfterSteps(300));
    }

    #[test]
    fn test_invalid_revolutions() {
        for bad in [-1.0, f32::NAN, f32::INFINITY, 1e12] {
            assert!(matches!(
                MotionRequest::Revolutions(bad).resolve(200),
                Err(Error::Config(ConfigError::InvalidRevolutions(_)))
            ));
        }

        // 2^32 steps would saturate to u32::MAX
        assert!(matches!(
            MotionRequest::Revolutions(4_294_967_296.0).resolve(1),
            Err(Error::Config(ConfigError::InvalidRevolutions(_)))
        ));
    }

    #[test]
    fn test_polarity() {
        assert!(Polarity::ContinueWhile.keep_going(true));
        assert!(!Polarity::ContinueWhile.keep_going(false));
        assert!(!Polarity::StopWhen.keep_going(true));
        assert!(Polarity::StopWhen.keep_going(false));
    }
}
