//! Microstepping mode table.
//!
//! Maps each DRV8825 stepping mode to the M0/M1/M2 line levels that select it
//! and to its steps-per-revolution multiplier relative to full stepping.

use core::fmt;

use embedded_hal::digital::PinState::{self, High, Low};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Microstepping resolution of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MicrostepMode {
    /// Full step.
    #[default]
    Full,
    /// Half step.
    Half,
    /// Quarter step.
    Quarter,
    /// Eighth step.
    Eighth,
    /// Sixteenth step.
    Sixteenth,
    /// Thirty-second step (maximum DRV8825 resolution).
    ThirtySecond,
}

impl MicrostepMode {
    /// All modes, coarsest first.
    pub const ALL: [MicrostepMode; 6] = [
        MicrostepMode::Full,
        MicrostepMode::Half,
        MicrostepMode::Quarter,
        MicrostepMode::Eighth,
        MicrostepMode::Sixteenth,
        MicrostepMode::ThirtySecond,
    ];

    /// Line levels for M0, M1, M2 (in that order).
    pub const fn lines(self) -> [PinState; 3] {
        match self {
            MicrostepMode::Full => [Low, Low, Low],
            MicrostepMode::Half => [High, Low, Low],
            MicrostepMode::Quarter => [Low, High, Low],
            MicrostepMode::Eighth => [High, High, Low],
            MicrostepMode::Sixteenth => [Low, Low, High],
            MicrostepMode::ThirtySecond => [High, Low, High],
        }
    }

    /// Microsteps per full step.
    pub const fn multiplier(self) -> u16 {
        match self {
            MicrostepMode::Full => 1,
            MicrostepMode::Half => 2,
            MicrostepMode::Quarter => 4,
            MicrostepMode::Eighth => 8,
            MicrostepMode::Sixteenth => 16,
            MicrostepMode::ThirtySecond => 32,
        }
    }

    /// Display name as printed on driver datasheets.
    pub const fn name(self) -> &'static str {
        match self {
            MicrostepMode::Full => "FULL",
            MicrostepMode::Half => "HALF",
            MicrostepMode::Quarter => "QUARTER",
            MicrostepMode::Eighth => "1/8",
            MicrostepMode::Sixteenth => "1/16",
            MicrostepMode::ThirtySecond => "1/32",
        }
    }

    /// Look up a mode by its microstep multiplier.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedMode` if no mode uses that multiplier.
    pub fn from_multiplier(value: u16) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.multiplier() == value)
            .ok_or_else(|| {
                use core::fmt::Write;
                let mut name = heapless::String::new();
                let _ = write!(name, "{}", value);
                ConfigError::UnsupportedMode(name)
            })
    }

    /// Look up a mode by name (`"FULL"`, `"half"`, `"1/16"`, ...).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedMode` for unknown names.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                let mut truncated = heapless::String::new();
                for c in name.chars() {
                    if truncated.push(c).is_err() {
                        break;
                    }
                }
                ConfigError::UnsupportedMode(truncated)
            })
    }
}

impl fmt::Display for MicrostepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u16> for MicrostepMode {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_multiplier(value)
    }
}

impl core::str::FromStr for MicrostepMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl<'de> Deserialize<'de> for MicrostepMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ModeVisitor)
    }
}

/// Accepts either a name (`"1/16"`) or a multiplier (`16`).
struct ModeVisitor;

impl ModeVisitor {
    fn reject<E: de::Error>(e: ConfigError) -> E {
        use core::fmt::Write;
        let mut buf = heapless::String::<128>::new();
        let _ = write!(buf, "{}", e);
        E::custom(buf.as_str())
    }
}

impl<'de> Visitor<'de> for ModeVisitor {
    type Value = MicrostepMode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a microstepping mode name or microstep count")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        MicrostepMode::from_name(v).map_err(Self::reject)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let value = u16::try_from(v).unwrap_or(u16::MAX);
        MicrostepMode::from_multiplier(value).map_err(Self::reject)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        let value = u16::try_from(v).unwrap_or(u16::MAX);
        MicrostepMode::from_multiplier(value).map_err(Self::reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_table_matches_datasheet() {
        assert_eq!(MicrostepMode::Full.lines(), [Low, Low, Low]);
        assert_eq!(MicrostepMode::Eighth.lines(), [High, High, Low]);
        assert_eq!(MicrostepMode::ThirtySecond.lines(), [High, Low, High]);
        assert_eq!(MicrostepMode::ThirtySecond.multiplier(), 32);
    }

    #[test]
    fn test_default_is_full() {
        assert_eq!(MicrostepMode::default(), MicrostepMode::Full);
    }

    #[test]
    fn test_lookup_by_multiplier() {
        for mode in MicrostepMode::ALL {
            assert_eq!(MicrostepMode::from_multiplier(mode.multiplier()), Ok(mode));
        }
        assert!(matches!(
            MicrostepMode::from_multiplier(64),
            Err(ConfigError::UnsupportedMode(ref s)) if s.as_str() == "64"
        ));
        assert!(MicrostepMode::from_multiplier(3).is_err());
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!("half".parse::<MicrostepMode>(), Ok(MicrostepMode::Half));
        assert_eq!("1/16".parse::<MicrostepMode>(), Ok(MicrostepMode::Sixteenth));
        assert!("1/64".parse::<MicrostepMode>().is_err());
    }
}
