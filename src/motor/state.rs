//! Driver power states.

use crate::motion::Instant;

/// Power state of the driver as seen by the lifecycle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Awake, outputs energized.
    AwakeEnabled,
    /// Awake, outputs off (coils free).
    AwakeDisabled,
    /// In low-power sleep; step inputs are ignored.
    Asleep,
}

impl PowerState {
    /// State name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            PowerState::AwakeEnabled => "AwakeEnabled",
            PowerState::AwakeDisabled => "AwakeDisabled",
            PowerState::Asleep => "Asleep",
        }
    }
}

/// Lifecycle flags kept by the motor.
///
/// Enable and sleep are independent lines on the driver, so both are tracked
/// and the reported state is derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lifecycle {
    pub enabled: bool,
    pub asleep: bool,
    /// Time of the last sleep-to-wake transition, cleared when a motion
    /// consumes it.
    pub woke_at: Option<Instant>,
}

impl Lifecycle {
    pub fn awake() -> Self {
        Self {
            enabled: true,
            asleep: false,
            woke_at: None,
        }
    }

    pub fn state(&self) -> PowerState {
        match (self.asleep, self.enabled) {
            (true, _) => PowerState::Asleep,
            (false, true) => PowerState::AwakeEnabled,
            (false, false) => PowerState::AwakeDisabled,
        }
    }

    pub fn sleep(&mut self) {
        self.asleep = true;
        self.woke_at = None;
    }

    /// Leave sleep. `at` is `None` when no sleep line is wired, in which case
    /// the driver never actually slept and needs no settle time.
    pub fn wake(&mut self, at: Option<Instant>) {
        if self.asleep {
            self.woke_at = at;
        }
        self.asleep = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_state() {
        let mut lifecycle = Lifecycle::awake();
        assert_eq!(lifecycle.state(), PowerState::AwakeEnabled);

        lifecycle.enabled = false;
        assert_eq!(lifecycle.state(), PowerState::AwakeDisabled);

        lifecycle.sleep();
        assert_eq!(lifecycle.state(), PowerState::Asleep);

        // Enable while asleep is legal but the driver stays asleep
        lifecycle.enabled = true;
        assert_eq!(lifecycle.state(), PowerState::Asleep);
    }

    #[test]
    fn test_wake_arms_settle_only_from_sleep() {
        let at = Instant::from_ticks(42);
        let mut lifecycle = Lifecycle::awake();
        lifecycle.wake(Some(at));
        assert_eq!(lifecycle.woke_at, None);

        lifecycle.sleep();
        lifecycle.wake(Some(at));
        assert_eq!(lifecycle.woke_at, Some(at));
        assert_eq!(lifecycle.state().name(), "AwakeEnabled");
    }
}
