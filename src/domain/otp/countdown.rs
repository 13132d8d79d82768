//! Resend gate.

/// Countdown that must reach zero before a code can be resent.
///
/// Driven by one tick per second; the owning timer is cancelled when the
/// prompt is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendCountdown {
    cooldown: u32,
    remaining: u32,
}

impl ResendCountdown {
    /// A countdown that has just been started, as after sending a code.
    pub fn started(cooldown: u32) -> Self {
        Self {
            cooldown,
            remaining: cooldown,
        }
    }

    /// Restarts the countdown after a resend.
    pub fn restart(&mut self) {
        self.remaining = self.cooldown;
    }

    /// Advances one tick and returns the remaining ticks.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    /// Ticks left before resend is enabled.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns true once resend is enabled.
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::otp::RESEND_COOLDOWN_TICKS;

    #[test]
    fn resend_is_disabled_for_exactly_the_cooldown() {
        let mut countdown = ResendCountdown::started(RESEND_COOLDOWN_TICKS);
        for tick in 1..RESEND_COOLDOWN_TICKS {
            countdown.tick();
            assert!(!countdown.is_ready(), "enabled early at tick {}", tick);
        }
        countdown.tick();
        assert!(countdown.is_ready());
    }

    #[test]
    fn restart_disables_again() {
        let mut countdown = ResendCountdown::started(2);
        countdown.tick();
        countdown.tick();
        assert!(countdown.is_ready());
        countdown.restart();
        assert_eq!(countdown.remaining(), 2);
        assert!(!countdown.is_ready());
    }

    #[test]
    fn ticking_past_zero_saturates() {
        let mut countdown = ResendCountdown::started(1);
        assert_eq!(countdown.tick(), 0);
        assert_eq!(countdown.tick(), 0);
    }
}
