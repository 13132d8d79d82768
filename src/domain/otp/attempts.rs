//! Cap on incorrect one-time code submissions.

/// Counts failed verifications for the currently issued code.
///
/// Once exhausted, submissions are refused locally until a new code is
/// issued and `reset` is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptGuard {
    max_failures: u32,
    failures: u32,
}

impl AttemptGuard {
    /// Creates a guard allowing `max_failures` incorrect codes.
    pub fn new(max_failures: u32) -> Self {
        Self {
            max_failures: max_failures.max(1),
            failures: 0,
        }
    }

    /// Records an incorrect code; returns true if the guard is now exhausted.
    pub fn record_failure(&mut self) -> bool {
        self.failures = self.failures.saturating_add(1);
        self.is_exhausted()
    }

    /// Returns true if no further submissions are allowed.
    pub fn is_exhausted(&self) -> bool {
        self.failures >= self.max_failures
    }

    /// Failed submissions so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Starts counting afresh for a newly issued code.
    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_at_the_cap() {
        let mut guard = AttemptGuard::new(3);
        assert!(!guard.record_failure());
        assert!(!guard.record_failure());
        assert!(guard.record_failure());
        assert!(guard.is_exhausted());
    }

    #[test]
    fn reset_restores_attempts() {
        let mut guard = AttemptGuard::new(1);
        guard.record_failure();
        guard.reset();
        assert!(!guard.is_exhausted());
        assert_eq!(guard.failures(), 0);
    }
}
