//! Tab-scoped key/value slot.
//!
//! Holds the "redirect after sign-in" target across the sign-in detour.

/// Synchronous string slot, scoped to one browser tab or process.
pub trait SessionSlot: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    /// Reads and removes the value in one step.
    fn take(&self, key: &str) -> Option<String>;
}
