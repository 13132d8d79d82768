//! In-memory session slot.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::ports::SessionSlot;

/// Process-scoped slot backed by a map.
#[derive(Debug, Default)]
pub struct InMemorySessionSlot {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a key.
    pub fn with_value(self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value.into());
        self
    }
}

impl SessionSlot for InMemorySessionSlot {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn take(&self, key: &str) -> Option<String> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}
