//! Declarative transient notices.
//!
//! A notice is shown for a fixed number of one-second ticks and then
//! dismissed by normal state transitions; views only render what is present.

use serde::{Deserialize, Serialize};

/// Visual weight of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
}

/// A message that dismisses itself after `remaining_ticks` ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransientNotice {
    pub message: String,
    pub level: NoticeLevel,
    remaining_ticks: u32,
}

impl TransientNotice {
    /// Default lifetime in ticks.
    pub const DEFAULT_TICKS: u32 = 5;

    /// Creates a success notice with the default lifetime.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Success, Self::DEFAULT_TICKS)
    }

    /// Creates an info notice with the default lifetime.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Info, Self::DEFAULT_TICKS)
    }

    /// Creates a notice with an explicit lifetime.
    pub fn new(message: impl Into<String>, level: NoticeLevel, ticks: u32) -> Self {
        Self {
            message: message.into(),
            level,
            remaining_ticks: ticks.max(1),
        }
    }

    /// Ticks left before dismissal.
    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    /// Advances one tick; returns true once the notice has expired.
    pub fn tick(&mut self) -> bool {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        self.remaining_ticks == 0
    }
}
