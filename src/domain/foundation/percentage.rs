//! Whole-number percentages for discounts and fee rates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 0 to 100 inclusive; larger inputs clamp to 100.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_one_hundred() {
        assert_eq!(Percentage::new(17).value(), 17);
        assert_eq!(Percentage::new(250).value(), 100);
        assert_eq!(Percentage::default(), Percentage::ZERO);
    }

    #[test]
    fn displays_as_discount_badge() {
        assert_eq!(Percentage::new(17).to_string(), "17%");
    }
}
