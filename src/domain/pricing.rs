//! Derived booking prices.
//!
//! Nothing here is stored; every figure is recomputed from the tour price
//! and the draft's traveler count. Amounts are whole currency units and
//! every percentage is rounded half-up.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Percentage;

/// Non-negative amount in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Multiplies by a count, saturating on overflow.
    pub fn times(&self, count: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(count)))
    }

    /// Share of this amount expressed in basis points, rounded half-up.
    pub fn basis_points(&self, bps: u32) -> Self {
        let scaled = (u128::from(self.0) * u128::from(bps) + 5_000) / 10_000;
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }

    /// Share of this amount at a whole percentage, rounded half-up.
    pub fn percent(&self, rate: Percentage) -> Self {
        self.basis_points(u32::from(rate.value()) * 100)
    }

    pub fn saturating_add(&self, other: Amount) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fee and tax rates applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub service_fee: Percentage,
    /// Tax rate in basis points; zero omits the tax term.
    pub tax_basis_points: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            service_fee: Percentage::new(5),
            tax_basis_points: 0,
        }
    }
}

/// Price breakdown for one booking draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub unit_price: Amount,
    pub traveler_count: u32,
    pub total_price: Amount,
    pub service_fee: Amount,
    pub tax: Option<Amount>,
    pub final_total: Amount,
}

impl PriceQuote {
    /// Computes `total = unit × travelers`, `fee = round(total × rate)`,
    /// optional tax on the total, and `final = total + fee (+ tax)`.
    pub fn compute(unit_price: Amount, traveler_count: u32, policy: &PricingPolicy) -> Self {
        let total_price = unit_price.times(traveler_count);
        let service_fee = total_price.percent(policy.service_fee);
        let tax = (policy.tax_basis_points > 0)
            .then(|| total_price.basis_points(policy.tax_basis_points));
        let final_total = total_price
            .saturating_add(service_fee)
            .saturating_add(tax.unwrap_or(Amount::ZERO));

        Self {
            unit_price,
            traveler_count,
            total_price,
            service_fee,
            tax,
            final_total,
        }
    }
}

/// Displayed discount: `round((original − price) / original × 100)` when the
/// original price is higher, otherwise zero.
pub fn discount_percentage(original_price: Amount, price: Amount) -> Percentage {
    if original_price <= price {
        return Percentage::ZERO;
    }
    let original = u128::from(original_price.value());
    let saved = original - u128::from(price.value());
    let rounded = (saved * 200 + original) / (original * 2);
    Percentage::new(u8::try_from(rounded).unwrap_or(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quote_for_two_travelers() {
        let quote = PriceQuote::compute(Amount::new(25_000), 2, &PricingPolicy::default());
        assert_eq!(quote.total_price, Amount::new(50_000));
        assert_eq!(quote.service_fee, Amount::new(2_500));
        assert_eq!(quote.tax, None);
        assert_eq!(quote.final_total, Amount::new(52_500));
    }

    #[test]
    fn discount_rounds_to_nearest_whole_percent() {
        let pct = discount_percentage(Amount::new(30_000), Amount::new(25_000));
        assert_eq!(pct.value(), 17);
    }

    #[test]
    fn discount_is_zero_without_markdown() {
        assert_eq!(discount_percentage(Amount::new(100), Amount::new(100)), Percentage::ZERO);
        assert_eq!(discount_percentage(Amount::new(90), Amount::new(100)), Percentage::ZERO);
        assert_eq!(discount_percentage(Amount::ZERO, Amount::ZERO), Percentage::ZERO);
    }

    #[test]
    fn fee_rounds_half_up() {
        // 5% of 10_010 is 500.5
        let quote = PriceQuote::compute(Amount::new(10_010), 1, &PricingPolicy::default());
        assert_eq!(quote.service_fee, Amount::new(501));
    }

    #[test]
    fn tax_term_is_added_when_configured() {
        let policy = PricingPolicy {
            service_fee: Percentage::new(5),
            tax_basis_points: 750,
        };
        let quote = PriceQuote::compute(Amount::new(10_000), 1, &policy);
        assert_eq!(quote.tax, Some(Amount::new(750)));
        assert_eq!(quote.final_total, Amount::new(11_250));
    }

    proptest! {
        #[test]
        fn final_total_is_sum_of_parts(unit in 0u64..10_000_000, travelers in 1u32..50) {
            let quote = PriceQuote::compute(Amount::new(unit), travelers, &PricingPolicy::default());
            prop_assert_eq!(quote.total_price.value(), unit * u64::from(travelers));
            prop_assert_eq!(
                quote.final_total.value(),
                quote.total_price.value() + quote.service_fee.value()
            );
        }

        #[test]
        fn discount_never_exceeds_hundred(original in 1u64..1_000_000, price in 0u64..1_000_000) {
            let pct = discount_percentage(Amount::new(original), Amount::new(price));
            prop_assert!(pct.value() <= 100);
        }
    }
}
