//! Checkout pricing configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::Percentage;
use crate::domain::pricing::PricingPolicy;

/// Fee and tax rates applied to booking quotes
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PricingConfig {
    /// Service fee as a whole percentage of the total
    #[serde(default = "default_service_fee_percent")]
    pub service_fee_percent: u8,

    /// Tax in basis points; 0 omits the tax line
    #[serde(default)]
    pub tax_basis_points: u32,
}

impl PricingConfig {
    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            service_fee: Percentage::new(self.service_fee_percent),
            tax_basis_points: self.tax_basis_points,
        }
    }

    /// Validate pricing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_fee_percent > 100 {
            return Err(ValidationError::InvalidServiceFee);
        }
        if self.tax_basis_points > 10_000 {
            return Err(ValidationError::InvalidTaxRate);
        }
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            service_fee_percent: default_service_fee_percent(),
            tax_basis_points: 0,
        }
    }
}

fn default_service_fee_percent() -> u8 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_checkout() {
        let policy = PricingConfig::default().policy();
        assert_eq!(policy, PricingPolicy::default());
    }

    #[test]
    fn test_rejects_out_of_range_rates() {
        let config = PricingConfig {
            service_fee_percent: 101,
            tax_basis_points: 0,
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidServiceFee));
    }
}
