use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Runtime-tunable knobs of the settlement engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Fraction of each session charge credited to the responder; the rest
    /// goes to the platform wallet. Must be in `[0, 1]`.
    pub split_ratio: Decimal,
    /// Flat amount deducted when a responder is penalized. The applied
    /// deduction is clamped to the wallet balance.
    pub penalty_amount: Decimal,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            split_ratio: Decimal::new(5, 1),
            penalty_amount: Decimal::new(50, 0),
        }
    }
}

impl SettlementConfig {
    /// Reject ratios outside `[0, 1]` and negative penalties at load time.
    pub fn validate(&self) -> Result<(), String> {
        if self.split_ratio < Decimal::ZERO || self.split_ratio > Decimal::ONE {
            return Err(format!(
                "split_ratio must be within [0, 1], got {}",
                self.split_ratio
            ));
        }
        if self.penalty_amount < Decimal::ZERO {
            return Err(format!(
                "penalty_amount must be non-negative, got {}",
                self.penalty_amount
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_half_split_and_flat_fifty() {
        let config = SettlementConfig::default();
        assert_eq!(config.split_ratio, Decimal::new(5, 1));
        assert_eq!(config.penalty_amount, Decimal::new(50, 0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_ratio() {
        let config = SettlementConfig {
            split_ratio: Decimal::new(15, 1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_penalty() {
        let config = SettlementConfig {
            penalty_amount: Decimal::new(-1, 0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
