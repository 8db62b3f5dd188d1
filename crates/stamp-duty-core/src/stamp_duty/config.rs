use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_CAPITAL, DEFAULT_JURISDICTION, DEFAULT_RULE_KEY, DISCLAIMER, PAN_TAN_FEE_INR,
};
use crate::error::StampDutyError;
use crate::types::Money;
use crate::StampDutyResult;

/// Engine defaults. Every field is optional in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Used when the request names no jurisdiction.
    pub default_jurisdiction: String,
    /// Used when the capital amount is missing, zero, or not a number.
    pub default_capital: Money,
    /// Assumed when the authorized-capital flag is absent.
    pub default_has_authorized_capital: bool,
    pub pan_tan_fee: Money,
    pub disclaimer: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_jurisdiction: DEFAULT_JURISDICTION.to_string(),
            default_capital: DEFAULT_CAPITAL,
            default_has_authorized_capital: false,
            pan_tan_fee: PAN_TAN_FEE_INR,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> StampDutyResult<()> {
        let jurisdiction = self.default_jurisdiction.trim();
        if jurisdiction.is_empty() {
            return Err(StampDutyError::InvalidInput {
                field: "default_jurisdiction".to_string(),
                reason: "Default jurisdiction must not be blank".to_string(),
            });
        }
        if jurisdiction.eq_ignore_ascii_case(DEFAULT_RULE_KEY) {
            return Err(StampDutyError::InvalidInput {
                field: "default_jurisdiction".to_string(),
                reason: "'default' is reserved for the fallback rule".to_string(),
            });
        }
        if self.default_capital < Decimal::ZERO {
            return Err(StampDutyError::InvalidInput {
                field: "default_capital".to_string(),
                reason: "Default capital cannot be negative".to_string(),
            });
        }
        if self.pan_tan_fee < Decimal::ZERO {
            return Err(StampDutyError::InvalidInput {
                field: "pan_tan_fee".to_string(),
                reason: "PAN/TAN fee cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_jurisdiction, "Maharashtra");
        assert_eq!(config.default_capital, dec!(100_000));
        assert_eq!(config.pan_tan_fee, dec!(143));
        assert!(!config.default_has_authorized_capital);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "default_jurisdiction": "Goa" }"#).unwrap();
        assert_eq!(config.default_jurisdiction, "Goa");
        assert_eq!(config.pan_tan_fee, dec!(143));
    }

    #[test]
    fn test_reserved_default_jurisdiction_rejected() {
        let config = EngineConfig {
            default_jurisdiction: "DEFAULT".to_string(),
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(StampDutyError::InvalidInput { field, .. }) => {
                assert_eq!(field, "default_jurisdiction");
            }
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_fee_rejected() {
        let config = EngineConfig {
            pan_tan_fee: dec!(-1),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
