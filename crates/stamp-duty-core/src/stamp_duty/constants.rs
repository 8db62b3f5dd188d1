use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Money;

/// Reserved key of the fallback rule. Never resolvable as a jurisdiction name.
pub const DEFAULT_RULE_KEY: &str = "default";

pub const DEFAULT_JURISDICTION: &str = "Maharashtra";
pub const DEFAULT_CAPITAL: Money = dec!(100_000);

/// PAN/TAN application fee charged with every incorporation.
pub const PAN_TAN_FEE_INR: Money = dec!(143);

/// Memorandum duty used when a rule record does not state one.
pub const DEFAULT_MOA_STAMP_INR: Money = dec!(200);

/// Capital at and above which a per-unit schedule's high-capital override
/// applies: 250 crore.
pub const HIGH_CAPITAL_THRESHOLD: Money = dec!(2_500_000_000);

/// Per-unit schedules price capital in lakh (1e5) increments.
pub const LAKH: Decimal = dec!(100_000);

pub const DEFAULT_ENTITY_CATEGORY: &str = "Company";
pub const DEFAULT_NATURE_OF_SERVICE: &str = "Name reservation and Company Incorporation";
pub const DEFAULT_SUB_SERVICE: &str = "Incorporation of a company (SPICe+ Part B)";

pub const DISCLAIMER: &str = "Based on LMA Rates of Stamp Duty. Indicative only; refer to \
                              MCA portal and state notifications for official fees.";

// Allowed values for client-side form dropdowns.
pub const ENQUIRE_FEE_FOR: &[&str] = &["Company", "LLP", "IEPF"];
pub const NATURE_OF_SERVICE: &[&str] = &[DEFAULT_NATURE_OF_SERVICE];
pub const SUB_SERVICE: &[&str] = &[DEFAULT_SUB_SERVICE];
pub const YES_NO: &[&str] = &["Yes", "No"];
