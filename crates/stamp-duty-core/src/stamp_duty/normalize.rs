use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::config::EngineConfig;
use super::constants::{DEFAULT_ENTITY_CATEGORY, DEFAULT_NATURE_OF_SERVICE, DEFAULT_SUB_SERVICE};
use super::rules::RuleTable;
use crate::error::StampDutyError;
use crate::types::*;
use crate::StampDutyResult;

// Accepted spellings per field, in priority order. The camelCase names are the
// public contract; the rest are snake_case forms and the legacy form names.
const ENTITY_CATEGORY_KEYS: &[&str] = &[
    "entityCategory",
    "entity_category",
    "enquireFeeFor",
    "enquire_fee_for",
];
const NATURE_OF_SERVICE_KEYS: &[&str] = &["natureOfService", "nature_of_service"];
const SUB_SERVICE_KEYS: &[&str] = &["subService", "sub_service"];
const NO_SHARE_CAPITAL_KEYS: &[&str] = &[
    "hasNoShareCapitalFlag",
    "has_no_share_capital_flag",
    "opcSmallCompany",
    "opc_small_company",
];
const AUTHORIZED_CAPITAL_FLAG_KEYS: &[&str] = &[
    "hasAuthorizedCapitalFlag",
    "has_authorized_capital_flag",
    "authCapital",
    "auth_capital",
];
const AUTHORIZED_CAPITAL_KEYS: &[&str] = &[
    "authorizedCapitalAmount",
    "authorized_capital_amount",
    "authorisedCapitalINR",
    "authorisedCapital",
    "authorised_capital",
];
const NOT_FOR_PROFIT_KEYS: &[&str] = &[
    "isNotForProfitFlag",
    "is_not_for_profit_flag",
    "whetherSec8Company",
    "whether_sec8_company",
];
const JURISDICTION_KEYS: &[&str] = &["jurisdiction", "state"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loosely-typed request parameters. Any field may be missing or of any JSON
/// type; [`normalize`] decides what each one means.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct FeeParams {
    pub entity_category: Option<Value>,
    pub nature_of_service: Option<Value>,
    pub sub_service: Option<Value>,
    pub has_no_share_capital: Option<Value>,
    pub has_authorized_capital: Option<Value>,
    pub authorized_capital: Option<Value>,
    pub is_not_for_profit: Option<Value>,
    pub jurisdiction: Option<Value>,
}

impl From<Value> for FeeParams {
    fn from(value: Value) -> Self {
        FeeParams::from_value(&value)
    }
}

impl FeeParams {
    /// Pick fields out of a JSON object. Anything other than an object yields
    /// an empty parameter set.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return FeeParams::default();
        };
        let pick = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| map.get(*k))
                .find(|v| !v.is_null())
                .cloned()
        };
        FeeParams {
            entity_category: pick(ENTITY_CATEGORY_KEYS),
            nature_of_service: pick(NATURE_OF_SERVICE_KEYS),
            sub_service: pick(SUB_SERVICE_KEYS),
            has_no_share_capital: pick(NO_SHARE_CAPITAL_KEYS),
            has_authorized_capital: pick(AUTHORIZED_CAPITAL_FLAG_KEYS),
            authorized_capital: pick(AUTHORIZED_CAPITAL_KEYS),
            is_not_for_profit: pick(NOT_FOR_PROFIT_KEYS),
            jurisdiction: pick(JURISDICTION_KEYS),
        }
    }
}

/// Canonical, immutable parameters of one fee computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInput {
    pub entity_category: String,
    pub nature_of_service: String,
    pub sub_service: String,
    pub has_no_share_capital: bool,
    pub has_authorized_capital: bool,
    pub authorized_capital: Money,
    pub is_not_for_profit: bool,
    /// Canonical key when recognised, otherwise the trimmed input as given.
    pub jurisdiction: String,
}

// ---------------------------------------------------------------------------
// Lenient normalization
// ---------------------------------------------------------------------------

/// Coerce raw parameters into a [`FeeInput`]. Never fails: every field has a
/// fallback, and unrecognised yes/no values silently mean "no".
pub fn normalize(params: &FeeParams, rules: &RuleTable, config: &EngineConfig) -> FeeInput {
    FeeInput {
        entity_category: text_or(&params.entity_category, DEFAULT_ENTITY_CATEGORY),
        nature_of_service: text_or(&params.nature_of_service, DEFAULT_NATURE_OF_SERVICE),
        sub_service: text_or(&params.sub_service, DEFAULT_SUB_SERVICE),
        has_no_share_capital: coerce_yes_no(params.has_no_share_capital.as_ref()),
        has_authorized_capital: match &params.has_authorized_capital {
            Some(v) => coerce_yes_no(Some(v)),
            None => config.default_has_authorized_capital,
        },
        authorized_capital: coerce_capital(params.authorized_capital.as_ref(), config),
        is_not_for_profit: coerce_yes_no(params.is_not_for_profit.as_ref()),
        jurisdiction: normalize_jurisdiction(params.jurisdiction.as_ref(), rules, config),
    }
}

/// `"yes"`, `"y"` (any case) and JSON `true` are yes; everything else is no.
pub fn coerce_yes_no(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            s == "yes" || s == "y"
        }
        _ => false,
    }
}

/// Canonical key on a case-insensitive match, the trimmed input otherwise.
/// The configured default stands in when nothing usable was given and is
/// matched the same way.
pub fn normalize_jurisdiction(
    value: Option<&Value>,
    rules: &RuleTable,
    config: &EngineConfig,
) -> String {
    let raw = match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
        _ => config.default_jurisdiction.trim(),
    };
    rules
        .canonical_key(raw)
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}

/// Parsed capital, clamped at zero. Missing, non-numeric and zero amounts
/// fall back to the configured default.
pub fn coerce_capital(value: Option<&Value>, config: &EngineConfig) -> Money {
    match value.and_then(parse_number) {
        Some(n) if !n.is_zero() => n.max(Decimal::ZERO),
        _ => config.default_capital,
    }
}

fn parse_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn text_or(value: &Option<Value>, fallback: &str) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Strict normalization
// ---------------------------------------------------------------------------

/// Like [`normalize`], but rejects values the lenient path would silently
/// reinterpret: unknown yes/no words, non-numeric or negative capital, and
/// jurisdictions missing from the rule table.
pub fn normalize_strict(
    params: &FeeParams,
    rules: &RuleTable,
    config: &EngineConfig,
) -> StampDutyResult<FeeInput> {
    strict_yes_no("has_no_share_capital", params.has_no_share_capital.as_ref())?;
    strict_yes_no("has_authorized_capital", params.has_authorized_capital.as_ref())?;
    strict_yes_no("is_not_for_profit", params.is_not_for_profit.as_ref())?;

    if let Some(v) = &params.authorized_capital {
        match parse_number(v) {
            None => {
                return Err(StampDutyError::InvalidInput {
                    field: "authorized_capital".to_string(),
                    reason: format!("Not a number: {v}"),
                })
            }
            Some(n) if n < Decimal::ZERO => {
                return Err(StampDutyError::InvalidInput {
                    field: "authorized_capital".to_string(),
                    reason: "Authorized capital cannot be negative".to_string(),
                })
            }
            Some(_) => {}
        }
    }

    match &params.jurisdiction {
        None => {}
        Some(Value::String(s)) if s.trim().is_empty() => {}
        Some(Value::String(s)) => {
            if rules.canonical_key(s).is_none() {
                return Err(StampDutyError::InvalidInput {
                    field: "jurisdiction".to_string(),
                    reason: format!("Unknown jurisdiction '{}'", s.trim()),
                });
            }
        }
        Some(other) => {
            return Err(StampDutyError::InvalidInput {
                field: "jurisdiction".to_string(),
                reason: format!("Expected a string, got {other}"),
            })
        }
    }

    Ok(normalize(params, rules, config))
}

fn strict_yes_no(field: &str, value: Option<&Value>) -> StampDutyResult<()> {
    let ok = match value {
        None | Some(Value::Bool(_)) => true,
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "yes" | "y" | "no" | "n" | ""
        ),
        Some(_) => false,
    };
    if ok {
        Ok(())
    } else {
        Err(StampDutyError::InvalidInput {
            field: field.to_string(),
            reason: format!("Expected Yes or No, got {}", value.unwrap_or(&Value::Null)),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
