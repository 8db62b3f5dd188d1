use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::constants::{DEFAULT_MOA_STAMP_INR, DEFAULT_RULE_KEY};
use crate::error::StampDutyError;
use crate::types::*;
use crate::StampDutyResult;

const BUILTIN_RULES_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/state_rules.json"));

static BUILTIN: OnceLock<Result<Arc<RuleTable>, StampDutyError>> = OnceLock::new();

// ---------------------------------------------------------------------------
// Validated types
// ---------------------------------------------------------------------------

/// Articles-of-association duty schedule. Exactly one shape per jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaVariant {
    Flat {
        amount: Money,
    },
    /// `round(capital * percent / 100)`, raised to `min` then capped at `max`.
    Percent {
        percent: Percent,
        min: Option<Money>,
        max: Option<Money>,
    },
    /// `amount_below` when capital is at or under the threshold.
    ThresholdFlat {
        capital_threshold: Money,
        amount_below: Money,
        amount_above: Money,
    },
    Slabs {
        bands: Vec<Slab>,
        tail: SlabTail,
    },
    /// Priced per started unit of `unit_denominator` lakh of capital, capped
    /// at `max` then raised to `min`.
    PerUnit {
        unit_amount: Money,
        unit_denominator: Decimal,
        min: Option<Money>,
        max: Option<Money>,
        high_capital_override: Option<Money>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Slab {
    pub max_capital: Money,
    pub amount: Money,
}

/// What a slab schedule charges once capital exceeds every band.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlabTail {
    Percent(Percent),
    Flat(Money),
}

/// Partial replacement of the three duty amounts for a class of entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DutyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incorporation: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memorandum: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articles: Option<Money>,
}

impl DutyOverrides {
    pub fn is_empty(&self) -> bool {
        self.incorporation.is_none() && self.memorandum.is_none() && self.articles.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateRule {
    pub jurisdiction: String,
    pub incorporation_duty: Money,
    pub memorandum_duty: Money,
    pub articles: FormulaVariant,
    pub no_share_capital: DutyOverrides,
    pub not_for_profit: DutyOverrides,
    pub not_for_profit_no_capital: DutyOverrides,
}

impl FormulaVariant {
    /// Short human-readable statement of the schedule.
    pub fn describe(&self) -> String {
        match self {
            FormulaVariant::Flat { amount } => format!("flat {amount}"),
            FormulaVariant::Percent { percent, min, max } => {
                let mut s = format!("{percent}% of capital");
                if let Some(min) = min {
                    s.push_str(&format!(", min {min}"));
                }
                if let Some(max) = max {
                    s.push_str(&format!(", max {max}"));
                }
                s
            }
            FormulaVariant::ThresholdFlat {
                capital_threshold,
                amount_below,
                amount_above,
            } => format!(
                "{amount_below} up to capital {capital_threshold}, {amount_above} above"
            ),
            FormulaVariant::Slabs { bands, tail } => {
                let mut parts: Vec<String> = bands
                    .iter()
                    .map(|b| format!("{} up to {}", b.amount, b.max_capital))
                    .collect();
                parts.push(match tail {
                    SlabTail::Percent(p) => format!("{p}% of capital above"),
                    SlabTail::Flat(a) => format!("{a} above"),
                });
                parts.join("; ")
            }
            FormulaVariant::PerUnit {
                unit_amount,
                unit_denominator,
                min,
                max,
                high_capital_override,
            } => {
                let mut s = format!("{unit_amount} per {unit_denominator} lakh of capital");
                if let Some(max) = max {
                    s.push_str(&format!(", max {max}"));
                }
                if let Some(min) = min {
                    s.push_str(&format!(", min {min}"));
                }
                if let Some(high) = high_capital_override {
                    s.push_str(&format!(", {high} from 250 crore"));
                }
                s
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// On-disk shape of the rule table. Records are loosely typed: every articles
/// shape is an optional field, and validation decides which one applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTableDocument {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub rules: Vec<RuleRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleRecord {
    pub jurisdiction: String,
    pub incorporation_duty: Money,
    #[serde(default)]
    pub memorandum_duty: Option<Money>,
    pub articles: ArticlesRecord,
    #[serde(default)]
    pub no_share_capital: DutyOverrides,
    #[serde(default)]
    pub not_for_profit: DutyOverrides,
    #[serde(default)]
    pub not_for_profit_no_capital: DutyOverrides,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticlesRecord {
    #[serde(default)]
    pub flat: Option<Money>,
    #[serde(default)]
    pub percent: Option<PercentRecord>,
    #[serde(default)]
    pub threshold: Option<ThresholdRecord>,
    #[serde(default)]
    pub slabs: Option<SlabsRecord>,
    #[serde(default)]
    pub per_unit: Option<PerUnitRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PercentRecord {
    pub percent: Percent,
    #[serde(default)]
    pub min: Option<Money>,
    #[serde(default)]
    pub max: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdRecord {
    pub capital_threshold: Money,
    pub amount_below: Money,
    pub amount_above: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlabsRecord {
    pub bands: Vec<Slab>,
    #[serde(default)]
    pub tail_percent: Option<Percent>,
    #[serde(default)]
    pub tail_amount: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerUnitRecord {
    pub unit_amount: Money,
    pub unit_denominator: Decimal,
    #[serde(default)]
    pub min: Option<Money>,
    #[serde(default)]
    pub max: Option<Money>,
    #[serde(default)]
    pub high_capital_override: Option<Money>,
}

impl RuleRecord {
    /// Validate the record and collapse it into a [`StateRule`].
    pub fn into_rule(self) -> StampDutyResult<StateRule> {
        let jurisdiction = self.jurisdiction.trim().to_string();
        if jurisdiction.is_empty() {
            return Err(violation("<unnamed>", "jurisdiction key is empty"));
        }

        non_negative(&jurisdiction, "incorporation_duty", Some(self.incorporation_duty))?;
        non_negative(&jurisdiction, "memorandum_duty", self.memorandum_duty)?;
        for (tier, o) in [
            ("no_share_capital", &self.no_share_capital),
            ("not_for_profit", &self.not_for_profit),
            ("not_for_profit_no_capital", &self.not_for_profit_no_capital),
        ] {
            non_negative(&jurisdiction, tier, o.incorporation)?;
            non_negative(&jurisdiction, tier, o.memorandum)?;
            non_negative(&jurisdiction, tier, o.articles)?;
        }

        let articles = self.articles.into_formula(&jurisdiction)?;

        Ok(StateRule {
            jurisdiction,
            incorporation_duty: self.incorporation_duty,
            memorandum_duty: self.memorandum_duty.unwrap_or(DEFAULT_MOA_STAMP_INR),
            articles,
            no_share_capital: self.no_share_capital,
            not_for_profit: self.not_for_profit,
            not_for_profit_no_capital: self.not_for_profit_no_capital,
        })
    }
}

impl ArticlesRecord {
    fn populated(&self) -> Vec<&'static str> {
        let mut shapes = Vec::new();
        if self.flat.is_some() {
            shapes.push("flat");
        }
        if self.percent.is_some() {
            shapes.push("percent");
        }
        if self.threshold.is_some() {
            shapes.push("threshold");
        }
        if self.slabs.is_some() {
            shapes.push("slabs");
        }
        if self.per_unit.is_some() {
            shapes.push("per_unit");
        }
        shapes
    }

    fn into_formula(self, jurisdiction: &str) -> StampDutyResult<FormulaVariant> {
        let shapes = self.populated();
        match shapes.len() {
            0 => return Err(violation(jurisdiction, "no articles formula defined")),
            1 => {}
            _ => {
                return Err(violation(
                    jurisdiction,
                    &format!("multiple articles formulas defined: {}", shapes.join(", ")),
                ))
            }
        }

        if let Some(amount) = self.flat {
            non_negative(jurisdiction, "articles.flat", Some(amount))?;
            return Ok(FormulaVariant::Flat { amount });
        }

        if let Some(p) = self.percent {
            non_negative(jurisdiction, "articles.percent", Some(p.percent))?;
            non_negative(jurisdiction, "articles.percent.min", p.min)?;
            non_negative(jurisdiction, "articles.percent.max", p.max)?;
            return Ok(FormulaVariant::Percent {
                percent: p.percent,
                min: p.min,
                max: p.max,
            });
        }

        if let Some(t) = self.threshold {
            non_negative(jurisdiction, "articles.threshold", Some(t.capital_threshold))?;
            non_negative(jurisdiction, "articles.threshold", Some(t.amount_below))?;
            non_negative(jurisdiction, "articles.threshold", Some(t.amount_above))?;
            return Ok(FormulaVariant::ThresholdFlat {
                capital_threshold: t.capital_threshold,
                amount_below: t.amount_below,
                amount_above: t.amount_above,
            });
        }

        if let Some(s) = self.slabs {
            if s.bands.is_empty() {
                return Err(violation(jurisdiction, "slab schedule has no bands"));
            }
            for pair in s.bands.windows(2) {
                if pair[1].max_capital <= pair[0].max_capital {
                    return Err(violation(
                        jurisdiction,
                        "slab caps must be strictly ascending",
                    ));
                }
            }
            for band in &s.bands {
                non_negative(jurisdiction, "articles.slabs", Some(band.max_capital))?;
                non_negative(jurisdiction, "articles.slabs", Some(band.amount))?;
            }
            let tail = match (s.tail_percent, s.tail_amount) {
                (Some(p), None) => {
                    non_negative(jurisdiction, "articles.slabs.tail_percent", Some(p))?;
                    SlabTail::Percent(p)
                }
                (None, Some(a)) => {
                    non_negative(jurisdiction, "articles.slabs.tail_amount", Some(a))?;
                    SlabTail::Flat(a)
                }
                (None, None) => {
                    return Err(violation(jurisdiction, "slab schedule has no tail"))
                }
                (Some(_), Some(_)) => {
                    return Err(violation(
                        jurisdiction,
                        "slab schedule defines both tail_percent and tail_amount",
                    ))
                }
            };
            return Ok(FormulaVariant::Slabs {
                bands: s.bands,
                tail,
            });
        }

        match self.per_unit {
            Some(u) => {
                if u.unit_denominator <= Decimal::ZERO {
                    return Err(violation(
                        jurisdiction,
                        "per-unit denominator must be positive",
                    ));
                }
                non_negative(jurisdiction, "articles.per_unit.unit_amount", Some(u.unit_amount))?;
                non_negative(jurisdiction, "articles.per_unit.min", u.min)?;
                non_negative(jurisdiction, "articles.per_unit.max", u.max)?;
                non_negative(
                    jurisdiction,
                    "articles.per_unit.high_capital_override",
                    u.high_capital_override,
                )?;
                Ok(FormulaVariant::PerUnit {
                    unit_amount: u.unit_amount,
                    unit_denominator: u.unit_denominator,
                    min: u.min,
                    max: u.max,
                    high_capital_override: u.high_capital_override,
                })
            }
            None => Err(violation(jurisdiction, "no articles formula defined")),
        }
    }
}

fn violation(jurisdiction: &str, reason: &str) -> StampDutyError {
    StampDutyError::InvariantViolation {
        jurisdiction: jurisdiction.to_string(),
        reason: reason.to_string(),
    }
}

fn non_negative(jurisdiction: &str, field: &str, value: Option<Decimal>) -> StampDutyResult<()> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(violation(
            jurisdiction,
            &format!("{field} must not be negative (got {v})"),
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Validated, read-only jurisdiction rules in their persisted order.
#[derive(Debug, Clone)]
pub struct RuleTable {
    version: Option<String>,
    rules: Vec<StateRule>,
    /// Lowercased key -> position in `rules`.
    index: HashMap<String, usize>,
    default_idx: usize,
}

impl RuleTable {
    /// The rule table compiled into the crate, parsed and validated once.
    pub fn builtin() -> StampDutyResult<Arc<RuleTable>> {
        BUILTIN
            .get_or_init(|| {
                let table = RuleTable::from_json(BUILTIN_RULES_JSON)?;
                tracing::debug!(
                    rules = table.rules.len(),
                    version = table.version.as_deref().unwrap_or("unversioned"),
                    "loaded built-in stamp duty rules"
                );
                Ok(Arc::new(table))
            })
            .clone()
    }

    pub fn from_json(json: &str) -> StampDutyResult<RuleTable> {
        let doc: RuleTableDocument = serde_json::from_str(json)
            .map_err(|e| StampDutyError::RuleTableLoad(e.to_string()))?;
        RuleTable::from_document(doc)
    }

    pub fn from_document(doc: RuleTableDocument) -> StampDutyResult<RuleTable> {
        let mut rules = Vec::with_capacity(doc.rules.len());
        let mut index = HashMap::with_capacity(doc.rules.len());

        for record in doc.rules {
            let rule = record.into_rule()?;
            let key = rule.jurisdiction.to_lowercase();
            if index.contains_key(&key) {
                return Err(violation(&rule.jurisdiction, "duplicate jurisdiction key"));
            }
            index.insert(key, rules.len());
            rules.push(rule);
        }

        let default_idx = index.get(DEFAULT_RULE_KEY).copied().ok_or_else(|| {
            violation(DEFAULT_RULE_KEY, "rule table has no default entry")
        })?;
        if rules[default_idx].jurisdiction != DEFAULT_RULE_KEY {
            return Err(violation(
                &rules[default_idx].jurisdiction,
                "the fallback entry must be spelled exactly 'default'",
            ));
        }

        Ok(RuleTable {
            version: doc.version,
            rules,
            index,
            default_idx,
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Number of rules, including the fallback entry.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn default_rule(&self) -> &StateRule {
        &self.rules[self.default_idx]
    }

    /// Exact-key lookup. Includes the fallback entry.
    pub fn get(&self, key: &str) -> Option<&StateRule> {
        self.rules.iter().find(|r| r.jurisdiction == key)
    }

    /// Rule to compute with for a normalized jurisdiction, and whether the
    /// fallback entry had to stand in for it.
    pub fn resolve(&self, jurisdiction: &str) -> (&StateRule, bool) {
        match self.get(jurisdiction) {
            Some(rule) => (rule, rule.jurisdiction == DEFAULT_RULE_KEY),
            None => (self.default_rule(), true),
        }
    }

    /// Canonical spelling of a jurisdiction, matched case-insensitively.
    /// The fallback entry is never returned.
    pub fn canonical_key(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_lowercase();
        if key == DEFAULT_RULE_KEY {
            return None;
        }
        self.index
            .get(&key)
            .map(|&i| self.rules[i].jurisdiction.as_str())
    }

    /// Every jurisdiction except the fallback entry, in table order.
    pub fn jurisdictions(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.jurisdiction != DEFAULT_RULE_KEY)
            .map(|r| r.jurisdiction.as_str())
            .collect()
    }

    pub fn rules(&self) -> &[StateRule] {
        &self.rules
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
