use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::constants::{HIGH_CAPITAL_THRESHOLD, LAKH};
use super::rules::{DutyOverrides, FormulaVariant, SlabTail, StateRule};
use crate::types::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which tier of a rule supplied a duty amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutySource {
    Base,
    NoShareCapital,
    NotForProfit,
    NotForProfitNoCapital,
}

impl DutySource {
    pub fn label(&self) -> &'static str {
        match self {
            DutySource::Base => "base schedule",
            DutySource::NoShareCapital => "no-share-capital override",
            DutySource::NotForProfit => "not-for-profit override",
            DutySource::NotForProfitNoCapital => "not-for-profit without capital override",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyContext {
    pub is_not_for_profit: bool,
    pub has_authorized_capital: bool,
    pub authorized_capital: Money,
}

impl DutyContext {
    /// Capital the formulas see: zero unless the entity has authorized capital.
    pub fn effective_capital(&self) -> Money {
        if self.has_authorized_capital {
            self.authorized_capital
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDuty {
    pub amount: Money,
    pub source: DutySource,
    /// How the amount was arrived at, for display.
    pub basis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDuties {
    pub incorporation: ResolvedDuty,
    pub memorandum: ResolvedDuty,
    pub articles: ResolvedDuty,
    pub effective_capital: Money,
}

impl ResolvedDuties {
    pub fn total(&self) -> Money {
        self.memorandum
            .amount
            .saturating_add(self.articles.amount)
            .saturating_add(self.incorporation.amount)
    }

    pub fn overridden(&self) -> Vec<(&'static str, DutySource)> {
        [
            ("incorporation", self.incorporation.source),
            ("memorandum", self.memorandum.source),
            ("articles", self.articles.source),
        ]
        .into_iter()
        .filter(|(_, s)| *s != DutySource::Base)
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the incorporation, memorandum and articles duties for one rule.
///
/// Each field is resolved independently. Highest precedence first:
/// 1. not-for-profit without capital override
/// 2. not-for-profit override
/// 3. no-share-capital override
/// 4. the base amount or articles formula, with capital forced to zero when
///    the entity has no authorized capital
pub fn resolve_duties(rule: &StateRule, ctx: &DutyContext) -> ResolvedDuties {
    let capital = ctx.effective_capital();

    let incorporation = select_override(rule, ctx, |o| o.incorporation).unwrap_or_else(|| {
        ResolvedDuty {
            amount: rule.incorporation_duty,
            source: DutySource::Base,
            basis: format!("flat {}", rule.incorporation_duty),
        }
    });

    let memorandum = select_override(rule, ctx, |o| o.memorandum).unwrap_or_else(|| {
        ResolvedDuty {
            amount: rule.memorandum_duty,
            source: DutySource::Base,
            basis: format!("flat {}", rule.memorandum_duty),
        }
    });

    let articles = select_override(rule, ctx, |o| o.articles).unwrap_or_else(|| ResolvedDuty {
        amount: evaluate_articles(&rule.articles, capital),
        source: DutySource::Base,
        basis: rule.articles.describe(),
    });

    tracing::debug!(
        jurisdiction = %rule.jurisdiction,
        capital = %capital,
        incorporation = %incorporation.amount,
        memorandum = %memorandum.amount,
        articles = %articles.amount,
        "resolved stamp duties"
    );

    ResolvedDuties {
        incorporation,
        memorandum,
        articles,
        effective_capital: capital,
    }
}

fn select_override(
    rule: &StateRule,
    ctx: &DutyContext,
    field: impl Fn(&DutyOverrides) -> Option<Money>,
) -> Option<ResolvedDuty> {
    let tiers = [
        (
            ctx.is_not_for_profit && !ctx.has_authorized_capital,
            &rule.not_for_profit_no_capital,
            DutySource::NotForProfitNoCapital,
        ),
        (
            ctx.is_not_for_profit,
            &rule.not_for_profit,
            DutySource::NotForProfit,
        ),
        (
            !ctx.has_authorized_capital,
            &rule.no_share_capital,
            DutySource::NoShareCapital,
        ),
    ];

    tiers
        .into_iter()
        .filter(|(applies, _, _)| *applies)
        .find_map(|(_, overrides, source)| {
            field(overrides).map(|amount| ResolvedDuty {
                amount,
                source,
                basis: source.label().to_string(),
            })
        })
}

/// Evaluate an articles-of-association schedule against (effective) capital.
///
/// Total over any validated rule: amounts that would exceed the Decimal range
/// saturate at `Decimal::MAX` before caps and floors apply.
pub fn evaluate_articles(formula: &FormulaVariant, capital: Money) -> Money {
    match formula {
        FormulaVariant::Flat { amount } => *amount,

        // Floor first, then cap.
        FormulaVariant::Percent { percent, min, max } => {
            let mut amount = percent_of(capital, *percent);
            if let Some(min) = min {
                amount = amount.max(*min);
            }
            if let Some(max) = max {
                amount = amount.min(*max);
            }
            amount
        }

        FormulaVariant::ThresholdFlat {
            capital_threshold,
            amount_below,
            amount_above,
        } => {
            if capital <= *capital_threshold {
                *amount_below
            } else {
                *amount_above
            }
        }

        FormulaVariant::Slabs { bands, tail } => bands
            .iter()
            .find(|band| capital <= band.max_capital)
            .map(|band| band.amount)
            .unwrap_or_else(|| match tail {
                SlabTail::Percent(p) => percent_of(capital, *p),
                SlabTail::Flat(a) => *a,
            }),

        // Cap first, then floor.
        FormulaVariant::PerUnit {
            unit_amount,
            unit_denominator,
            min,
            max,
            high_capital_override,
        } => {
            if let Some(high) = high_capital_override {
                if capital >= HIGH_CAPITAL_THRESHOLD {
                    return *high;
                }
            }
            let unit_size = unit_denominator.saturating_mul(LAKH);
            let units = capital.checked_div(unit_size).unwrap_or(Decimal::MAX).ceil();
            let mut amount = units.saturating_mul(*unit_amount);
            if let Some(max) = max {
                amount = amount.min(*max);
            }
            if let Some(min) = min {
                amount = amount.max(*min);
            }
            amount
        }
    }
}

/// `round(capital * percent / 100)`, saturating on overflow.
fn percent_of(capital: Money, percent: Percent) -> Money {
    round_rupees(capital.saturating_mul(percent) / Decimal::ONE_HUNDRED)
}

/// Round to whole rupees, halves away from zero.
fn round_rupees(value: Decimal) -> Money {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
