use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use super::config::EngineConfig;
use super::fees::{aggregate, FeeResult, RegistrationFees};
use super::formula::{resolve_duties, DutyContext, ResolvedDuties};
use super::normalize::{normalize, normalize_strict, FeeInput, FeeParams};
use super::rules::{RuleTable, StateRule};
use crate::types::*;
use crate::StampDutyResult;

const METHODOLOGY: &str =
    "Rule-based stamp duty (LMA state schedules) plus fixed MCA registration fees";

/// A rule table plus the defaults used to interpret requests against it.
/// Immutable; share freely between threads.
#[derive(Debug, Clone)]
pub struct FeeEngine {
    rules: Arc<RuleTable>,
    config: EngineConfig,
}

#[derive(Debug, Serialize)]
struct Assumptions<'a> {
    jurisdiction: &'a str,
    rule_applied: &'a str,
    rule_table_version: Option<&'a str>,
    has_authorized_capital: bool,
    effective_capital: Money,
    is_not_for_profit: bool,
}

impl FeeEngine {
    pub fn new(rules: Arc<RuleTable>, config: EngineConfig) -> StampDutyResult<Self> {
        config.validate()?;
        if rules.canonical_key(&config.default_jurisdiction).is_none() {
            tracing::warn!(
                default_jurisdiction = %config.default_jurisdiction,
                "configured default jurisdiction is not in the rule table; \
                 requests without a jurisdiction will use the fallback rule"
            );
        }
        Ok(FeeEngine { rules, config })
    }

    /// Engine over the compiled-in rule table with default configuration.
    pub fn builtin() -> StampDutyResult<Self> {
        FeeEngine::new(RuleTable::builtin()?, EngineConfig::default())
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize loosely-typed parameters and compute the fee table.
    pub fn calculate(&self, params: &FeeParams) -> StampDutyResult<ComputationOutput<FeeResult>> {
        let start = Instant::now();
        let input = normalize(params, &self.rules, &self.config);
        Ok(self.finish(start, params, input))
    }

    /// As [`FeeEngine::calculate`], but malformed fields are errors instead of
    /// being defaulted.
    pub fn calculate_strict(
        &self,
        params: &FeeParams,
    ) -> StampDutyResult<ComputationOutput<FeeResult>> {
        let start = Instant::now();
        let input = normalize_strict(params, &self.rules, &self.config)?;
        Ok(self.finish(start, params, input))
    }

    /// Compute the fee table for an already normalized input.
    pub fn compute(&self, input: FeeInput) -> FeeResult {
        let (rule, _) = self.rules.resolve(&input.jurisdiction);
        self.price(rule, input).1
    }

    /// The rule a jurisdiction name computes with, matched case-insensitively;
    /// the fallback rule when the name is unknown.
    pub fn rule_for(&self, jurisdiction: &str) -> &StateRule {
        match self.rules.canonical_key(jurisdiction) {
            Some(key) => self.rules.resolve(key).0,
            None => self.rules.default_rule(),
        }
    }

    pub fn jurisdictions(&self) -> Vec<&str> {
        self.rules.jurisdictions()
    }

    fn finish(
        &self,
        start: Instant,
        params: &FeeParams,
        input: FeeInput,
    ) -> ComputationOutput<FeeResult> {
        let mut warnings: Vec<String> = Vec::new();

        let (rule, fell_back) = self.rules.resolve(&input.jurisdiction);
        if fell_back {
            tracing::warn!(
                jurisdiction = %input.jurisdiction,
                "jurisdiction not in rule table, using default rule"
            );
            warnings.push(format!(
                "Jurisdiction '{}' is not in the rule table; the default schedule was applied.",
                input.jurisdiction
            ));
        }

        if !input.has_authorized_capital && params.authorized_capital.is_some() {
            warnings.push(
                "Authorized capital flag is No; the supplied capital amount was ignored and \
                 duties were computed on zero capital."
                    .to_string(),
            );
        }

        let (duties, result) = self.price(rule, input);
        for (field, source) in duties.overridden() {
            warnings.push(format!(
                "{} duty taken from the {} for {}.",
                capitalize(field),
                source.label(),
                rule.jurisdiction
            ));
        }

        let inputs = &result.inputs;
        let assumptions = Assumptions {
            jurisdiction: &inputs.jurisdiction,
            rule_applied: &rule.jurisdiction,
            rule_table_version: self.rules.version(),
            has_authorized_capital: inputs.has_authorized_capital,
            effective_capital: duties.effective_capital,
            is_not_for_profit: inputs.is_not_for_profit,
        };
        let assumptions = serde_json::to_value(&assumptions).unwrap_or_default();

        tracing::debug!(
            grand_total = %result.totals.grand_total,
            warnings = warnings.len(),
            "fee table computed"
        );

        let elapsed = start.elapsed().as_micros() as u64;
        with_metadata(METHODOLOGY, &assumptions, warnings, elapsed, result)
    }

    /// Resolve the three duties for `input` under `rule` and assemble the
    /// fee table. The single pricing path behind `compute` and `calculate`.
    fn price(&self, rule: &StateRule, input: FeeInput) -> (ResolvedDuties, FeeResult) {
        let duties = resolve_duties(rule, &context(&input));
        let result = aggregate(
            input,
            &duties,
            &RegistrationFees::standard(self.config.pan_tan_fee),
            &self.config.disclaimer,
        );
        (duties, result)
    }
}

fn context(input: &FeeInput) -> DutyContext {
    DutyContext {
        is_not_for_profit: input.is_not_for_profit,
        has_authorized_capital: input.has_authorized_capital,
        authorized_capital: input.authorized_capital,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Calculate registration fees and stamp duty with the built-in rule table.
pub fn calculate_stamp_duty(params: &FeeParams) -> StampDutyResult<ComputationOutput<FeeResult>> {
    FeeEngine::builtin()?.calculate(params)
}

/// Jurisdiction names for form population, in rule-table order.
pub fn list_jurisdictions() -> StampDutyResult<Vec<String>> {
    let rules = RuleTable::builtin()?;
    Ok(rules.jurisdictions().into_iter().map(str::to_string).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stamp_duty::formula::DutySource;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn params(value: serde_json::Value) -> FeeParams {
        FeeParams::from_value(&value)
    }

    #[test]
    fn test_delhi_with_capital() {
        let out = calculate_stamp_duty(&params(json!({
            "jurisdiction": "Delhi",
            "hasAuthorizedCapitalFlag": "Yes",
            "authorizedCapitalAmount": 1_000_000,
            "isNotForProfitFlag": "No"
        })))
        .unwrap();
        let r = &out.result;
        assert_eq!(r.stamp_duty_lines[0].amount_inr, dec!(200));
        assert_eq!(r.stamp_duty_lines[1].amount_inr, dec!(1500));
        assert_eq!(r.stamp_duty_lines[2].amount_inr, dec!(10));
        assert_eq!(r.totals.total_stamp_duty, dec!(1710));
        assert_eq!(r.totals.grand_total, dec!(1853));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_unknown_jurisdiction_warns() {
        let out = calculate_stamp_duty(&params(json!({ "jurisdiction": "Atlantis" }))).unwrap();
        assert_eq!(out.result.inputs.jurisdiction, "Atlantis");
        assert_eq!(out.assumptions["rule_applied"], "default");
        assert!(out.warnings.iter().any(|w| w.contains("not in the rule table")));
    }

    #[test]
    fn test_ignored_capital_warns() {
        let out = calculate_stamp_duty(&params(json!({
            "jurisdiction": "Goa",
            "hasAuthorizedCapitalFlag": "No",
            "authorizedCapitalAmount": 5_000_000
        })))
        .unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("ignored")));
        assert_eq!(out.assumptions["effective_capital"], "0");
    }

    #[test]
    fn test_override_warnings() {
        let out = calculate_stamp_duty(&params(json!({
            "jurisdiction": "Delhi",
            "hasAuthorizedCapitalFlag": "Yes",
            "isNotForProfitFlag": "Yes"
        })))
        .unwrap();
        assert_eq!(
            out.warnings
                .iter()
                .filter(|w| w.contains("not-for-profit override"))
                .count(),
            3
        );
        assert_eq!(
            out.result.stamp_duty_lines[1].source,
            Some(DutySource::NotForProfit)
        );
    }

    #[test]
    fn test_compute_matches_calculate() {
        let engine = FeeEngine::builtin().unwrap();
        let p = params(json!({
            "jurisdiction": "Kerala",
            "hasAuthorizedCapitalFlag": "Yes",
            "authorizedCapitalAmount": 3_000_000
        }));
        let via_calculate = engine.calculate(&p).unwrap().result;
        let input = via_calculate.inputs.clone();
        assert_eq!(engine.compute(input), via_calculate);
    }

    #[test]
    fn test_strict_rejects_unknown_jurisdiction() {
        let engine = FeeEngine::builtin().unwrap();
        assert!(engine
            .calculate_strict(&params(json!({ "jurisdiction": "Atlantis" })))
            .is_err());
    }

    #[test]
    fn test_custom_config() {
        let config = EngineConfig {
            default_jurisdiction: "Goa".to_string(),
            pan_tan_fee: dec!(200),
            ..EngineConfig::default()
        };
        let engine = FeeEngine::new(RuleTable::builtin().unwrap(), config).unwrap();
        let out = engine.calculate(&FeeParams::default()).unwrap();
        assert_eq!(out.result.inputs.jurisdiction, "Goa");
        assert_eq!(out.result.totals.total_registration_fees, dec!(200));
    }

    #[test]
    fn test_lowercase_configured_default_uses_its_rule() {
        let config = EngineConfig {
            default_jurisdiction: "goa".to_string(),
            ..EngineConfig::default()
        };
        let engine = FeeEngine::new(RuleTable::builtin().unwrap(), config).unwrap();
        let out = engine
            .calculate(&params(json!({ "hasAuthorizedCapitalFlag": "Yes" })))
            .unwrap();
        assert_eq!(out.result.inputs.jurisdiction, "Goa");
        assert_eq!(out.assumptions["rule_applied"], "Goa");
        assert_eq!(out.result.stamp_duty_lines[2].amount_inr, dec!(50));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_compute_matches_calculate_across_override_tiers() {
        let engine = FeeEngine::builtin().unwrap();
        for request in [
            json!({ "jurisdiction": "Delhi", "isNotForProfitFlag": "Yes" }),
            json!({ "jurisdiction": "Madhya Pradesh", "hasAuthorizedCapitalFlag": "No" }),
            json!({ "jurisdiction": "Uttar Pradesh", "isNotForProfitFlag": "Yes" }),
            json!({ "jurisdiction": "Atlantis", "hasAuthorizedCapitalFlag": "Yes" }),
        ] {
            let via_calculate = engine.calculate(&params(request)).unwrap().result;
            assert_eq!(engine.compute(via_calculate.inputs.clone()), via_calculate);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            default_capital: dec!(-1),
            ..EngineConfig::default()
        };
        assert!(FeeEngine::new(RuleTable::builtin().unwrap(), config).is_err());
    }

    #[test]
    fn test_rule_for() {
        let engine = FeeEngine::builtin().unwrap();
        assert_eq!(engine.rule_for("west bengal").jurisdiction, "West Bengal");
        assert_eq!(engine.rule_for("Atlantis").jurisdiction, "default");
    }

    #[test]
    fn test_list_jurisdictions() {
        let names = list_jurisdictions().unwrap();
        assert_eq!(names.len(), 35);
        assert_eq!(names.first().map(String::as_str), Some("Delhi"));
    }

    #[test]
    fn test_metadata_populated() {
        let out = calculate_stamp_duty(&FeeParams::default()).unwrap();
        assert!(!out.methodology.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert!(!out.metadata.version.is_empty());
    }
}
