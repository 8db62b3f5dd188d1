//! Property-based tests for the stamp duty engine.
//!
//! These tests verify that:
//! - The same request always yields the same fee table
//! - Totals are always the sum of their lines
//! - Without authorized capital the supplied amount never affects the duties

use proptest::prelude::*;
use serde_json::json;

use stamp_duty_core::stamp_duty::{list_jurisdictions, FeeEngine, FeeParams, FeeResult};

/// Any built-in jurisdiction, an unknown one, or nothing at all.
fn arb_jurisdiction() -> impl Strategy<Value = Option<String>> {
    let mut names: Vec<String> = list_jurisdictions().unwrap();
    names.push("Atlantis".to_string());
    prop_oneof![
        4 => prop::sample::select(names).prop_map(Some),
        1 => Just(None),
    ]
}

fn arb_flag() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["Yes", "No", "y", "YES", "maybe", ""])
}

fn request(
    jurisdiction: &Option<String>,
    has_capital: &str,
    not_for_profit: &str,
    capital: u64,
) -> FeeParams {
    FeeParams::from_value(&json!({
        "jurisdiction": jurisdiction,
        "hasAuthorizedCapitalFlag": has_capital,
        "isNotForProfitFlag": not_for_profit,
        "authorizedCapitalAmount": capital
    }))
}

fn stamp_lines(r: &FeeResult) -> Vec<String> {
    r.stamp_duty_lines
        .iter()
        .map(|l| format!("{}={}", l.label, l.amount_inr))
        .collect()
}

proptest! {
    /// Calculating twice produces identical results.
    #[test]
    fn calculation_is_deterministic(
        jurisdiction in arb_jurisdiction(),
        has_capital in arb_flag(),
        not_for_profit in arb_flag(),
        capital in 0u64..10_000_000_000,
    ) {
        let engine = FeeEngine::builtin().unwrap();
        let params = request(&jurisdiction, has_capital, not_for_profit, capital);
        let first = engine.calculate(&params).unwrap();
        let second = engine.calculate(&params).unwrap();
        prop_assert_eq!(first.result, second.result);
        prop_assert_eq!(first.warnings, second.warnings);
    }

    /// Grand total is registration plus stamp duty, and stamp duty is the sum
    /// of its three lines.
    #[test]
    fn totals_add_up(
        jurisdiction in arb_jurisdiction(),
        has_capital in arb_flag(),
        not_for_profit in arb_flag(),
        capital in 0u64..10_000_000_000,
    ) {
        let engine = FeeEngine::builtin().unwrap();
        let r = engine
            .calculate(&request(&jurisdiction, has_capital, not_for_profit, capital))
            .unwrap()
            .result;

        let three: rust_decimal::Decimal =
            r.stamp_duty_lines.iter().take(3).map(|l| l.amount_inr).sum();
        prop_assert_eq!(r.totals.total_stamp_duty, three);
        prop_assert_eq!(
            r.totals.grand_total,
            r.totals.total_registration_fees + r.totals.total_stamp_duty
        );
        prop_assert_eq!(r.combined_fee_table.len(), 10);
        prop_assert!(r.totals.grand_total >= r.totals.total_registration_fees);
    }

    /// With the authorized-capital flag off, capital is treated as zero no
    /// matter what amount was supplied.
    #[test]
    fn capital_ignored_without_authorized_capital(
        jurisdiction in arb_jurisdiction(),
        not_for_profit in arb_flag(),
        a in 0u64..10_000_000_000,
        b in 0u64..10_000_000_000,
    ) {
        let engine = FeeEngine::builtin().unwrap();
        let ra = engine.calculate(&request(&jurisdiction, "No", not_for_profit, a)).unwrap().result;
        let rb = engine.calculate(&request(&jurisdiction, "No", not_for_profit, b)).unwrap().result;
        prop_assert_eq!(stamp_lines(&ra), stamp_lines(&rb));
    }
}
