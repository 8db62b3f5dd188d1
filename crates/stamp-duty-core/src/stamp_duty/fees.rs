use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::formula::{DutySource, ResolvedDuties, ResolvedDuty};
use super::normalize::FeeInput;
use crate::types::*;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub label: String,
    pub amount_inr: Money,
    /// How a stamp duty amount was derived. Absent on registration fees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DutySource>,
}

/// One row of the combined fee table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLineItem {
    pub ordinal: u32,
    pub label: String,
    pub amount_inr: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTotals {
    pub total_registration_fees: Money,
    pub total_stamp_duty: Money,
    pub grand_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeResult {
    pub success: bool,
    pub inputs: FeeInput,
    pub registration_fee_lines: Vec<FeeLine>,
    pub stamp_duty_lines: Vec<FeeLine>,
    pub combined_fee_table: Vec<FeeLineItem>,
    pub totals: FeeTotals,
    pub currency: Currency,
    pub disclaimer: String,
}

/// Registration fees charged alongside the stamp duties. Jurisdiction
/// independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFees {
    pub normal_fee: Money,
    pub additional_fee: Money,
    pub moa_registration_fee: Money,
    pub aoa_registration_fee: Money,
    pub pan_tan_fee: Money,
}

impl RegistrationFees {
    /// The incorporation schedule: only the PAN/TAN fee is charged.
    pub fn standard(pan_tan_fee: Money) -> Self {
        RegistrationFees {
            normal_fee: Decimal::ZERO,
            additional_fee: Decimal::ZERO,
            moa_registration_fee: Decimal::ZERO,
            aoa_registration_fee: Decimal::ZERO,
            pan_tan_fee,
        }
    }

    pub fn total(&self) -> Money {
        [
            self.additional_fee,
            self.moa_registration_fee,
            self.aoa_registration_fee,
            self.pan_tan_fee,
        ]
        .into_iter()
        .fold(self.normal_fee, Decimal::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Assemble the fee table from resolved duties and registration fees.
pub fn aggregate(
    inputs: FeeInput,
    duties: &ResolvedDuties,
    registration: &RegistrationFees,
    disclaimer: &str,
) -> FeeResult {
    let total_registration_fees = registration.total();
    let total_stamp_duty = duties.total();

    let registration_fee_lines = vec![
        plain_line("Normal Fee", registration.normal_fee),
        plain_line("Additional Fee", registration.additional_fee),
        plain_line("MoA registration fees", registration.moa_registration_fee),
        plain_line("AoA registration fees", registration.aoa_registration_fee),
        plain_line("PANTAN fees", registration.pan_tan_fee),
        plain_line("Total", total_registration_fees),
    ];

    let stamp_duty_lines = vec![
        duty_line("Stamp Duty MOA", &duties.memorandum),
        duty_line("Stamp Duty AOA", &duties.articles),
        duty_line("Stamp Duty SPICE+ Part B", &duties.incorporation),
        plain_line("Stamp Duty", total_stamp_duty),
    ];

    let combined_fee_table = registration_fee_lines
        .iter()
        .chain(stamp_duty_lines.iter())
        .enumerate()
        .map(|(i, line)| FeeLineItem {
            ordinal: i as u32 + 1,
            label: line.label.clone(),
            amount_inr: line.amount_inr,
        })
        .collect();

    FeeResult {
        success: true,
        inputs,
        registration_fee_lines,
        stamp_duty_lines,
        combined_fee_table,
        totals: FeeTotals {
            total_registration_fees,
            total_stamp_duty,
            grand_total: total_registration_fees.saturating_add(total_stamp_duty),
        },
        currency: Currency::INR,
        disclaimer: disclaimer.to_string(),
    }
}

fn plain_line(label: &str, amount: Money) -> FeeLine {
    FeeLine {
        label: label.to_string(),
        amount_inr: amount,
        basis: None,
        source: None,
    }
}

fn duty_line(label: &str, duty: &ResolvedDuty) -> FeeLine {
    FeeLine {
        label: label.to_string(),
        amount_inr: duty.amount,
        basis: Some(duty.basis.clone()),
        source: Some(duty.source),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn duty(amount: Money) -> ResolvedDuty {
        ResolvedDuty {
            amount,
            source: DutySource::Base,
            basis: format!("flat {amount}"),
        }
    }

    fn sample_inputs() -> FeeInput {
        FeeInput {
            entity_category: "Company".to_string(),
            nature_of_service: "Name reservation and Company Incorporation".to_string(),
            sub_service: "Incorporation of a company (SPICe+ Part B)".to_string(),
            has_no_share_capital: false,
            has_authorized_capital: true,
            authorized_capital: dec!(1_000_000),
            is_not_for_profit: false,
            jurisdiction: "Delhi".to_string(),
        }
    }

    fn sample_result() -> FeeResult {
        let duties = ResolvedDuties {
            incorporation: duty(dec!(10)),
            memorandum: duty(dec!(200)),
            articles: duty(dec!(1500)),
            effective_capital: dec!(1_000_000),
        };
        aggregate(
            sample_inputs(),
            &duties,
            &RegistrationFees::standard(dec!(143)),
            "indicative",
        )
    }

    #[test]
    fn test_totals() {
        let r = sample_result();
        assert_eq!(r.totals.total_registration_fees, dec!(143));
        assert_eq!(r.totals.total_stamp_duty, dec!(1710));
        assert_eq!(r.totals.grand_total, dec!(1853));
        assert!(r.success);
        assert_eq!(r.currency, Currency::INR);
    }

    #[test]
    fn test_combined_table_order() {
        let r = sample_result();
        let labels: Vec<(u32, &str)> = r
            .combined_fee_table
            .iter()
            .map(|i| (i.ordinal, i.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (1, "Normal Fee"),
                (2, "Additional Fee"),
                (3, "MoA registration fees"),
                (4, "AoA registration fees"),
                (5, "PANTAN fees"),
                (6, "Total"),
                (7, "Stamp Duty MOA"),
                (8, "Stamp Duty AOA"),
                (9, "Stamp Duty SPICE+ Part B"),
                (10, "Stamp Duty"),
            ]
        );
        assert_eq!(r.combined_fee_table[7].amount_inr, dec!(1500));
        assert_eq!(r.combined_fee_table[9].amount_inr, dec!(1710));
    }

    #[test]
    fn test_stamp_lines_carry_basis() {
        let r = sample_result();
        assert_eq!(r.stamp_duty_lines[1].basis.as_deref(), Some("flat 1500"));
        assert_eq!(r.stamp_duty_lines[1].source, Some(DutySource::Base));
        assert!(r.stamp_duty_lines[3].basis.is_none());
        assert!(r.registration_fee_lines.iter().all(|l| l.source.is_none()));
    }

    #[test]
    fn test_registration_total() {
        let fees = RegistrationFees {
            normal_fee: dec!(500),
            additional_fee: dec!(100),
            moa_registration_fee: dec!(0),
            aoa_registration_fee: dec!(0),
            pan_tan_fee: dec!(143),
        };
        assert_eq!(fees.total(), dec!(743));
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(value["currency"], "INR");
        assert_eq!(value["totals"]["grand_total"], "1853");
        assert_eq!(value["combined_fee_table"][0]["ordinal"], 1);
        assert!(value["registration_fee_lines"][0].get("basis").is_none());
    }
}
