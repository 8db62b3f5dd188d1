//! Incorporation stamp duty and registration fees.
//!
//! Requests flow one way: [`normalize`] turns loose parameters into a
//! [`normalize::FeeInput`], [`formula`] resolves the three duties against the
//! jurisdiction's [`rules::StateRule`], and [`fees`] assembles the fee table.
//! [`engine::FeeEngine`] wires the steps together.

pub mod config;
pub mod constants;
pub mod engine;
pub mod fees;
pub mod formula;
pub mod normalize;
pub mod rules;

pub use config::EngineConfig;
pub use engine::{calculate_stamp_duty, list_jurisdictions, FeeEngine};
pub use fees::{FeeLine, FeeLineItem, FeeResult, FeeTotals, RegistrationFees};
pub use formula::{DutySource, ResolvedDuties, ResolvedDuty};
pub use normalize::{FeeInput, FeeParams};
pub use rules::{DutyOverrides, FormulaVariant, RuleTable, Slab, SlabTail, StateRule};
