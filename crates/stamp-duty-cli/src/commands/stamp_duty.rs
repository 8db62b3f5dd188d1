use clap::Args;
use serde_json::{Map, Value};
use std::sync::Arc;

use stamp_duty_core::stamp_duty::constants::{
    ENQUIRE_FEE_FOR, NATURE_OF_SERVICE, SUB_SERVICE, YES_NO,
};
use stamp_duty_core::stamp_duty::rules::RuleTableDocument;
use stamp_duty_core::stamp_duty::{EngineConfig, FeeEngine, FeeParams, RuleTable};

use crate::input;

/// Rule table and configuration overrides shared by every command
#[derive(Args)]
pub struct EngineArgs {
    /// Path to a rule table (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long)]
    pub rules: Option<String>,

    /// Path to an engine configuration file (JSON or YAML)
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for a stamp duty and fee calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// State or union territory (case-insensitive)
    #[arg(long, alias = "state")]
    pub jurisdiction: Option<String>,

    /// Entity category (e.g. Company, LLP)
    #[arg(long, alias = "enquire-fee-for")]
    pub entity_category: Option<String>,

    /// Nature of service
    #[arg(long)]
    pub nature_of_service: Option<String>,

    /// Sub-service
    #[arg(long)]
    pub sub_service: Option<String>,

    /// Whether the company has no share capital (Yes/No)
    #[arg(long)]
    pub no_share_capital: Option<String>,

    /// Whether the company has authorized capital (Yes/No)
    #[arg(long, alias = "auth-capital")]
    pub authorized_capital_flag: Option<String>,

    /// Authorized capital in INR
    #[arg(long, alias = "authorised-capital", allow_hyphen_values = true)]
    pub capital: Option<String>,

    /// Whether the company is a not-for-profit (Section 8) company (Yes/No)
    #[arg(long, alias = "section8")]
    pub not_for_profit: Option<String>,

    /// Reject malformed values instead of defaulting them
    #[arg(long)]
    pub strict: bool,

    /// Path to a JSON or YAML request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Arguments for listing jurisdictions
#[derive(Args)]
pub struct JurisdictionsArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Arguments for inspecting the rule table
#[derive(Args)]
pub struct RulesArgs {
    /// Show the rule one jurisdiction computes with
    #[arg(long, alias = "state")]
    pub jurisdiction: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let engine = build_engine(&args.engine)?;

    let params: FeeParams = if let Some(ref path) = args.input {
        FeeParams::from_value(&input::file::read_value(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        FeeParams::from_value(&data)
    } else {
        let mut map = Map::new();
        let flags = [
            ("jurisdiction", &args.jurisdiction),
            ("entityCategory", &args.entity_category),
            ("natureOfService", &args.nature_of_service),
            ("subService", &args.sub_service),
            ("hasNoShareCapitalFlag", &args.no_share_capital),
            ("hasAuthorizedCapitalFlag", &args.authorized_capital_flag),
            ("authorizedCapitalAmount", &args.capital),
            ("isNotForProfitFlag", &args.not_for_profit),
        ];
        for (key, value) in flags {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::String(v.clone()));
            }
        }
        FeeParams::from_value(&Value::Object(map))
    };

    let result = if args.strict {
        engine.calculate_strict(&params)?
    } else {
        engine.calculate(&params)?
    };
    Ok(serde_json::to_value(result)?)
}

pub fn run_jurisdictions(args: JurisdictionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let engine = build_engine(&args.engine)?;
    Ok(serde_json::to_value(engine.jurisdictions())?)
}

pub fn run_rules(args: RulesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let engine = build_engine(&args.engine)?;
    match args.jurisdiction {
        Some(ref name) => Ok(serde_json::to_value(engine.rule_for(name))?),
        None => Ok(serde_json::json!({
            "version": engine.rules().version(),
            "rules": engine.rules().rules(),
        })),
    }
}

pub fn run_options() -> Result<Value, Box<dyn std::error::Error>> {
    let jurisdictions = stamp_duty_core::stamp_duty::list_jurisdictions()?;
    Ok(serde_json::json!({
        "enquire_fee_for": ENQUIRE_FEE_FOR,
        "nature_of_service": NATURE_OF_SERVICE,
        "sub_service": SUB_SERVICE,
        "yes_no": YES_NO,
        "jurisdictions": jurisdictions,
    }))
}

fn build_engine(args: &EngineArgs) -> Result<FeeEngine, Box<dyn std::error::Error>> {
    let rules = match args.rules {
        Some(ref path) => {
            let doc: RuleTableDocument = input::file::read(path)?;
            let table = RuleTable::from_document(doc)?;
            tracing::info!(path = %path, rules = table.len(), "loaded rule table");
            Arc::new(table)
        }
        None => RuleTable::builtin()?,
    };
    let config: EngineConfig = match args.config {
        Some(ref path) => input::file::read(path)?,
        None => EngineConfig::default(),
    };
    Ok(FeeEngine::new(rules, config)?)
}

