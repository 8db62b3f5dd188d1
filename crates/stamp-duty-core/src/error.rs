use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampDutyError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    /// A rule record that does not describe exactly one articles formula, or
    /// otherwise breaks the rule-table invariants. Never recovered from.
    #[error("Rule invariant violated for '{jurisdiction}': {reason}")]
    InvariantViolation {
        jurisdiction: String,
        reason: String,
    },

    #[error("Rule table could not be loaded: {0}")]
    RuleTableLoad(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StampDutyError {
    fn from(e: serde_json::Error) -> Self {
        StampDutyError::SerializationError(e.to_string())
    }
}
