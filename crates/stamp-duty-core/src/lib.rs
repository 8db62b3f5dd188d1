pub mod error;
pub mod types;

#[cfg(feature = "stamp_duty")]
pub mod stamp_duty;

pub use error::StampDutyError;
pub use types::*;

/// Standard result type for all stamp-duty operations
pub type StampDutyResult<T> = Result<T, StampDutyError>;
