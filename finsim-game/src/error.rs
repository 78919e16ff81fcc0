//! Failure taxonomy for engine operations.

use thiserror::Error;

/// Validation failure reported by an engine operation.
///
/// Every variant is raised before any state is touched, so a rejected call
/// leaves the engine exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("amount must be a positive number (got {amount})")]
    InvalidAmount { amount: f64 },
    #[error("not enough cash: requested ${requested:.2}, available ${available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },
    #[error(
        "credit limit exceeded: borrowing ${requested:.2} on top of ${debt:.2} would pass the ${ceiling:.2} ceiling"
    )]
    CreditLimitExceeded {
        requested: f64,
        debt: f64,
        ceiling: f64,
    },
    #[error("no more rounds: all {total_rounds} rounds have been played")]
    NoMoreRounds { total_rounds: u32 },
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),
}

/// Validate that an amount is a positive, finite number.
///
/// # Errors
///
/// Returns [`EngineError::InvalidAmount`] for zero, negative, NaN or infinite values.
pub fn ensure_positive(amount: f64) -> Result<f64, EngineError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(EngineError::InvalidAmount { amount })
    }
}

/// Parse raw user input into a validated amount.
///
/// Blank or non-numeric text is treated like a non-positive amount.
///
/// # Errors
///
/// Returns [`EngineError::InvalidAmount`] when the text is not a positive number.
pub fn parse_amount(raw: &str) -> Result<f64, EngineError> {
    let amount = raw.trim().parse::<f64>().unwrap_or(f64::NAN);
    ensure_positive(amount)
}
