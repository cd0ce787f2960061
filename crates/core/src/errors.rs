//! Core error types for the lot engine.
//!
//! Every fallible operation in the crate returns [`Result`]. Conditions that
//! describe gaps in the supplied data (a sell with no prior buy, a missing FX
//! rate) are distinguishable from hard failures through [`Error::is_advisory`],
//! so a presentation layer can downgrade them to warnings.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use crate::fx::FxError;
use crate::money::FixedDecimal;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the lot engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Lot calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

impl Error {
    /// Returns true for data-gap conditions that callers usually report as
    /// warnings rather than aborting on.
    pub fn is_advisory(&self) -> bool {
        match self {
            Error::Calculation(CalculatorError::InsufficientLots { .. }) => true,
            Error::Fx(FxError::RateNotFound(_)) | Error::Fx(FxError::ZeroRate(_)) => true,
            _ => false,
        }
    }
}

/// Errors raised while matching trades into lots and aggregating them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("Insufficient lots for {symbol}: {unmatched} shares could not be matched to a prior buy")]
    InsufficientLots {
        symbol: String,
        unmatched: FixedDecimal,
    },

    #[error("Trade {trade_id} has no recognized buy or sell side")]
    InvalidTradeSide { trade_id: String },

    #[error("Trade {trade_id} is invalid: {reason}")]
    InvalidTrade { trade_id: String, reason: String },

    #[error("Currency mismatch for {symbol}: lots are held in both {expected} and {found}")]
    CurrencyMismatch {
        symbol: String,
        expected: String,
        found: String,
    },

    #[error("Arithmetic overflow while computing {0}")]
    Overflow(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid decimal '{input}': {reason}")]
    InvalidDecimal { input: String, reason: String },

    #[error("Invalid date '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: ChronoParseError,
    },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::Json(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_lots_is_advisory() {
        let err: Error = CalculatorError::InsufficientLots {
            symbol: "AAPL".to_string(),
            unmatched: FixedDecimal::from_units(5),
        }
        .into();
        assert!(err.is_advisory());
        assert_eq!(
            err.to_string(),
            "Lot calculation failed: Insufficient lots for AAPL: 5 shares could not be matched to a prior buy"
        );
    }

    #[test]
    fn invalid_side_is_fatal() {
        let err: Error = CalculatorError::InvalidTradeSide {
            trade_id: "T-1".to_string(),
        }
        .into();
        assert!(!err.is_advisory());
    }

    #[test]
    fn missing_rate_is_advisory() {
        let err: Error = FxError::RateNotFound("EUR/USD".to_string()).into();
        assert!(err.is_advisory());
        let err: Error = FxError::Storage("disk gone".to_string()).into();
        assert!(!err.is_advisory());
    }
}
