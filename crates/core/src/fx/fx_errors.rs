use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FxError {
    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),

    #[error("Exchange rate is zero: {0}")]
    ZeroRate(String),

    #[error("Invalid currency pair: {0}")]
    InvalidCurrencyPair(String),

    #[error("Rate storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}
