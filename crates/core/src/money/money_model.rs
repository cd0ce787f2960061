use serde::{Deserialize, Serialize};
use std::fmt;

use super::FixedDecimal;

/// A fixed-point amount tagged with its ISO currency code.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: FixedDecimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: FixedDecimal, currency: impl Into<String>) -> Self {
        Money {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Money::new(FixedDecimal::ZERO, currency)
    }

    pub fn is_currency(&self, currency: &str) -> bool {
        self.currency.eq_ignore_ascii_case(currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
