use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CalculatorError;
use crate::money::FixedDecimal;

/// An open, possibly partially consumed, acquisition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaxLot {
    /// Id of the buy trade that opened the lot.
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub open_date: NaiveDate,
    /// Remaining quantity, always positive.
    pub quantity: FixedDecimal,
    /// Cost per unit in the lot currency.
    pub cost_price: FixedDecimal,
    pub currency: String,
}

impl TaxLot {
    /// Remaining quantity × cost price. `None` on overflow.
    pub fn cost_basis(&self) -> Option<FixedDecimal> {
        self.quantity.checked_mul(self.cost_price)
    }
}

/// The part of a lot closed by a sell.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LotDisposal {
    pub lot_id: String,
    pub sell_trade_id: String,
    pub account_id: String,
    pub symbol: String,
    pub open_date: NaiveDate,
    pub close_date: NaiveDate,
    pub quantity: FixedDecimal,
    pub cost_price: FixedDecimal,
    /// Lot currency, in which `cost_price` is expressed.
    pub currency: String,
    pub sale_price: FixedDecimal,
    pub sale_currency: String,
}

impl LotDisposal {
    /// (sale − cost) × quantity in the lot currency.
    /// `None` when the sale settled in another currency or on overflow.
    pub fn realized_gain(&self) -> Option<FixedDecimal> {
        if self.currency != self.sale_currency {
            return None;
        }
        self.sale_price
            .checked_sub(self.cost_price)?
            .checked_mul(self.quantity)
    }
}

/// A queue that stopped matching because a sell ran past its open lots.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LotMatchWarning {
    pub symbol: String,
    /// Set when queues are kept per account.
    pub account_id: Option<String>,
    pub trade_id: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: CalculatorError,
}

fn serialize_error<S>(error: &CalculatorError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}

impl fmt::Display for LotMatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.account_id {
            Some(account_id) => write!(
                f,
                "[{} / {}] trade {}: {}",
                account_id, self.symbol, self.trade_id, self.error
            ),
            None => write!(f, "[{}] trade {}: {}", self.symbol, self.trade_id, self.error),
        }
    }
}

/// Output of one FIFO pass.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LotMatchResult {
    /// Open lots sorted by (symbol, open date, account, lot id).
    pub lots: Vec<TaxLot>,
    /// Closed lot portions sorted by (symbol, close date, account, sell trade, open date).
    pub disposals: Vec<LotDisposal>,
    /// Queues abandoned under the isolating policy.
    pub warnings: Vec<LotMatchWarning>,
}

impl LotMatchResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Total open quantity for a symbol across accounts.
    pub fn open_quantity(&self, symbol: &str) -> FixedDecimal {
        self.lots
            .iter()
            .filter(|lot| lot.symbol == symbol)
            .map(|lot| lot.quantity)
            .sum()
    }
}
