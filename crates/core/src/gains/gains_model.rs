use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::PERCENT_OF_FACE_DIVISOR;
use crate::money::FixedDecimal;
use crate::utils::time_utils::days_between;

/// Holding period bucket of a lot relative to a reference date.
///
/// The boundary is a plain day count (`days >= threshold`), not a
/// calendar anniversary rule.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
}

impl HoldingPeriod {
    pub fn classify(open_date: NaiveDate, as_of: NaiveDate, threshold_days: i64) -> Self {
        Self::from_days(days_between(open_date, as_of), threshold_days)
    }

    pub fn from_days(days_held: i64, threshold_days: i64) -> Self {
        if days_held >= threshold_days {
            HoldingPeriod::LongTerm
        } else {
            HoldingPeriod::ShortTerm
        }
    }

    pub fn is_long_term(&self) -> bool {
        matches!(self, HoldingPeriod::LongTerm)
    }
}

/// How an instrument's price relates to one unit of quantity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PriceScale {
    #[default]
    PerUnit,
    /// Quoted as a percentage of face value (bonds); price × quantity is
    /// divided by 100.
    PercentOfFace,
}

impl PriceScale {
    /// Price × quantity under this scale; `None` on overflow.
    pub fn amount(self, price: FixedDecimal, quantity: FixedDecimal) -> Option<FixedDecimal> {
        let product = price.checked_mul(quantity)?;
        match self {
            PriceScale::PerUnit => Some(product),
            PriceScale::PercentOfFace => product.checked_div_int_round(PERCENT_OF_FACE_DIVISOR),
        }
    }
}

/// Unrealized result of one open lot, in the reporting currency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LotGain {
    pub lot_id: String,
    pub account_id: String,
    pub symbol: String,
    pub holding_period: HoldingPeriod,
    pub days_held: i64,
    pub quantity: FixedDecimal,
    pub cost_price: FixedDecimal,
    pub market_price: FixedDecimal,
    pub market_value: FixedDecimal,
    pub cost_basis: FixedDecimal,
    pub unrealized: FixedDecimal,
}

/// Realized result of one lot disposal, in the reporting currency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RealizedGain {
    pub lot_id: String,
    pub sell_trade_id: String,
    pub account_id: String,
    pub symbol: String,
    pub holding_period: HoldingPeriod,
    pub days_held: i64,
    pub quantity: FixedDecimal,
    pub proceeds: FixedDecimal,
    pub cost_basis: FixedDecimal,
    pub realized: FixedDecimal,
}

/// Gains bucketed by holding period. Buckets are summed independently so
/// `short_term + long_term` always equals the total.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GainSplit {
    pub short_term: FixedDecimal,
    pub long_term: FixedDecimal,
}

impl GainSplit {
    /// Adds `amount` to the bucket for `period`. `None` on overflow.
    pub fn checked_add(self, period: HoldingPeriod, amount: FixedDecimal) -> Option<Self> {
        let mut split = self;
        match period {
            HoldingPeriod::ShortTerm => split.short_term = split.short_term.checked_add(amount)?,
            HoldingPeriod::LongTerm => split.long_term = split.long_term.checked_add(amount)?,
        }
        Some(split)
    }

    pub fn checked_merge(self, other: GainSplit) -> Option<Self> {
        Some(GainSplit {
            short_term: self.short_term.checked_add(other.short_term)?,
            long_term: self.long_term.checked_add(other.long_term)?,
        })
    }

    /// Short-term plus long-term. `None` on overflow.
    pub fn total(&self) -> Option<FixedDecimal> {
        self.short_term.checked_add(self.long_term)
    }

    pub fn from_lot_gains<'a>(gains: impl IntoIterator<Item = &'a LotGain>) -> Option<Self> {
        gains.into_iter().try_fold(GainSplit::default(), |split, gain| {
            split.checked_add(gain.holding_period, gain.unrealized)
        })
    }

    pub fn from_realized_gains<'a>(gains: impl IntoIterator<Item = &'a RealizedGain>) -> Option<Self> {
        gains.into_iter().try_fold(GainSplit::default(), |split, gain| {
            split.checked_add(gain.holding_period, gain.realized)
        })
    }
}
