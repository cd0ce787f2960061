use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::Result;
use crate::gains::{GainSplit, PriceScale};
use crate::money::{FixedDecimal, Money};

/// Kind of instrument a symbol refers to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum InstrumentType {
    #[default]
    Stock,
    Etf,
    Fund,
    Bond,
    Option,
    Crypto,
    Other,
}

impl InstrumentType {
    pub fn price_scale(&self) -> PriceScale {
        match self {
            InstrumentType::Bond => PriceScale::PercentOfFace,
            _ => PriceScale::PerUnit,
        }
    }
}

/// Descriptive metadata for one symbol, supplied by configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Classification {
    pub category: Option<String>,
    pub instrument_type: InstrumentType,
    pub sector: Option<String>,
    pub geography: Option<String>,
}

/// Read-only symbol → classification side table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct ClassificationTable {
    entries: HashMap<String, Classification>,
}

impl ClassificationTable {
    pub fn new(entries: HashMap<String, Classification>) -> Self {
        Self { entries }
    }

    /// Parses a JSON object keyed by symbol.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, symbol: &str) -> Option<&Classification> {
        self.entries.get(symbol)
    }

    /// Unclassified symbols are priced per unit.
    pub fn price_scale(&self, symbol: &str) -> PriceScale {
        self.get(symbol)
            .map(|c| c.instrument_type.price_scale())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-position view combining lots, market price and FX conversion.
///
/// Amounts without a currency suffix are in the reporting currency. Any
/// value that depends on a missing price or rate is `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingOverview {
    pub account_id: String,
    pub symbol: String,
    pub classification: Option<Classification>,

    // Position data, in the lot currency
    pub quantity: FixedDecimal,
    pub local_currency: String,
    pub average_cost_local: FixedDecimal,
    pub cost_basis_local: FixedDecimal,
    pub inception_date: Option<NaiveDate>,
    pub lot_count: usize,

    // Valuation
    pub reporting_currency: String,
    pub market_price: Option<Money>,
    pub market_value: Option<FixedDecimal>,
    pub cost_basis: Option<FixedDecimal>,
    pub unrealized_gain: Option<FixedDecimal>,
    pub unrealized_split: Option<GainSplit>,
    pub realized_gain: Option<FixedDecimal>,
    pub realized_split: Option<GainSplit>,
    pub total_gain: Option<FixedDecimal>,

    /// Share of the total valued market value, rounded to the micro-unit.
    pub weight: Option<FixedDecimal>,
    pub as_of_date: NaiveDate,
}

impl HoldingOverview {
    pub fn is_closed(&self) -> bool {
        self.quantity.is_zero()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldingWarningKind {
    MissingPrice,
    MissingFxRate,
    UnmatchedSell,
    /// Lots of one group are held in more than one currency; the group is skipped.
    CurrencyMismatch,
}

/// A data gap that left part of an overview unavailable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingWarning {
    pub kind: HoldingWarningKind,
    pub account_id: Option<String>,
    pub symbol: String,
    pub message: String,
}

impl fmt::Display for HoldingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.account_id {
            Some(account_id) => write!(f, "{}/{}: {}", account_id, self.symbol, self.message),
            None => write!(f, "{}: {}", self.symbol, self.message),
        }
    }
}

/// Output of one overview pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsReport {
    pub reporting_currency: String,
    pub as_of_date: NaiveDate,
    /// Sorted by (symbol, account).
    pub overviews: Vec<HoldingOverview>,
    pub warnings: Vec<HoldingWarning>,
}

impl HoldingsReport {
    /// Unrealized gains summed over every fully valued overview.
    pub fn unrealized_split(&self) -> Option<GainSplit> {
        self.overviews
            .iter()
            .filter_map(|o| o.unrealized_split)
            .try_fold(GainSplit::default(), |acc, split| acc.checked_merge(split))
    }
}
