use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::FxError;
use crate::money::FixedDecimal;

/// Where an exchange rate came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    /// Rates printed on the brokerage statement itself.
    #[default]
    Statement,
    /// A market data provider.
    Provider,
    /// Backfilled by the supplementary fetcher.
    Supplemental,
    Manual,
}

/// Typed (base, quote) key. Codes are stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Self {
        CurrencyPair {
            base: base.trim().to_ascii_uppercase(),
            quote: quote.trim().to_ascii_uppercase(),
        }
    }

    /// Parses `EUR/USD`, `EUR.USD` or `EURUSD`.
    pub fn parse(symbol: &str) -> Result<Self, FxError> {
        let trimmed = symbol.trim();
        let (base, quote) = match trimmed.split_once(['/', '.']) {
            Some(parts) => parts,
            None if trimmed.len() == 6 && trimmed.is_ascii() => trimmed.split_at(3),
            None => return Err(FxError::InvalidCurrencyPair(symbol.to_string())),
        };
        let valid = |code: &str| code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic());
        if !valid(base) || !valid(quote) {
            return Err(FxError::InvalidCurrencyPair(symbol.to_string()));
        }
        Ok(CurrencyPair::new(base, quote))
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Units of `quote_currency` per one unit of `base_currency` on `date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub date: NaiveDate,
    pub base_currency: String,
    pub quote_currency: String,
    pub rate: FixedDecimal,
    #[serde(default)]
    pub source: DataSource,
}

impl ExchangeRate {
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.base_currency, &self.quote_currency)
    }
}

/// Which rate of a pair's history a conversion should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLookup {
    /// The rate with the greatest date.
    Latest,
    /// Only a rate dated exactly on the given day.
    Exact(NaiveDate),
    /// The exact day if present, otherwise the latest rate. Never interpolates.
    ExactOrLatest(NaiveDate),
}

/// Append-only rate history for one pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateSeries {
    rates: BTreeMap<NaiveDate, FixedDecimal>,
}

impl RateSeries {
    /// Builds a series; when a date repeats, the first entry wins.
    pub fn from_rates<'a>(rates: impl IntoIterator<Item = &'a ExchangeRate>) -> Self {
        let mut series = RateSeries::default();
        for rate in rates {
            series.insert_if_absent(rate.date, rate.rate);
        }
        series
    }

    /// Appends a rate unless one already exists for `date`. Returns true when added.
    pub fn insert_if_absent(&mut self, date: NaiveDate, rate: FixedDecimal) -> bool {
        if self.rates.contains_key(&date) {
            return false;
        }
        self.rates.insert(date, rate);
        true
    }

    pub fn latest(&self) -> Option<(NaiveDate, FixedDecimal)> {
        self.rates.last_key_value().map(|(date, rate)| (*date, *rate))
    }

    pub fn on(&self, date: NaiveDate) -> Option<FixedDecimal> {
        self.rates.get(&date).copied()
    }

    /// Resolves a lookup to the dated rate it selects.
    pub fn lookup(&self, lookup: RateLookup) -> Option<(NaiveDate, FixedDecimal)> {
        match lookup {
            RateLookup::Latest => self.latest(),
            RateLookup::Exact(date) => self.on(date).map(|rate| (date, rate)),
            RateLookup::ExactOrLatest(date) => self
                .on(date)
                .map(|rate| (date, rate))
                .or_else(|| self.latest()),
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Cache state for one currency pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSlot {
    /// Storage was read and returned rates.
    Loaded(Arc<RateSeries>),
    /// Storage was read and has no rates for the pair.
    NotFound,
    /// Storage has not been read for the pair yet.
    NotYetLoaded,
}
