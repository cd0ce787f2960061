use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::fx_errors::FxError;
use super::fx_model::{CurrencyPair, ExchangeRate, RateLookup, RateSlot};
use super::fx_traits::{CurrencyConverterTrait, RateStoreTrait};
use super::rate_cache::RateCache;
use crate::errors::Result;
use crate::money::{FixedDecimal, Money};
use crate::settings::CoreSettings;
use crate::trades::Trade;

/// Converts amounts with direct per-pair rates read lazily from a rate store.
///
/// A conversion from `X` to `Y` uses the `X/Y` series only. There is no
/// triangulation through a third currency and no interpolation between dates.
pub struct CurrencyConverter {
    reporting_currency: String,
    cache: RateCache,
}

impl CurrencyConverter {
    pub fn new(store: Arc<dyn RateStoreTrait>, reporting_currency: &str) -> Self {
        Self {
            reporting_currency: reporting_currency.trim().to_ascii_uppercase(),
            cache: RateCache::new(store),
        }
    }

    pub fn from_settings(store: Arc<dyn RateStoreTrait>, settings: &CoreSettings) -> Self {
        Self::new(store, &settings.reporting_currency)
    }

    /// Cache state for a pair, without loading it.
    pub fn slot(&self, pair: &CurrencyPair) -> RateSlot {
        self.cache.slot(pair)
    }

    /// Accepts rates backfilled by an external fetcher. Existing (date, pair)
    /// entries are never replaced. Returns the number of rates added.
    pub fn supplement_rates(&self, rates: &[ExchangeRate]) -> Result<usize> {
        let added = self.cache.supplement(rates)?;
        debug!("Accepted {} of {} supplemental rates", added, rates.len());
        Ok(added)
    }

    /// Rate for `pair`, or the reason there is none.
    ///
    /// A missing pair or date is `FxError::RateNotFound` and a zero rate is
    /// `FxError::ZeroRate`; both are advisory. Storage failures pass through.
    pub fn require_rate(&self, pair: &CurrencyPair, lookup: RateLookup) -> Result<FixedDecimal> {
        let series = match self.cache.get_or_load(pair)? {
            RateSlot::Loaded(series) => series,
            RateSlot::NotFound | RateSlot::NotYetLoaded => {
                return Err(FxError::RateNotFound(pair.to_string()).into());
            }
        };

        let Some((date, rate)) = series.lookup(lookup) else {
            return Err(FxError::RateNotFound(format!("{} ({:?})", pair, lookup)).into());
        };
        if let RateLookup::ExactOrLatest(requested) = lookup {
            if requested != date {
                debug!(
                    "No {} rate on {}; using latest rate from {}",
                    pair, requested, date
                );
            }
        }
        if rate.is_zero() {
            return Err(FxError::ZeroRate(format!("{} on {}", pair, date)).into());
        }
        Ok(rate)
    }

    /// (currency, trade date) pairs for which no usable rate to the reporting
    /// currency exists on the exact trade date.
    pub fn missing_trade_rates(&self, trades: &[Trade]) -> Result<BTreeSet<(String, NaiveDate)>> {
        let mut missing = BTreeSet::new();
        for trade in trades {
            let currency = trade.currency.trim().to_ascii_uppercase();
            if currency == self.reporting_currency {
                continue;
            }
            let pair = CurrencyPair::new(&currency, &self.reporting_currency);
            let has_rate = match self.cache.get_or_load(&pair)? {
                RateSlot::Loaded(series) => series
                    .on(trade.trade_date)
                    .is_some_and(|rate| !rate.is_zero()),
                RateSlot::NotFound | RateSlot::NotYetLoaded => false,
            };
            if !has_rate {
                missing.insert((currency, trade.trade_date));
            }
        }
        Ok(missing)
    }
}

impl CurrencyConverterTrait for CurrencyConverter {
    fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    fn rate(&self, pair: &CurrencyPair, lookup: RateLookup) -> Option<FixedDecimal> {
        match self.require_rate(pair, lookup) {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!("Conversion unavailable: {}", e);
                None
            }
        }
    }

    fn convert(&self, money: &Money, target_currency: &str, lookup: RateLookup) -> Option<Money> {
        if money.is_currency(target_currency) {
            return Some(Money::new(money.amount, target_currency.to_ascii_uppercase()));
        }

        let pair = CurrencyPair::new(&money.currency, target_currency);
        let rate = self.rate(&pair, lookup)?;
        match money.amount.checked_mul(rate) {
            Some(amount) => Some(Money::new(amount, pair.quote)),
            None => {
                warn!("Overflow converting {} at {} {}", money, pair, rate);
                None
            }
        }
    }
}
