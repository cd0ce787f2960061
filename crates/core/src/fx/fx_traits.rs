use chrono::NaiveDate;

use super::fx_model::{CurrencyPair, ExchangeRate, RateLookup};
use crate::errors::Result;
use crate::money::{FixedDecimal, Money};

/// Backing storage for exchange rates, read one pair at a time.
pub trait RateStoreTrait: Send + Sync {
    /// All stored rates for `pair`, or `None` when storage has nothing for it.
    fn load_pair_rates(&self, pair: &CurrencyPair) -> Result<Option<Vec<ExchangeRate>>>;
}

/// Converts money between currencies. Unavailable conversions are `None`,
/// never a zero amount.
pub trait CurrencyConverterTrait: Send + Sync {
    fn reporting_currency(&self) -> &str;

    /// Units of `pair.quote` per unit of `pair.base` for the lookup.
    fn rate(&self, pair: &CurrencyPair, lookup: RateLookup) -> Option<FixedDecimal>;

    fn convert(&self, money: &Money, target_currency: &str, lookup: RateLookup) -> Option<Money>;

    /// Converts to the reporting currency at the latest rate.
    fn convert_to_reporting(&self, money: &Money) -> Option<Money> {
        self.convert(money, self.reporting_currency(), RateLookup::Latest)
    }

    /// Converts to the reporting currency at the rate of `date`, or the latest rate
    /// when that day has none.
    fn convert_to_reporting_on(&self, money: &Money, date: NaiveDate) -> Option<Money> {
        self.convert(
            money,
            self.reporting_currency(),
            RateLookup::ExactOrLatest(date),
        )
    }
}
