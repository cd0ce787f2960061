//! FX (Foreign Exchange) module - rate model, lazy rate cache and conversion.

mod currency_converter;
mod fx_errors;
mod fx_model;
mod fx_traits;
mod rate_cache;
mod rate_store;

pub use currency_converter::CurrencyConverter;
pub use fx_errors::FxError;
pub use fx_model::{CurrencyPair, DataSource, ExchangeRate, RateLookup, RateSeries, RateSlot};
pub use fx_traits::{CurrencyConverterTrait, RateStoreTrait};
pub use rate_cache::RateCache;
pub use rate_store::InMemoryRateStore;
