use std::collections::HashMap;

use super::fx_model::{CurrencyPair, ExchangeRate};
use super::fx_traits::RateStoreTrait;
use crate::errors::Result;

/// Rate storage backed by rates handed over by the caller.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateStore {
    rates: HashMap<CurrencyPair, Vec<ExchangeRate>>,
}

impl InMemoryRateStore {
    pub fn new(rates: Vec<ExchangeRate>) -> Self {
        let mut store = InMemoryRateStore::default();
        for rate in rates {
            store.rates.entry(rate.pair()).or_default().push(rate);
        }
        store
    }
}

impl RateStoreTrait for InMemoryRateStore {
    fn load_pair_rates(&self, pair: &CurrencyPair) -> Result<Option<Vec<ExchangeRate>>> {
        Ok(self.rates.get(pair).cloned())
    }
}
