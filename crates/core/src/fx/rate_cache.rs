use dashmap::DashMap;
use log::{debug, error};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::fx_errors::FxError;
use super::fx_model::{CurrencyPair, ExchangeRate, RateSeries, RateSlot};
use super::fx_traits::RateStoreTrait;
use crate::errors::Result;

/// Lazily populated per-pair rate cache.
///
/// A pair is read from storage on first access only. The first load of a
/// pair is serialized by that pair's guard; once a slot exists it is read
/// straight from the map. Missing pairs are cached as `NotFound`. Storage
/// errors are not cached, so a later call retries.
pub struct RateCache {
    store: Arc<dyn RateStoreTrait>,
    slots: DashMap<CurrencyPair, RateSlot>,
    load_guards: DashMap<CurrencyPair, Arc<Mutex<()>>>,
}

impl RateCache {
    pub fn new(store: Arc<dyn RateStoreTrait>) -> Self {
        Self {
            store,
            slots: DashMap::new(),
            load_guards: DashMap::new(),
        }
    }

    /// Current slot without touching storage.
    pub fn slot(&self, pair: &CurrencyPair) -> RateSlot {
        self.slots
            .get(pair)
            .map(|slot| slot.value().clone())
            .unwrap_or(RateSlot::NotYetLoaded)
    }

    /// Slot for `pair`, reading storage if the pair was never loaded.
    pub fn get_or_load(&self, pair: &CurrencyPair) -> Result<RateSlot> {
        if let Some(slot) = self.slots.get(pair) {
            return Ok(slot.value().clone());
        }

        let guard = self.guard_for(pair);
        let _lock = guard
            .lock()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        self.load_locked(pair)
    }

    /// Appends supplied rates. Dates already present for a pair are kept as
    /// they are. Returns how many rates were added.
    ///
    /// Every affected pair is loaded before any is changed, so a storage
    /// error leaves the cache without any of the supplied rates.
    pub fn supplement(&self, rates: &[ExchangeRate]) -> Result<usize> {
        let mut by_pair: BTreeMap<CurrencyPair, Vec<&ExchangeRate>> = BTreeMap::new();
        for rate in rates {
            by_pair.entry(rate.pair()).or_default().push(rate);
        }

        // Guards are taken in pair order; `get_or_load` holds at most one.
        let guards: Vec<Arc<Mutex<()>>> = by_pair.keys().map(|pair| self.guard_for(pair)).collect();
        let _locks = guards
            .iter()
            .map(|guard| guard.lock().map_err(|e| FxError::CacheError(e.to_string())))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut staged = Vec::with_capacity(by_pair.len());
        for (pair, pair_rates) in by_pair {
            let mut series = match self.load_locked(&pair)? {
                RateSlot::Loaded(series) => (*series).clone(),
                RateSlot::NotFound | RateSlot::NotYetLoaded => RateSeries::default(),
            };
            let before = series.len();
            for rate in pair_rates {
                series.insert_if_absent(rate.date, rate.rate);
            }
            let pair_added = series.len() - before;
            if pair_added > 0 {
                staged.push((pair, series, pair_added));
            }
        }

        let mut added = 0;
        for (pair, series, pair_added) in staged {
            debug!("Supplemented {} rates for {}", pair_added, pair);
            self.slots.insert(pair, RateSlot::Loaded(Arc::new(series)));
            added += pair_added;
        }
        Ok(added)
    }

    fn guard_for(&self, pair: &CurrencyPair) -> Arc<Mutex<()>> {
        self.load_guards
            .entry(pair.clone())
            .or_default()
            .value()
            .clone()
    }

    /// Loads `pair` into the cache. Caller must hold the pair's guard.
    fn load_locked(&self, pair: &CurrencyPair) -> Result<RateSlot> {
        if let Some(slot) = self.slots.get(pair) {
            return Ok(slot.value().clone());
        }

        let slot = match self.store.load_pair_rates(pair) {
            Ok(Some(rates)) if !rates.is_empty() => {
                let series = RateSeries::from_rates(&rates);
                debug!("Loaded {} rates for {}", series.len(), pair);
                RateSlot::Loaded(Arc::new(series))
            }
            Ok(_) => {
                debug!("No rates stored for {}", pair);
                RateSlot::NotFound
            }
            Err(e) => {
                error!("Failed to load rates for {}: {}", pair, e);
                return Err(e);
            }
        };
        self.slots.insert(pair.clone(), slot.clone());
        Ok(slot)
    }
}
