use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_REPORTING_CURRENCY, LONG_TERM_THRESHOLD_DAYS};
use crate::errors::{Error, Result};
use crate::utils::time_utils::valuation_date_today;

/// How trades are partitioned into FIFO queues.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum LotGrouping {
    /// One queue per symbol, pooling every account.
    Symbol,
    /// One queue per (account, symbol). FIFO order is only meaningful
    /// inside a single custodial account.
    #[default]
    SymbolAndAccount,
}

/// Grouping key used when reducing lots into positions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AggregationKey {
    /// One position per symbol under the `TOTAL` pseudo account.
    #[default]
    Symbol,
    /// One position per (symbol, account).
    SymbolAndAccount,
}

/// What the matcher does when a sell cannot be covered by open lots.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum InsufficientLotsPolicy {
    /// Abort the whole pass on the first uncovered sell.
    FailFast,
    /// Stop the affected queue, record a warning, keep matching the others.
    #[default]
    IsolateSymbol,
}

/// Settings for one computation pass. Every field has a default so a
/// partial JSON object is valid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreSettings {
    pub reporting_currency: String,
    pub long_term_threshold_days: i64,
    pub lot_grouping: LotGrouping,
    pub aggregation_key: AggregationKey,
    pub insufficient_lots_policy: InsufficientLotsPolicy,
    /// Reference date for holding periods. Today in the valuation timezone when unset.
    pub as_of_date: Option<NaiveDate>,
}

impl Default for CoreSettings {
    fn default() -> Self {
        CoreSettings {
            reporting_currency: DEFAULT_REPORTING_CURRENCY.to_string(),
            long_term_threshold_days: LONG_TERM_THRESHOLD_DAYS,
            lot_grouping: LotGrouping::default(),
            aggregation_key: AggregationKey::default(),
            insufficient_lots_policy: InsufficientLotsPolicy::default(),
            as_of_date: None,
        }
    }
}

impl CoreSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: CoreSettings = serde_json::from_str(json)?;
        settings.validated()
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let settings: CoreSettings = serde_json::from_value(value)?;
        settings.validated()
    }

    /// Normalizes the currency code and rejects values the engine cannot use.
    pub fn validated(mut self) -> Result<Self> {
        let currency = self.reporting_currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::InvalidConfigValue(format!(
                "reportingCurrency must be a 3-letter ISO code, got '{}'",
                self.reporting_currency
            )));
        }
        if self.long_term_threshold_days <= 0 {
            return Err(Error::InvalidConfigValue(format!(
                "longTermThresholdDays must be positive, got {}",
                self.long_term_threshold_days
            )));
        }
        self.reporting_currency = currency;
        Ok(self)
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of_date.unwrap_or_else(valuation_date_today)
    }
}
