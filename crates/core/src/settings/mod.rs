//! Settings module - per-pass configuration for the lot engine.

mod settings_model;

pub use settings_model::{AggregationKey, CoreSettings, InsufficientLotsPolicy, LotGrouping};
