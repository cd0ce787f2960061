//! Gains module - holding period classification and realized/unrealized P&L.

mod gain_classifier;
mod gains_model;

pub use gain_classifier::{classify_disposal, classify_lot, LotValuator};
pub use gains_model::{GainSplit, HoldingPeriod, LotGain, PriceScale, RealizedGain};
