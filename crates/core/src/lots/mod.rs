//! Lots module - FIFO matching of trades into open tax lots.

mod fifo_matcher;
mod lots_model;

pub use fifo_matcher::{compute_tax_lots, FifoLotMatcher};
pub use lots_model::{LotDisposal, LotMatchResult, LotMatchWarning, TaxLot};
