//! Trades module - executed orders as supplied by the statement parser.

mod trades_model;

pub use trades_model::{parse_trade_date, Trade, TradeSide};
