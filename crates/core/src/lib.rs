//! Lotledger Core - FIFO tax lots, positions and gain classification.
//!
//! This crate is a pure computation layer. Callers hand it trades, custodian
//! position snapshots, exchange rates and prices; it returns lots,
//! positions, discrepancies and holding overviews. It performs no I/O.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod gains;
pub mod holdings;
pub mod lots;
pub mod money;
pub mod positions;
pub mod settings;
pub mod trades;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
