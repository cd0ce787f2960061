//! Holdings module - per-position overviews with valuation and gain splits.

mod holdings_model;
mod holdings_service;

pub use holdings_model::{
    Classification, ClassificationTable, HoldingOverview, HoldingWarning, HoldingWarningKind,
    HoldingsReport, InstrumentType,
};
pub use holdings_service::HoldingsService;
