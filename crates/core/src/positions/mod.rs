//! Positions module - lot aggregation and reconciliation against custodian snapshots.

mod position_aggregator;
mod position_verifier;
mod positions_model;

pub use position_aggregator::{aggregate_positions, reduce_lots};
pub use position_verifier::{roll_up_reported, verify_positions};
pub use positions_model::{
    AssetCategory, ComputedPosition, DiscrepancyKind, PositionDiscrepancy, ReportedPosition,
    VerificationSummary,
};

#[cfg(test)]
mod position_verifier_tests;
