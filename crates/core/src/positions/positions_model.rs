use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::FixedDecimal;

/// Aggregate of the open lots for one symbol (and account).
///
/// `account_id` is the `TOTAL` pseudo account when lots from every account
/// were pooled.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComputedPosition {
    pub account_id: String,
    pub symbol: String,
    pub quantity: FixedDecimal,
    /// Σ quantity × cost price over the lots.
    pub total_cost: FixedDecimal,
    /// total_cost / quantity, rounded to the nearest micro-unit.
    pub average_cost: FixedDecimal,
    pub currency: String,
    /// Open date of the oldest contributing lot.
    pub inception_date: NaiveDate,
    pub lot_count: usize,
}

/// Asset category of a custodian-reported position.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum AssetCategory {
    Cash,
    #[default]
    Stock,
    Bond,
    Option,
    Fund,
    Other,
}

impl AssetCategory {
    /// Cash balances are not tax lots and never take part in reconciliation.
    pub fn is_cash(&self) -> bool {
        matches!(self, AssetCategory::Cash)
    }
}

/// A position as reported by the custodian's own snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportedPosition {
    pub account_id: String,
    pub symbol: String,
    pub quantity: FixedDecimal,
    pub average_cost: FixedDecimal,
    pub currency: String,
    #[serde(default)]
    pub category: AssetCategory,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum DiscrepancyKind {
    QuantityMismatch,
    CostBasisMismatch,
    ComputedOnly,
    ReportedOnly,
}

impl DiscrepancyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyKind::QuantityMismatch => "QUANTITY_MISMATCH",
            DiscrepancyKind::CostBasisMismatch => "COST_BASIS_MISMATCH",
            DiscrepancyKind::ComputedOnly => "COMPUTED_ONLY",
            DiscrepancyKind::ReportedOnly => "REPORTED_ONLY",
        }
    }
}

/// One difference between computed and reported holdings.
///
/// For quantity and presence discrepancies the values are quantities, for
/// cost-basis discrepancies they are average costs. A side that has no
/// position carries `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PositionDiscrepancy {
    pub kind: DiscrepancyKind,
    pub account_id: String,
    pub symbol: String,
    pub computed: Option<FixedDecimal>,
    pub reported: Option<FixedDecimal>,
}

impl fmt::Display for PositionDiscrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<FixedDecimal>| {
            value
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        write!(
            f,
            "{} {}/{}: computed {} reported {}",
            self.kind.as_str(),
            self.account_id,
            self.symbol,
            show(&self.computed),
            show(&self.reported)
        )
    }
}

/// Discrepancy counts for one verification run.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSummary {
    pub quantity_mismatches: usize,
    pub cost_basis_mismatches: usize,
    pub computed_only: usize,
    pub reported_only: usize,
}

impl VerificationSummary {
    pub fn from_discrepancies(discrepancies: &[PositionDiscrepancy]) -> Self {
        let mut summary = VerificationSummary::default();
        for discrepancy in discrepancies {
            match discrepancy.kind {
                DiscrepancyKind::QuantityMismatch => summary.quantity_mismatches += 1,
                DiscrepancyKind::CostBasisMismatch => summary.cost_basis_mismatches += 1,
                DiscrepancyKind::ComputedOnly => summary.computed_only += 1,
                DiscrepancyKind::ReportedOnly => summary.reported_only += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.quantity_mismatches + self.cost_basis_mismatches + self.computed_only + self.reported_only
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}
