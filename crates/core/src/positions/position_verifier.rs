use log::{debug, warn};
use std::collections::BTreeMap;

use crate::constants::PORTFOLIO_TOTAL_ACCOUNT_ID;
use crate::errors::{CalculatorError, Result};
use crate::money::FixedDecimal;
use crate::positions::{
    ComputedPosition, DiscrepancyKind, PositionDiscrepancy, ReportedPosition,
};

type PositionKey = (String, String);

/// Indexes positions by key, keeping the first of any duplicates.
fn index_first<'a, T: 'a>(
    positions: impl IntoIterator<Item = &'a T>,
    side: &str,
    key_of: impl Fn(&T) -> PositionKey,
) -> BTreeMap<PositionKey, &'a T> {
    let mut by_key = BTreeMap::new();
    for position in positions {
        let key = key_of(position);
        if by_key.contains_key(&key) {
            warn!(
                "Duplicate {} position for {}/{}; keeping the first",
                side, key.0, key.1
            );
            continue;
        }
        by_key.insert(key, position);
    }
    by_key
}

/// Diffs computed positions against the custodian snapshot.
///
/// Positions are matched on (account, symbol). Quantities must match
/// exactly and average costs must render to the same normalized decimal;
/// any difference is reported, however small. Reported cash positions are
/// ignored. Duplicate keys on either side keep the first position. Output
/// is sorted by (account, symbol, kind).
pub fn verify_positions(
    computed: &[ComputedPosition],
    reported: &[ReportedPosition],
) -> Vec<PositionDiscrepancy> {
    let computed_by_key = index_first(computed, "computed", |p: &ComputedPosition| {
        (p.account_id.clone(), p.symbol.clone())
    });
    let non_cash = reported.iter().filter(|p| !p.category.is_cash());
    let reported_by_key = index_first(non_cash, "reported", |p: &ReportedPosition| {
        (p.account_id.clone(), p.symbol.clone())
    });

    let mut discrepancies = Vec::new();

    for ((account_id, symbol), position) in &computed_by_key {
        let Some(reported_position) = reported_by_key.get(&(account_id.clone(), symbol.clone()))
        else {
            discrepancies.push(PositionDiscrepancy {
                kind: DiscrepancyKind::ComputedOnly,
                account_id: account_id.clone(),
                symbol: symbol.clone(),
                computed: Some(position.quantity),
                reported: None,
            });
            continue;
        };

        if position.quantity != reported_position.quantity {
            discrepancies.push(PositionDiscrepancy {
                kind: DiscrepancyKind::QuantityMismatch,
                account_id: account_id.clone(),
                symbol: symbol.clone(),
                computed: Some(position.quantity),
                reported: Some(reported_position.quantity),
            });
        }

        if position.average_cost.to_string() != reported_position.average_cost.to_string() {
            discrepancies.push(PositionDiscrepancy {
                kind: DiscrepancyKind::CostBasisMismatch,
                account_id: account_id.clone(),
                symbol: symbol.clone(),
                computed: Some(position.average_cost),
                reported: Some(reported_position.average_cost),
            });
        }
    }

    for ((account_id, symbol), position) in &reported_by_key {
        if !computed_by_key.contains_key(&(account_id.clone(), symbol.clone())) {
            discrepancies.push(PositionDiscrepancy {
                kind: DiscrepancyKind::ReportedOnly,
                account_id: account_id.clone(),
                symbol: symbol.clone(),
                computed: None,
                reported: Some(position.quantity),
            });
        }
    }

    discrepancies.sort_by(|a, b| {
        a.account_id
            .cmp(&b.account_id)
            .then_with(|| a.symbol.cmp(&b.symbol))
            .then_with(|| a.kind.cmp(&b.kind))
    });
    debug!(
        "Verified {} computed against {} reported positions: {} discrepancies",
        computed_by_key.len(),
        reported_by_key.len(),
        discrepancies.len()
    );
    discrepancies
}

/// Collapses reported positions into one `TOTAL` position per symbol so they
/// can be compared with positions aggregated by symbol only.
///
/// Quantities are summed and the average cost is re-weighted by quantity.
/// Symbols whose quantities cancel out are dropped.
pub fn roll_up_reported(reported: &[ReportedPosition]) -> Result<Vec<ReportedPosition>> {
    let mut groups: BTreeMap<String, Vec<&ReportedPosition>> = BTreeMap::new();
    for position in reported {
        groups
            .entry(position.symbol.clone())
            .or_default()
            .push(position);
    }

    let mut rolled = Vec::with_capacity(groups.len());
    for (symbol, group) in groups {
        let currency = group[0].currency.clone();
        let category = group[0].category;
        let mut quantity = FixedDecimal::ZERO;
        let mut total_cost = FixedDecimal::ZERO;

        for position in &group {
            if position.currency != currency {
                return Err(CalculatorError::CurrencyMismatch {
                    symbol,
                    expected: currency,
                    found: position.currency.clone(),
                }
                .into());
            }
            let cost = position
                .quantity
                .checked_mul(position.average_cost)
                .and_then(|cost| total_cost.checked_add(cost))
                .ok_or_else(|| CalculatorError::Overflow(format!("reported cost for {}", symbol)))?;
            total_cost = cost;
            quantity = quantity
                .checked_add(position.quantity)
                .ok_or_else(|| {
                    CalculatorError::Overflow(format!("reported quantity for {}", symbol))
                })?;
        }

        let Some(average_cost) = total_cost.checked_div_round(quantity) else {
            debug!("Reported positions for {} net to zero; dropping", symbol);
            continue;
        };

        rolled.push(ReportedPosition {
            account_id: PORTFOLIO_TOTAL_ACCOUNT_ID.to_string(),
            symbol,
            quantity,
            average_cost,
            currency,
            category,
        });
    }
    Ok(rolled)
}
