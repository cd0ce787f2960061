use log::debug;
use std::collections::BTreeMap;

use crate::constants::PORTFOLIO_TOTAL_ACCOUNT_ID;
use crate::errors::{CalculatorError, Result};
use crate::lots::TaxLot;
use crate::money::FixedDecimal;
use crate::positions::ComputedPosition;
use crate::settings::AggregationKey;

/// Reduces open lots into one weighted-average-cost position per group.
///
/// Groups whose quantity sums to zero are fully closed and dropped. Output
/// is sorted by (symbol, account).
pub fn aggregate_positions(lots: &[TaxLot], key: AggregationKey) -> Result<Vec<ComputedPosition>> {
    let mut groups: BTreeMap<(String, String), Vec<&TaxLot>> = BTreeMap::new();
    for lot in lots {
        let account_id = match key {
            AggregationKey::Symbol => PORTFOLIO_TOTAL_ACCOUNT_ID.to_string(),
            AggregationKey::SymbolAndAccount => lot.account_id.clone(),
        };
        groups
            .entry((lot.symbol.clone(), account_id))
            .or_default()
            .push(lot);
    }

    let mut positions = Vec::with_capacity(groups.len());
    for ((symbol, account_id), group) in groups {
        if let Some(position) = reduce_lots(symbol, account_id, &group)? {
            positions.push(position);
        }
    }
    Ok(positions)
}

/// Reduces the lots of one group into its position; `Ok(None)` when the
/// group is empty or fully closed. All lots must share one currency.
pub fn reduce_lots(
    symbol: String,
    account_id: String,
    lots: &[&TaxLot],
) -> Result<Option<ComputedPosition>> {
    let Some(first) = lots.first() else {
        return Ok(None);
    };
    let currency = first.currency.clone();
    let mut inception_date = first.open_date;
    let mut quantity = FixedDecimal::ZERO;
    let mut total_cost = FixedDecimal::ZERO;

    for lot in lots {
        if lot.currency != currency {
            return Err(CalculatorError::CurrencyMismatch {
                symbol,
                expected: currency,
                found: lot.currency.clone(),
            }
            .into());
        }
        let lot_cost = lot
            .cost_basis()
            .ok_or_else(|| overflow(&symbol, "lot cost basis"))?;
        quantity = quantity
            .checked_add(lot.quantity)
            .ok_or_else(|| overflow(&symbol, "position quantity"))?;
        total_cost = total_cost
            .checked_add(lot_cost)
            .ok_or_else(|| overflow(&symbol, "position cost"))?;
        inception_date = inception_date.min(lot.open_date);
    }

    if quantity.is_zero() {
        debug!("Dropping closed position {}/{}", account_id, symbol);
        return Ok(None);
    }

    let average_cost = total_cost
        .checked_div_round(quantity)
        .ok_or_else(|| overflow(&symbol, "average cost"))?;

    Ok(Some(ComputedPosition {
        account_id,
        symbol,
        quantity,
        total_cost,
        average_cost,
        currency,
        inception_date,
        lot_count: lots.len(),
    }))
}

fn overflow(symbol: &str, what: &str) -> CalculatorError {
    CalculatorError::Overflow(format!("{} for {}", what, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use chrono::NaiveDate;

    fn fd(s: &str) -> FixedDecimal {
        s.parse().unwrap()
    }

    fn lot(id: &str, account: &str, symbol: &str, day: u32, qty: &str, cost: &str) -> TaxLot {
        TaxLot {
            id: id.to_string(),
            account_id: account.to_string(),
            symbol: symbol.to_string(),
            open_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            quantity: fd(qty),
            cost_price: fd(cost),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_single_lot_position() {
        let positions =
            aggregate_positions(&[lot("L1", "U1", "AAPL", 1, "3", "120")], AggregationKey::Symbol)
                .unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].account_id, "TOTAL");
        assert_eq!(positions[0].quantity, fd("3"));
        assert_eq!(positions[0].average_cost, fd("120"));
        assert_eq!(positions[0].total_cost, fd("360"));
    }

    #[test]
    fn test_weighted_average_rounds_to_nearest() {
        let lots = vec![
            lot("L1", "U1", "AAPL", 1, "1", "10"),
            lot("L2", "U1", "AAPL", 2, "2", "10.000001"),
        ];
        let positions = aggregate_positions(&lots, AggregationKey::Symbol).unwrap();
        // 30.000002 / 3 = 10.00000066.. rounds up
        assert_eq!(positions[0].total_cost, fd("30.000002"));
        assert_eq!(positions[0].average_cost, fd("10.000001"));
    }

    #[test]
    fn test_account_key_splits_positions() {
        let lots = vec![
            lot("L1", "U2", "AAPL", 1, "1", "100"),
            lot("L2", "U1", "AAPL", 2, "3", "200"),
            lot("L3", "U1", "AAPL", 3, "1", "100"),
        ];
        let by_account = aggregate_positions(&lots, AggregationKey::SymbolAndAccount).unwrap();
        assert_eq!(by_account.len(), 2);
        assert_eq!(by_account[0].account_id, "U1");
        assert_eq!(by_account[0].quantity, fd("4"));
        assert_eq!(by_account[0].average_cost, fd("175"));
        assert_eq!(by_account[0].inception_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(by_account[1].account_id, "U2");

        let pooled = aggregate_positions(&lots, AggregationKey::Symbol).unwrap();
        assert_eq!(pooled.len(), 1);
        assert_eq!(pooled[0].quantity, fd("5"));
        assert_eq!(pooled[0].average_cost, fd("160"));
        assert_eq!(pooled[0].lot_count, 3);
    }

    #[test]
    fn test_output_sorted_by_symbol() {
        let lots = vec![
            lot("L1", "U1", "MSFT", 1, "1", "300"),
            lot("L2", "U1", "AAPL", 1, "1", "100"),
        ];
        let positions = aggregate_positions(&lots, AggregationKey::Symbol).unwrap();
        let symbols: Vec<&str> = positions.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_currency_mismatch_is_an_error() {
        let mut eur_lot = lot("L2", "U1", "SAP", 2, "1", "100");
        eur_lot.currency = "EUR".to_string();
        let lots = vec![lot("L1", "U1", "SAP", 1, "1", "100"), eur_lot];
        let err = aggregate_positions(&lots, AggregationKey::Symbol).unwrap_err();
        assert!(matches!(
            err,
            Error::Calculation(CalculatorError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_input_gives_no_positions() {
        assert!(aggregate_positions(&[], AggregationKey::Symbol)
            .unwrap()
            .is_empty());
    }
}
