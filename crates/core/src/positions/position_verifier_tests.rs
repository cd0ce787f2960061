#[cfg(test)]
mod tests {
    use crate::money::FixedDecimal;
    use crate::positions::{
        roll_up_reported, verify_positions, AssetCategory, ComputedPosition, DiscrepancyKind,
        ReportedPosition, VerificationSummary,
    };
    use chrono::NaiveDate;

    fn fd(s: &str) -> FixedDecimal {
        s.parse().unwrap()
    }

    fn computed(account: &str, symbol: &str, qty: &str, avg: &str) -> ComputedPosition {
        let quantity = fd(qty);
        let average_cost = fd(avg);
        ComputedPosition {
            account_id: account.to_string(),
            symbol: symbol.to_string(),
            quantity,
            total_cost: quantity.checked_mul(average_cost).unwrap(),
            average_cost,
            currency: "USD".to_string(),
            inception_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            lot_count: 1,
        }
    }

    fn reported(account: &str, symbol: &str, qty: &str, avg: &str) -> ReportedPosition {
        ReportedPosition {
            account_id: account.to_string(),
            symbol: symbol.to_string(),
            quantity: fd(qty),
            average_cost: fd(avg),
            currency: "USD".to_string(),
            category: AssetCategory::Stock,
        }
    }

    #[test]
    fn test_matching_positions_have_no_discrepancies() {
        let discrepancies = verify_positions(
            &[computed("U1", "AAPL", "3", "120")],
            &[reported("U1", "AAPL", "3", "120.000000")],
        );
        assert!(discrepancies.is_empty());
    }

    #[test]
    fn test_quantity_mismatch_has_no_tolerance() {
        let discrepancies = verify_positions(
            &[computed("U1", "AAPL", "3", "120")],
            &[reported("U1", "AAPL", "3.000001", "120")],
        );
        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].kind, DiscrepancyKind::QuantityMismatch);
        assert_eq!(discrepancies[0].computed, Some(fd("3")));
        assert_eq!(discrepancies[0].reported, Some(fd("3.000001")));
    }

    #[test]
    fn test_quantity_and_cost_mismatch_both_reported() {
        let discrepancies = verify_positions(
            &[computed("U1", "AAPL", "3", "120")],
            &[reported("U1", "AAPL", "4", "119.5")],
        );
        let kinds: Vec<DiscrepancyKind> = discrepancies.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiscrepancyKind::QuantityMismatch, DiscrepancyKind::CostBasisMismatch]
        );
        assert_eq!(discrepancies[1].computed, Some(fd("120")));
        assert_eq!(discrepancies[1].reported, Some(fd("119.5")));
    }

    #[test]
    fn test_one_sided_positions() {
        let discrepancies = verify_positions(
            &[computed("U1", "AAPL", "3", "120")],
            &[reported("U1", "MSFT", "2", "300")],
        );
        assert_eq!(discrepancies.len(), 2);
        assert_eq!(discrepancies[0].kind, DiscrepancyKind::ComputedOnly);
        assert_eq!(discrepancies[0].symbol, "AAPL");
        assert_eq!(discrepancies[0].reported, None);
        assert_eq!(discrepancies[1].kind, DiscrepancyKind::ReportedOnly);
        assert_eq!(discrepancies[1].symbol, "MSFT");
        assert_eq!(discrepancies[1].computed, None);
    }

    #[test]
    fn test_accounts_are_part_of_the_key() {
        let discrepancies = verify_positions(
            &[computed("U1", "AAPL", "3", "120")],
            &[reported("U2", "AAPL", "3", "120")],
        );
        let kinds: Vec<(&str, DiscrepancyKind)> = discrepancies
            .iter()
            .map(|d| (d.account_id.as_str(), d.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("U1", DiscrepancyKind::ComputedOnly),
                ("U2", DiscrepancyKind::ReportedOnly)
            ]
        );
    }

    #[test]
    fn test_duplicate_keys_keep_the_first_on_both_sides() {
        let discrepancies = verify_positions(
            &[
                computed("U1", "AAPL", "3", "120"),
                computed("U1", "AAPL", "7", "99"),
            ],
            &[
                reported("U1", "AAPL", "3", "120"),
                reported("U1", "AAPL", "8", "101"),
            ],
        );
        assert!(discrepancies.is_empty());

        let discrepancies = verify_positions(
            &[
                computed("U1", "AAPL", "7", "120"),
                computed("U1", "AAPL", "3", "120"),
            ],
            &[reported("U1", "AAPL", "3", "120")],
        );
        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].kind, DiscrepancyKind::QuantityMismatch);
        assert_eq!(discrepancies[0].computed, Some(fd("7")));
    }

    #[test]
    fn test_cash_positions_are_excluded() {
        let mut cash = reported("U1", "USD", "1500", "1");
        cash.category = AssetCategory::Cash;
        let discrepancies = verify_positions(&[computed("U1", "AAPL", "3", "120")], &[
            reported("U1", "AAPL", "3", "120"),
            cash,
        ]);
        assert!(discrepancies.is_empty());
    }

    #[test]
    fn test_roll_up_reported_reweights_cost() {
        let rolled = roll_up_reported(&[
            reported("U1", "AAPL", "1", "100"),
            reported("U2", "AAPL", "3", "200"),
            reported("U2", "MSFT", "2", "300"),
        ])
        .unwrap();
        assert_eq!(rolled.len(), 2);
        assert_eq!(rolled[0].account_id, "TOTAL");
        assert_eq!(rolled[0].symbol, "AAPL");
        assert_eq!(rolled[0].quantity, fd("4"));
        assert_eq!(rolled[0].average_cost, fd("175"));
        assert_eq!(rolled[1].symbol, "MSFT");

        let discrepancies =
            verify_positions(&[computed("TOTAL", "AAPL", "4", "175"), computed("TOTAL", "MSFT", "2", "300")], &rolled);
        assert!(discrepancies.is_empty());
    }

    #[test]
    fn test_roll_up_drops_netted_symbols() {
        let rolled = roll_up_reported(&[
            reported("U1", "TSLA", "2", "100"),
            reported("U2", "TSLA", "-2", "100"),
        ])
        .unwrap();
        assert!(rolled.is_empty());
    }

    #[test]
    fn test_summary_counts_by_kind() {
        let discrepancies = verify_positions(
            &[
                computed("U1", "AAPL", "3", "120"),
                computed("U1", "GOOG", "1", "140"),
            ],
            &[
                reported("U1", "AAPL", "4", "120"),
                reported("U1", "NVDA", "1", "900"),
            ],
        );
        let summary = VerificationSummary::from_discrepancies(&discrepancies);
        assert_eq!(summary.quantity_mismatches, 1);
        assert_eq!(summary.computed_only, 1);
        assert_eq!(summary.reported_only, 1);
        assert_eq!(summary.cost_basis_mismatches, 0);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_clean());
        assert!(VerificationSummary::default().is_clean());
    }
}
