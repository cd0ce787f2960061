#[cfg(test)]
mod tests {
    use crate::money::{FixedDecimal, Money};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn fd(s: &str) -> FixedDecimal {
        s.parse().unwrap()
    }

    // --- Parsing ---

    #[test]
    fn test_parse_pads_short_fraction() {
        let value = fd("12.5");
        assert_eq!(value.units(), 12);
        assert_eq!(value.micros(), 500_000);
        assert_eq!(value.total_micros(), 12_500_000);
    }

    #[test]
    fn test_parse_negative_keeps_sign_on_both_parts() {
        let value = fd("-3.25");
        assert_eq!(value.units(), -3);
        assert_eq!(value.micros(), -250_000);

        let small = fd("-0.000001");
        assert_eq!(small.units(), 0);
        assert_eq!(small.micros(), -1);
        assert!(small.is_negative());
    }

    #[test]
    fn test_parse_accepts_integers_and_plus_sign() {
        assert_eq!(fd("42"), FixedDecimal::from_units(42));
        assert_eq!(fd("+7.1"), fd("7.100000"));
        assert_eq!(fd(".5"), fd("0.5"));
        assert_eq!(fd("-0"), FixedDecimal::ZERO);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in ["", "-", "1.", "abc", "1.2.3", "1,000", "1.1234567", "1e5"] {
            assert!(
                input.parse::<FixedDecimal>().is_err(),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_whole_part() {
        assert!("99999999999999999999".parse::<FixedDecimal>().is_err());
        assert!("9300000000000".parse::<FixedDecimal>().is_err());
    }

    #[test]
    fn test_from_parts_rejects_sign_mismatch() {
        assert!(FixedDecimal::from_parts(1, -5).is_err());
        assert!(FixedDecimal::from_parts(-1, 5).is_err());
        assert!(FixedDecimal::from_parts(0, -5).is_ok());
        assert!(FixedDecimal::from_parts(3, 1_000_000).is_err());
    }

    // --- Formatting ---

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(fd("12.500000").to_string(), "12.5");
        assert_eq!(fd("100").to_string(), "100");
        assert_eq!(fd("-0.5").to_string(), "-0.5");
        assert_eq!(fd("0.000001").to_string(), "0.000001");
        assert_eq!(FixedDecimal::ZERO.to_string(), "0");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(fd("1234567.891").format_currency(), "$1,234,567.89");
        assert_eq!(fd("-1234.565").format_currency(), "-$1,234.57");
        assert_eq!(fd("0.004").format_currency(), "$0.00");
        assert_eq!(fd("999.995").format_currency(), "$1,000.00");
        assert_eq!(fd("12").format_currency(), "$12.00");
    }

    #[test]
    fn test_round_trip_through_display() {
        for input in ["0", "1", "-1", "0.1", "-0.000001", "123456.654321", "-987654.1"] {
            let value = fd(input);
            assert_eq!(fd(&value.to_string()), value, "round trip of {}", input);
        }
    }

    // --- Arithmetic ---

    #[test]
    fn test_checked_mul_splits_units_and_remainder() {
        assert_eq!(fd("-1.5").checked_mul(fd("2.25")), Some(fd("-3.375")));
        assert_eq!(fd("10").checked_mul(fd("100")), Some(fd("1000")));
        assert_eq!(fd("0.000001").checked_mul(fd("0.5")), Some(FixedDecimal::ZERO));
        assert_eq!(fd("-0.5").checked_mul(fd("-0.5")), Some(fd("0.25")));
    }

    #[test]
    fn test_checked_mul_handles_large_operands_without_widening() {
        // 5 million shares at 1.5 million per share overflows a naive
        // micros × micros product but not the decomposed one.
        let quantity = fd("5000000");
        let price = fd("1500000.25");
        assert_eq!(quantity.checked_mul(price), Some(fd("7500001250000")));
    }

    #[test]
    fn test_checked_mul_reports_overflow() {
        let huge = fd("9000000000000");
        assert_eq!(huge.checked_mul(fd("2")), None);
    }

    #[test]
    fn test_div_round_rounds_half_away_from_zero() {
        assert_eq!(fd("1").checked_div_round(fd("3")), Some(fd("0.333333")));
        assert_eq!(fd("2").checked_div_round(fd("3")), Some(fd("0.666667")));
        assert_eq!(fd("-2").checked_div_round(fd("3")), Some(fd("-0.666667")));
        assert_eq!(fd("0.000001").checked_div_round(fd("2")), Some(fd("0.000001")));
    }

    #[test]
    fn test_div_trunc_truncates() {
        assert_eq!(fd("2").checked_div_trunc(fd("3")), Some(fd("0.666666")));
        assert_eq!(fd("-2").checked_div_trunc(fd("3")), Some(fd("-0.666666")));
    }

    #[test]
    fn test_division_by_zero_is_unavailable() {
        assert_eq!(fd("1").checked_div_round(FixedDecimal::ZERO), None);
        assert_eq!(fd("1").checked_div_trunc(FixedDecimal::ZERO), None);
        assert_eq!(fd("1").checked_div_int_round(0), None);
    }

    #[test]
    fn test_add_sub_and_sum() {
        let values = [fd("1.1"), fd("2.2"), fd("-0.3")];
        let total: FixedDecimal = values.iter().sum();
        assert_eq!(total, fd("3"));
        assert_eq!(fd("1") - fd("1.000001"), fd("-0.000001"));
        assert_eq!(-fd("4.2"), fd("-4.2"));
    }

    #[test]
    fn test_operators_saturate_at_range_limits() {
        let max = FixedDecimal::from_total_micros(i64::MAX);
        let min = FixedDecimal::from_total_micros(i64::MIN);
        assert_eq!(max + fd("0.000001"), max);
        assert_eq!(min - fd("1"), min);
        assert_eq!(min + fd("-1"), min);
        assert_eq!(-min, max);
        assert_eq!((-min).total_micros(), i64::MAX);

        let total: FixedDecimal = [max, fd("5"), fd("-3")].iter().sum();
        assert_eq!(total, max - fd("3"));
        assert_eq!(max.checked_add(fd("0.000001")), None);
    }

    #[test]
    fn test_ordering_follows_value() {
        let mut values = vec![fd("1.5"), fd("-2"), fd("0"), fd("-0.5")];
        values.sort();
        assert_eq!(values, vec![fd("-2"), fd("-0.5"), fd("0"), fd("1.5")]);
    }

    // --- Interop ---

    #[test]
    fn test_decimal_conversions() {
        assert_eq!(Decimal::from(fd("12.34")), dec!(12.34));
        assert_eq!(FixedDecimal::try_from(dec!(-0.1234565)).unwrap(), fd("-0.123457"));
        assert_eq!(FixedDecimal::try_from(dec!(5)).unwrap(), fd("5"));
    }

    #[test]
    fn test_serde_accepts_strings_and_numbers() {
        let from_str: FixedDecimal = serde_json::from_str("\"1.25\"").unwrap();
        let from_int: FixedDecimal = serde_json::from_str("3").unwrap();
        let from_float: FixedDecimal = serde_json::from_str("0.1").unwrap();
        assert_eq!(from_str, fd("1.25"));
        assert_eq!(from_int, fd("3"));
        assert_eq!(from_float, fd("0.1"));
        assert_eq!(serde_json::to_string(&fd("1.50")).unwrap(), "\"1.5\"");
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(fd("10.5"), "EUR");
        assert_eq!(money.to_string(), "10.5 EUR");
        assert!(money.is_currency("eur"));
    }
}
