use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::constants::{DECIMAL_PRECISION, DISPLAY_DECIMAL_PRECISION, MICROS_PER_UNIT};
use crate::errors::ValidationError;

/// Signed fixed-point value with six fractional digits.
///
/// Stored as a whole-unit part and a micro-unit remainder. Both parts carry
/// the same sign (or zero) and `|micros| < 1_000_000`, so every value has
/// exactly one representation and the derived equality is value equality.
///
/// The operators (`+`, `-`, unary `-` and `Sum`) saturate at the range of
/// an `i64` micro-unit count. Use the `checked_*` methods where overflow
/// must be reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FixedDecimal {
    units: i64,
    micros: i32,
}

impl FixedDecimal {
    pub const ZERO: FixedDecimal = FixedDecimal {
        units: 0,
        micros: 0,
    };

    pub const ONE: FixedDecimal = FixedDecimal {
        units: 1,
        micros: 0,
    };

    /// Builds a value from its whole-unit and micro-unit parts.
    pub fn from_parts(units: i64, micros: i32) -> Result<Self, ValidationError> {
        let input = format!("({}, {})", units, micros);
        if i64::from(micros).abs() >= MICROS_PER_UNIT {
            return Err(invalid(&input, "micro-unit part must be below one million"));
        }
        if (units > 0 && micros < 0) || (units < 0 && micros > 0) {
            return Err(invalid(&input, "unit and micro-unit parts have opposite signs"));
        }
        units
            .checked_mul(MICROS_PER_UNIT)
            .and_then(|scaled| scaled.checked_add(i64::from(micros)))
            .ok_or_else(|| invalid(&input, "value is out of range"))?;
        Ok(FixedDecimal { units, micros })
    }

    pub fn from_units(units: i64) -> Self {
        Self::from_total_micros(units.saturating_mul(MICROS_PER_UNIT))
    }

    /// Splits a single micro-unit count into the normalized pair.
    pub fn from_total_micros(total: i64) -> Self {
        FixedDecimal {
            units: total / MICROS_PER_UNIT,
            micros: (total % MICROS_PER_UNIT) as i32,
        }
    }

    /// Combined value in micro-units.
    pub fn total_micros(&self) -> i64 {
        self.units * MICROS_PER_UNIT + i64::from(self.micros)
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn micros(&self) -> i32 {
        self.micros
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0 && self.micros == 0
    }

    pub fn is_positive(&self) -> bool {
        self.units > 0 || self.micros > 0
    }

    pub fn is_negative(&self) -> bool {
        self.units < 0 || self.micros < 0
    }

    pub fn abs(&self) -> Self {
        Self::from_total_micros(self.total_micros().saturating_abs())
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.total_micros()
            .checked_add(rhs.total_micros())
            .map(Self::from_total_micros)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.total_micros()
            .checked_sub(rhs.total_micros())
            .map(Self::from_total_micros)
    }

    /// Multiplies two fixed-point values without widening.
    ///
    /// Each operand is split into whole units and remainder before
    /// multiplying, so the only product that needs rescaling is
    /// remainder × remainder, which is below 10^12. The result is truncated
    /// toward zero at the sixth fractional digit.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let a_units = self.units;
        let a_rem = i64::from(self.micros);
        let b_units = rhs.units;
        let b_rem = i64::from(rhs.micros);

        let whole = a_units.checked_mul(b_units)?.checked_mul(MICROS_PER_UNIT)?;
        let cross = a_units
            .checked_mul(b_rem)?
            .checked_add(a_rem.checked_mul(b_units)?)?;
        let fractional = a_rem * b_rem / MICROS_PER_UNIT;

        whole
            .checked_add(cross)?
            .checked_add(fractional)
            .map(Self::from_total_micros)
    }

    /// Divides, rounding half away from zero. `None` on a zero divisor or overflow.
    pub fn checked_div_round(self, rhs: Self) -> Option<Self> {
        let (numerator, denominator) = self.scaled_quotient_parts(rhs)?;
        let mut quotient = numerator / denominator;
        let remainder = numerator % denominator;
        if remainder.abs() * 2 >= denominator.abs() {
            if (numerator < 0) == (denominator < 0) {
                quotient += 1;
            } else {
                quotient -= 1;
            }
        }
        i64::try_from(quotient).ok().map(Self::from_total_micros)
    }

    /// Divides, truncating toward zero. `None` on a zero divisor or overflow.
    pub fn checked_div_trunc(self, rhs: Self) -> Option<Self> {
        let (numerator, denominator) = self.scaled_quotient_parts(rhs)?;
        i64::try_from(numerator / denominator)
            .ok()
            .map(Self::from_total_micros)
    }

    /// Divides by a plain integer, rounding half away from zero.
    pub fn checked_div_int_round(self, rhs: i64) -> Option<Self> {
        self.checked_div_round(Self::from_units(rhs))
    }

    fn scaled_quotient_parts(self, rhs: Self) -> Option<(i128, i128)> {
        if rhs.is_zero() {
            return None;
        }
        let numerator = i128::from(self.total_micros()) * i128::from(MICROS_PER_UNIT);
        Some((numerator, i128::from(rhs.total_micros())))
    }

    /// Rounds to `dp` fractional digits, half away from zero.
    pub fn round_dp(&self, dp: u32) -> Self {
        if dp >= DECIMAL_PRECISION {
            return *self;
        }
        let step = 10_i64.pow(DECIMAL_PRECISION - dp);
        let total = self.total_micros();
        let mut steps = total / step;
        if (total % step).abs() * 2 >= step {
            steps += total.signum();
        }
        Self::from_total_micros(steps.saturating_mul(step))
    }

    /// Renders as a currency amount: two decimals, thousands separators and
    /// a `$` / `-$` prefix.
    pub fn format_currency(&self) -> String {
        let rounded = self.round_dp(DISPLAY_DECIMAL_PRECISION);
        let total = rounded.total_micros();
        let cents = total.unsigned_abs() / 10_u64.pow(DECIMAL_PRECISION - DISPLAY_DECIMAL_PRECISION);
        let whole = group_thousands(cents / 100);
        let sign = if total < 0 { "-$" } else { "$" };
        format!("{}{}.{:02}", sign, whole, cents % 100)
    }
}

fn invalid(input: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidDecimal {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

impl FromStr for FixedDecimal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (whole, fraction) = match body.split_once('.') {
            Some((whole, fraction)) => {
                if fraction.is_empty() {
                    return Err(invalid(s, "missing digits after the decimal point"));
                }
                (whole, fraction)
            }
            None => (body, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid(s, "no digits"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid(s, "unexpected character"));
        }
        if fraction.len() > DECIMAL_PRECISION as usize {
            return Err(invalid(s, "more than 6 fractional digits"));
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| invalid(s, "whole part is out of range"))?
        };
        let micros: i32 = if fraction.is_empty() {
            0
        } else {
            format!("{:0<6}", fraction)
                .parse()
                .map_err(|_| invalid(s, "fractional part is malformed"))?
        };

        if negative {
            FixedDecimal::from_parts(-units, -micros)
        } else {
            FixedDecimal::from_parts(units, micros)
        }
        .map_err(|_| invalid(s, "value is out of range"))
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_micros();
        let magnitude = total.unsigned_abs();
        let per_unit = MICROS_PER_UNIT as u64;
        let sign = if total < 0 { "-" } else { "" };
        let whole = magnitude / per_unit;
        let fraction = magnitude % per_unit;
        if fraction == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let digits = format!("{:06}", fraction);
            write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
        }
    }
}

impl PartialOrd for FixedDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FixedDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_micros().cmp(&other.total_micros())
    }
}

impl Add for FixedDecimal {
    type Output = FixedDecimal;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).unwrap_or_else(|| saturated(rhs.is_positive()))
    }
}

impl AddAssign for FixedDecimal {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for FixedDecimal {
    type Output = FixedDecimal;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs).unwrap_or_else(|| saturated(rhs.is_negative()))
    }
}

impl SubAssign for FixedDecimal {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for FixedDecimal {
    type Output = FixedDecimal;

    fn neg(self) -> Self::Output {
        Self::from_total_micros(self.total_micros().saturating_neg())
    }
}

fn saturated(upward: bool) -> FixedDecimal {
    FixedDecimal::from_total_micros(if upward { i64::MAX } else { i64::MIN })
}

impl Sum for FixedDecimal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FixedDecimal::ZERO, |acc, value| acc + value)
    }
}

impl<'a> Sum<&'a FixedDecimal> for FixedDecimal {
    fn sum<I: Iterator<Item = &'a FixedDecimal>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<FixedDecimal> for Decimal {
    fn from(value: FixedDecimal) -> Self {
        Decimal::new(value.total_micros(), DECIMAL_PRECISION).normalize()
    }
}

impl TryFrom<Decimal> for FixedDecimal {
    type Error = ValidationError;

    /// Values with more than six fractional digits are rounded half away from zero.
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let mut rounded =
            value.round_dp_with_strategy(DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(DECIMAL_PRECISION);
        i64::try_from(rounded.mantissa())
            .map(FixedDecimal::from_total_micros)
            .map_err(|_| invalid(&value.to_string(), "value is out of range"))
    }
}

impl Serialize for FixedDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixedDecimalRepr {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl<'de> Deserialize<'de> for FixedDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match FixedDecimalRepr::deserialize(deserializer)? {
            FixedDecimalRepr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            FixedDecimalRepr::Integer(units) => FixedDecimal::from_parts(units, 0)
                .map_err(serde::de::Error::custom),
            FixedDecimalRepr::Float(value) => Decimal::from_f64_retain(value)
                .ok_or_else(|| serde::de::Error::custom(format!("{} is not a finite number", value)))
                .and_then(|decimal| {
                    FixedDecimal::try_from(decimal).map_err(serde::de::Error::custom)
                }),
        }
    }
}
