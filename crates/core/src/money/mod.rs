//! Fixed-point money and quantity arithmetic.

mod fixed_decimal;
mod money_model;

pub use fixed_decimal::FixedDecimal;
pub use money_model::Money;

#[cfg(test)]
mod fixed_decimal_tests;
