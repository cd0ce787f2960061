use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{CalculatorError, Result, ValidationError};
use crate::money::FixedDecimal;

/// Direction of an executed order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = ();

    /// Accepts the side tags brokerage statements use (`BUY`/`BOT`/`B`, `SELL`/`SLD`/`S`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "BOT" | "B" => Ok(TradeSide::Buy),
            "SELL" | "SLD" | "S" => Ok(TradeSide::Sell),
            _ => Err(()),
        }
    }
}

/// An executed order as delivered by the statement parser.
///
/// `side` keeps the raw tag from the statement; it is parsed when the trade
/// is matched so an unrecognized tag surfaces as `InvalidTradeSide` for that
/// trade. Buy quantities are positive. Sells may be reported negative or
/// unsigned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub account_id: String,
    pub symbol: String,
    pub side: String,
    pub trade_date: NaiveDate,
    pub quantity: FixedDecimal,
    pub price: FixedDecimal,
    pub currency: String,
}

impl Trade {
    /// Parsed trade direction.
    pub fn side(&self) -> Result<TradeSide> {
        TradeSide::from_str(&self.side).map_err(|_| {
            CalculatorError::InvalidTradeSide {
                trade_id: self.id.clone(),
            }
            .into()
        })
    }

    /// Parses the side and checks the quantity sign agrees with it.
    /// Returns the side with the unsigned quantity.
    pub fn signed_side(&self) -> Result<(TradeSide, FixedDecimal)> {
        let side = self.side()?;
        if side == TradeSide::Buy && self.quantity.is_negative() {
            return Err(CalculatorError::InvalidTrade {
                trade_id: self.id.clone(),
                reason: format!("buy with negative quantity {}", self.quantity),
            }
            .into());
        }
        Ok((side, self.quantity.abs()))
    }

    /// Signed quantity: positive for buys, negative for sells.
    pub fn position_delta(&self) -> Result<FixedDecimal> {
        let (side, quantity) = self.signed_side()?;
        Ok(match side {
            TradeSide::Buy => quantity,
            TradeSide::Sell => -quantity,
        })
    }
}

/// Parses a statement trade date in either `YYYY-MM-DD` or `YYYYMMDD` form.
pub fn parse_trade_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    let format = if trimmed.contains('-') {
        "%Y-%m-%d"
    } else {
        "%Y%m%d"
    };
    NaiveDate::parse_from_str(trimmed, format).map_err(|source| {
        ValidationError::InvalidDate {
            input: input.to_string(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn trade(side: &str, quantity: &str) -> Trade {
        Trade {
            id: "T-1".to_string(),
            account_id: "U1".to_string(),
            symbol: "AAPL".to_string(),
            side: side.to_string(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            quantity: quantity.parse().unwrap(),
            price: "100".parse().unwrap(),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_side_tags() {
        assert_eq!("buy".parse::<TradeSide>(), Ok(TradeSide::Buy));
        assert_eq!(" BOT ".parse::<TradeSide>(), Ok(TradeSide::Buy));
        assert_eq!("SLD".parse::<TradeSide>(), Ok(TradeSide::Sell));
        assert!("TRANSFER".parse::<TradeSide>().is_err());
    }

    #[test]
    fn test_unknown_side_is_invalid_trade_side() {
        let err = trade("SPLIT", "10").side().unwrap_err();
        assert!(matches!(
            err,
            Error::Calculation(CalculatorError::InvalidTradeSide { ref trade_id }) if trade_id == "T-1"
        ));
    }

    #[test]
    fn test_sell_accepts_signed_and_unsigned_quantity() {
        let negative = trade("SELL", "-5").position_delta().unwrap();
        let unsigned = trade("SELL", "5").position_delta().unwrap();
        assert_eq!(negative, "-5".parse().unwrap());
        assert_eq!(unsigned, negative);
    }

    #[test]
    fn test_negative_buy_is_rejected() {
        let err = trade("BUY", "-5").signed_side().unwrap_err();
        assert!(matches!(
            err,
            Error::Calculation(CalculatorError::InvalidTrade { .. })
        ));
    }

    #[test]
    fn test_parse_trade_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_trade_date("2024-06-01").unwrap(), expected);
        assert_eq!(parse_trade_date("20240601").unwrap(), expected);
        let err = parse_trade_date("2024-13-01").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidDate { .. })
        ));
    }
}
