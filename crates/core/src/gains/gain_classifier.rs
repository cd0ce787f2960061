use chrono::NaiveDate;
use log::debug;

use super::gains_model::{HoldingPeriod, LotGain, PriceScale, RealizedGain};
use crate::errors::{CalculatorError, Result};
use crate::fx::CurrencyConverterTrait;
use crate::lots::{LotDisposal, TaxLot};
use crate::money::{FixedDecimal, Money};
use crate::settings::CoreSettings;
use crate::utils::time_utils::days_between;

fn overflow(context: &str, symbol: &str) -> CalculatorError {
    CalculatorError::Overflow(format!("{} for {}", context, symbol))
}

/// Classifies an open lot and computes its unrealized gain.
///
/// Both prices must already be in the same (reporting) currency.
/// `unrealized = (market_price - cost_price) × quantity`, divided by 100
/// for percent-of-face instruments.
pub fn classify_lot(
    lot: &TaxLot,
    as_of: NaiveDate,
    market_price: FixedDecimal,
    cost_price: FixedDecimal,
    scale: PriceScale,
    threshold_days: i64,
) -> Result<LotGain> {
    let days_held = days_between(lot.open_date, as_of);
    let holding_period = HoldingPeriod::from_days(days_held, threshold_days);

    let unrealized = market_price
        .checked_sub(cost_price)
        .and_then(|diff| scale.amount(diff, lot.quantity))
        .ok_or_else(|| overflow("unrealized gain", &lot.symbol))?;
    let market_value = scale.amount(market_price, lot.quantity)
        .ok_or_else(|| overflow("market value", &lot.symbol))?;
    let cost_basis = scale.amount(cost_price, lot.quantity)
        .ok_or_else(|| overflow("cost basis", &lot.symbol))?;

    Ok(LotGain {
        lot_id: lot.id.clone(),
        account_id: lot.account_id.clone(),
        symbol: lot.symbol.clone(),
        holding_period,
        days_held,
        quantity: lot.quantity,
        cost_price,
        market_price,
        market_value,
        cost_basis,
        unrealized,
    })
}

/// Classifies a closed lot portion by the days between open and close.
pub fn classify_disposal(
    disposal: &LotDisposal,
    cost_price: FixedDecimal,
    sale_price: FixedDecimal,
    scale: PriceScale,
    threshold_days: i64,
) -> Result<RealizedGain> {
    let days_held = days_between(disposal.open_date, disposal.close_date);
    let holding_period = HoldingPeriod::from_days(days_held, threshold_days);

    let realized = sale_price
        .checked_sub(cost_price)
        .and_then(|diff| scale.amount(diff, disposal.quantity))
        .ok_or_else(|| overflow("realized gain", &disposal.symbol))?;
    let proceeds = scale.amount(sale_price, disposal.quantity)
        .ok_or_else(|| overflow("proceeds", &disposal.symbol))?;
    let cost_basis = scale.amount(cost_price, disposal.quantity)
        .ok_or_else(|| overflow("cost basis", &disposal.symbol))?;

    Ok(RealizedGain {
        lot_id: disposal.lot_id.clone(),
        sell_trade_id: disposal.sell_trade_id.clone(),
        account_id: disposal.account_id.clone(),
        symbol: disposal.symbol.clone(),
        holding_period,
        days_held,
        quantity: disposal.quantity,
        proceeds,
        cost_basis,
        realized,
    })
}

/// Values lots in the reporting currency before classifying them.
///
/// Cost prices convert at the rate of the lot's open date (latest rate when
/// that day has none). Market prices convert at the latest rate. Sale prices
/// convert at the rate of the close date.
pub struct LotValuator<'a> {
    converter: &'a dyn CurrencyConverterTrait,
    threshold_days: i64,
}

impl<'a> LotValuator<'a> {
    pub fn new(converter: &'a dyn CurrencyConverterTrait, threshold_days: i64) -> Self {
        Self {
            converter,
            threshold_days,
        }
    }

    pub fn from_settings(
        converter: &'a dyn CurrencyConverterTrait,
        settings: &CoreSettings,
    ) -> Self {
        Self::new(converter, settings.long_term_threshold_days)
    }

    pub fn reporting_currency(&self) -> &str {
        self.converter.reporting_currency()
    }

    pub fn cost_price(&self, lot: &TaxLot) -> Option<FixedDecimal> {
        self.converter
            .convert_to_reporting_on(&Money::new(lot.cost_price, &lot.currency), lot.open_date)
            .map(|money| money.amount)
    }

    pub fn market_price(&self, price: &Money) -> Option<FixedDecimal> {
        self.converter
            .convert_to_reporting(price)
            .map(|money| money.amount)
    }

    /// Remaining cost of the lot in the reporting currency.
    pub fn cost_basis(&self, lot: &TaxLot, scale: PriceScale) -> Result<Option<FixedDecimal>> {
        let Some(cost) = self.cost_price(lot) else {
            return Ok(None);
        };
        scale.amount(cost, lot.quantity)
            .map(Some)
            .ok_or_else(|| overflow("cost basis", &lot.symbol).into())
    }

    /// `Ok(None)` when either price cannot be converted.
    pub fn value_lot(
        &self,
        lot: &TaxLot,
        market_price: &Money,
        scale: PriceScale,
        as_of: NaiveDate,
    ) -> Result<Option<LotGain>> {
        let (Some(cost), Some(market)) = (self.cost_price(lot), self.market_price(market_price))
        else {
            debug!(
                "Lot {} of {} cannot be valued in {}",
                lot.id,
                lot.symbol,
                self.reporting_currency()
            );
            return Ok(None);
        };
        classify_lot(lot, as_of, market, cost, scale, self.threshold_days).map(Some)
    }

    /// `Ok(None)` when either price cannot be converted.
    pub fn value_disposal(
        &self,
        disposal: &LotDisposal,
        scale: PriceScale,
    ) -> Result<Option<RealizedGain>> {
        let cost = self
            .converter
            .convert_to_reporting_on(
                &Money::new(disposal.cost_price, &disposal.currency),
                disposal.open_date,
            )
            .map(|money| money.amount);
        let sale = self
            .converter
            .convert_to_reporting_on(
                &Money::new(disposal.sale_price, &disposal.sale_currency),
                disposal.close_date,
            )
            .map(|money| money.amount);
        let (Some(cost), Some(sale)) = (cost, sale) else {
            debug!(
                "Disposal of lot {} by {} cannot be valued in {}",
                disposal.lot_id,
                disposal.sell_trade_id,
                self.reporting_currency()
            );
            return Ok(None);
        };
        classify_disposal(disposal, cost, sale, scale, self.threshold_days).map(Some)
    }
}
