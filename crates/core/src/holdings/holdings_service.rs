use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::holdings_model::{
    ClassificationTable, HoldingOverview, HoldingWarning, HoldingWarningKind, HoldingsReport,
};
use crate::constants::PORTFOLIO_TOTAL_ACCOUNT_ID;
use crate::errors::{CalculatorError, Error, Result};
use crate::fx::CurrencyConverterTrait;
use crate::gains::{GainSplit, LotGain, LotValuator, PriceScale, RealizedGain};
use crate::lots::{FifoLotMatcher, LotDisposal, TaxLot};
use crate::money::{FixedDecimal, Money};
use crate::positions::{reduce_lots, ComputedPosition};
use crate::settings::{AggregationKey, CoreSettings};
use crate::trades::Trade;

type GroupKey = (String, String);

fn overflow(context: &str, symbol: &str) -> CalculatorError {
    CalculatorError::Overflow(format!("{} for {}", context, symbol))
}

/// Builds holding overviews from lots, disposals and market prices.
pub struct HoldingsService {
    converter: Arc<dyn CurrencyConverterTrait>,
    classifications: ClassificationTable,
    settings: CoreSettings,
}

impl HoldingsService {
    pub fn new(
        converter: Arc<dyn CurrencyConverterTrait>,
        classifications: ClassificationTable,
        settings: CoreSettings,
    ) -> Self {
        Self {
            converter,
            classifications,
            settings,
        }
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    /// Matches `trades` into lots and builds overviews as of the configured date.
    ///
    /// Queues abandoned by the lot matcher show up as `UnmatchedSell` warnings.
    pub fn build_from_trades(
        &self,
        trades: &[Trade],
        prices: &HashMap<String, Money>,
    ) -> Result<HoldingsReport> {
        let matched = FifoLotMatcher::from_settings(&self.settings).match_trades(trades)?;
        let mut report = self.build_overviews(
            &matched.lots,
            &matched.disposals,
            prices,
            self.settings.as_of(),
        )?;

        let unmatched = matched.warnings.iter().map(|w| HoldingWarning {
            kind: HoldingWarningKind::UnmatchedSell,
            account_id: w.account_id.clone(),
            symbol: w.symbol.clone(),
            message: format!("trade {}: {}", w.trade_id, w.error),
        });
        report.warnings.splice(0..0, unmatched);
        Ok(report)
    }

    /// One overview per position under the configured aggregation key.
    ///
    /// Groups with no open lots but with disposals appear as zero-quantity
    /// overviews carrying their realized gain. A missing price or rate
    /// leaves the dependent fields `None` and adds a warning. A group whose
    /// lots span several currencies is skipped with a `CurrencyMismatch`
    /// warning.
    pub fn build_overviews(
        &self,
        lots: &[TaxLot],
        disposals: &[LotDisposal],
        prices: &HashMap<String, Money>,
        as_of: NaiveDate,
    ) -> Result<HoldingsReport> {
        debug!(
            "Building holding overviews for {} lots and {} disposals as of {}",
            lots.len(),
            disposals.len(),
            as_of
        );

        let mut lots_by_key: BTreeMap<GroupKey, Vec<&TaxLot>> = BTreeMap::new();
        for lot in lots {
            lots_by_key
                .entry(self.group_key(&lot.symbol, &lot.account_id))
                .or_default()
                .push(lot);
        }
        let mut disposals_by_key: BTreeMap<GroupKey, Vec<&LotDisposal>> = BTreeMap::new();
        for disposal in disposals {
            disposals_by_key
                .entry(self.group_key(&disposal.symbol, &disposal.account_id))
                .or_default()
                .push(disposal);
        }

        let keys: BTreeSet<GroupKey> = lots_by_key
            .keys()
            .chain(disposals_by_key.keys())
            .cloned()
            .collect();

        let valuator = LotValuator::from_settings(self.converter.as_ref(), &self.settings);
        let mut overviews = Vec::with_capacity(keys.len());
        let mut warnings = Vec::new();

        for key in keys {
            let group_lots = lots_by_key.remove(&key).unwrap_or_default();
            let group_disposals = disposals_by_key.remove(&key).unwrap_or_default();
            let (symbol, account_id) = key;

            let position = match reduce_lots(symbol.clone(), account_id.clone(), &group_lots) {
                Ok(position) => position,
                Err(Error::Calculation(err @ CalculatorError::CurrencyMismatch { .. })) => {
                    warnings.push(HoldingWarning {
                        kind: HoldingWarningKind::CurrencyMismatch,
                        account_id: Some(account_id.clone()),
                        symbol: symbol.clone(),
                        message: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };

            let mut builder = OverviewBuilder {
                valuator: &valuator,
                scale: self.classifications.price_scale(&symbol),
                symbol: &symbol,
                account_id: &account_id,
                fx_missing: false,
            };

            let realized = builder.realized(&group_disposals)?;
            let price = prices.get(&symbol);

            let mut overview = match position {
                Some(position) => {
                    let cost_basis_local = builder.local_cost_basis(&group_lots)?;
                    let cost_basis = builder.cost_basis(&group_lots)?;
                    let unrealized = match price {
                        Some(price) => builder.unrealized(&group_lots, price, as_of)?,
                        None => {
                            warnings.push(HoldingWarning {
                                kind: HoldingWarningKind::MissingPrice,
                                account_id: Some(account_id.clone()),
                                symbol: symbol.clone(),
                                message: "no market price available".to_string(),
                            });
                            None
                        }
                    };
                    self.open_overview(position, cost_basis_local, cost_basis, unrealized, as_of)
                }
                None => {
                    let local_currency = group_disposals
                        .first()
                        .map(|d| d.currency.clone())
                        .unwrap_or_default();
                    self.closed_overview(&symbol, &account_id, local_currency, as_of)
                }
            };

            if builder.fx_missing {
                warnings.push(HoldingWarning {
                    kind: HoldingWarningKind::MissingFxRate,
                    account_id: Some(account_id.clone()),
                    symbol: symbol.clone(),
                    message: format!(
                        "no exchange rate to {} for some amounts",
                        self.converter.reporting_currency()
                    ),
                });
            }

            overview.market_price = price.cloned();
            overview.realized_split = realized;
            overview.realized_gain = realized.and_then(|split| split.total());
            overview.total_gain = match (overview.unrealized_gain, overview.realized_gain) {
                (Some(unrealized), Some(realized)) => Some(
                    unrealized
                        .checked_add(realized)
                        .ok_or_else(|| overflow("total gain", &symbol))?,
                ),
                _ => None,
            };
            overviews.push(overview);
        }

        assign_weights(&mut overviews);
        for warning in &warnings {
            warn!("Holding overview incomplete: {}", warning);
        }
        debug!(
            "Built {} holding overviews with {} warnings",
            overviews.len(),
            warnings.len()
        );

        Ok(HoldingsReport {
            reporting_currency: self.converter.reporting_currency().to_string(),
            as_of_date: as_of,
            overviews,
            warnings,
        })
    }

    fn group_key(&self, symbol: &str, account_id: &str) -> GroupKey {
        match self.settings.aggregation_key {
            AggregationKey::Symbol => (symbol.to_string(), PORTFOLIO_TOTAL_ACCOUNT_ID.to_string()),
            AggregationKey::SymbolAndAccount => (symbol.to_string(), account_id.to_string()),
        }
    }

    fn open_overview(
        &self,
        position: ComputedPosition,
        cost_basis_local: FixedDecimal,
        cost_basis: Option<FixedDecimal>,
        unrealized: Option<Valuation>,
        as_of: NaiveDate,
    ) -> HoldingOverview {
        HoldingOverview {
            classification: self.classifications.get(&position.symbol).cloned(),
            account_id: position.account_id,
            symbol: position.symbol,
            quantity: position.quantity,
            local_currency: position.currency,
            average_cost_local: position.average_cost,
            cost_basis_local,
            inception_date: Some(position.inception_date),
            lot_count: position.lot_count,
            reporting_currency: self.converter.reporting_currency().to_string(),
            market_price: None,
            market_value: unrealized.map(|v| v.market_value),
            cost_basis,
            unrealized_gain: unrealized.and_then(|v| v.split.total()),
            unrealized_split: unrealized.map(|v| v.split),
            realized_gain: None,
            realized_split: None,
            total_gain: None,
            weight: None,
            as_of_date: as_of,
        }
    }

    fn closed_overview(
        &self,
        symbol: &str,
        account_id: &str,
        local_currency: String,
        as_of: NaiveDate,
    ) -> HoldingOverview {
        HoldingOverview {
            account_id: account_id.to_string(),
            symbol: symbol.to_string(),
            classification: self.classifications.get(symbol).cloned(),
            quantity: FixedDecimal::ZERO,
            local_currency,
            average_cost_local: FixedDecimal::ZERO,
            cost_basis_local: FixedDecimal::ZERO,
            inception_date: None,
            lot_count: 0,
            reporting_currency: self.converter.reporting_currency().to_string(),
            market_price: None,
            market_value: Some(FixedDecimal::ZERO),
            cost_basis: Some(FixedDecimal::ZERO),
            unrealized_gain: Some(FixedDecimal::ZERO),
            unrealized_split: Some(GainSplit::default()),
            realized_gain: None,
            realized_split: None,
            total_gain: None,
            weight: None,
            as_of_date: as_of,
        }
    }
}

/// Market value and unrealized split of a fully valued group.
#[derive(Clone, Copy)]
struct Valuation {
    market_value: FixedDecimal,
    split: GainSplit,
}

/// Values one group, remembering whether any conversion was unavailable.
struct OverviewBuilder<'v, 'a> {
    valuator: &'v LotValuator<'a>,
    scale: PriceScale,
    symbol: &'v str,
    account_id: &'v str,
    fx_missing: bool,
}

impl OverviewBuilder<'_, '_> {
    /// Remaining cost in the lots' own currency, under the price scale.
    fn local_cost_basis(&self, lots: &[&TaxLot]) -> Result<FixedDecimal> {
        lots.iter()
            .try_fold(FixedDecimal::ZERO, |acc, lot| {
                self.scale
                    .amount(lot.cost_price, lot.quantity)
                    .and_then(|cost| acc.checked_add(cost))
            })
            .ok_or_else(|| overflow("local cost basis", self.symbol).into())
    }

    fn cost_basis(&mut self, lots: &[&TaxLot]) -> Result<Option<FixedDecimal>> {
        let mut total = FixedDecimal::ZERO;
        for lot in lots {
            let Some(cost) = self.valuator.cost_basis(lot, self.scale)? else {
                self.fx_missing = true;
                return Ok(None);
            };
            total = total
                .checked_add(cost)
                .ok_or_else(|| overflow("cost basis", self.symbol))?;
        }
        Ok(Some(total))
    }

    fn unrealized(
        &mut self,
        lots: &[&TaxLot],
        price: &Money,
        as_of: NaiveDate,
    ) -> Result<Option<Valuation>> {
        let mut gains: Vec<LotGain> = Vec::with_capacity(lots.len());
        for lot in lots {
            match self.valuator.value_lot(lot, price, self.scale, as_of)? {
                Some(gain) => gains.push(gain),
                None => {
                    self.fx_missing = true;
                    return Ok(None);
                }
            }
        }
        let market_value = gains
            .iter()
            .try_fold(FixedDecimal::ZERO, |acc, g| acc.checked_add(g.market_value))
            .ok_or_else(|| overflow("market value", self.symbol))?;
        let split = GainSplit::from_lot_gains(&gains)
            .ok_or_else(|| overflow("unrealized gain", self.symbol))?;
        Ok(Some(Valuation {
            market_value,
            split,
        }))
    }

    fn realized(&mut self, disposals: &[&LotDisposal]) -> Result<Option<GainSplit>> {
        let mut gains: Vec<RealizedGain> = Vec::with_capacity(disposals.len());
        for disposal in disposals {
            match self.valuator.value_disposal(disposal, self.scale)? {
                Some(gain) => gains.push(gain),
                None => {
                    debug!(
                        "Realized gain of {}/{} unavailable",
                        self.account_id, self.symbol
                    );
                    self.fx_missing = true;
                    return Ok(None);
                }
            }
        }
        GainSplit::from_realized_gains(&gains)
            .map(Some)
            .ok_or_else(|| overflow("realized gain", self.symbol).into())
    }
}

/// Sets each valued overview's share of the total market value.
fn assign_weights(overviews: &mut [HoldingOverview]) {
    let total = overviews
        .iter()
        .filter_map(|o| o.market_value)
        .try_fold(FixedDecimal::ZERO, |acc, value| acc.checked_add(value));
    let Some(total) = total.filter(|t| !t.is_zero()) else {
        return;
    };
    for overview in overviews.iter_mut() {
        overview.weight = overview
            .market_value
            .and_then(|value| value.checked_div_round(total));
    }
}
