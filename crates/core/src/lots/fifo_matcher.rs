use chrono::NaiveDate;
use log::{debug, error, warn};
use std::collections::{BTreeMap, VecDeque};

use crate::errors::{CalculatorError, Result};
use crate::lots::{LotDisposal, LotMatchResult, LotMatchWarning, TaxLot};
use crate::money::FixedDecimal;
use crate::settings::{CoreSettings, InsufficientLotsPolicy, LotGrouping};
use crate::trades::{Trade, TradeSide};

/// Identity of one FIFO queue.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct LotQueueKey {
    symbol: String,
    account_id: Option<String>,
}

/// State of a single queue once its trades are consumed.
#[derive(Default)]
struct QueueOutcome {
    lots: VecDeque<TaxLot>,
    disposals: Vec<LotDisposal>,
    shortfall: Option<LotMatchWarning>,
}

/// Matches sells against the oldest open buys.
#[derive(Debug, Clone, Copy)]
pub struct FifoLotMatcher {
    grouping: LotGrouping,
    policy: InsufficientLotsPolicy,
}

impl FifoLotMatcher {
    pub fn new(grouping: LotGrouping, policy: InsufficientLotsPolicy) -> Self {
        Self { grouping, policy }
    }

    pub fn from_settings(settings: &CoreSettings) -> Self {
        Self::new(settings.lot_grouping, settings.insufficient_lots_policy)
    }

    /// Turns an unordered trade list into open lots and closed portions.
    ///
    /// Trades are grouped into queues, ordered by (trade date, trade id) and
    /// replayed. Invalid trades always abort the pass. An uncovered sell
    /// aborts it under `FailFast`; under `IsolateSymbol` only the affected
    /// queue stops and the condition is returned as a warning.
    pub fn match_trades(&self, trades: &[Trade]) -> Result<LotMatchResult> {
        let queues = self.group_trades(trades);
        debug!(
            "Matching {} trades across {} FIFO queues",
            trades.len(),
            queues.len()
        );

        let mut result = LotMatchResult::default();
        for (key, mut queue_trades) in queues {
            queue_trades.sort_by(|a, b| {
                a.trade_date
                    .cmp(&b.trade_date)
                    .then_with(|| a.id.cmp(&b.id))
            });

            let outcome = Self::replay_queue(&key, &queue_trades)?;
            if let Some(warning) = outcome.shortfall {
                match self.policy {
                    InsufficientLotsPolicy::FailFast => {
                        error!("Aborting lot matching: {}", warning);
                        return Err(warning.error.into());
                    }
                    InsufficientLotsPolicy::IsolateSymbol => {
                        warn!("Skipping remaining trades of queue: {}", warning);
                        result.warnings.push(warning);
                    }
                }
            }
            result.lots.extend(outcome.lots);
            result.disposals.extend(outcome.disposals);
        }

        result.lots.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then_with(|| a.open_date.cmp(&b.open_date))
                .then_with(|| a.account_id.cmp(&b.account_id))
                .then_with(|| a.id.cmp(&b.id))
        });
        result.disposals.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then_with(|| a.close_date.cmp(&b.close_date))
                .then_with(|| a.account_id.cmp(&b.account_id))
                .then_with(|| a.sell_trade_id.cmp(&b.sell_trade_id))
                .then_with(|| a.open_date.cmp(&b.open_date))
                .then_with(|| a.lot_id.cmp(&b.lot_id))
        });

        debug!(
            "Lot matching produced {} open lots, {} disposals, {} warnings",
            result.lots.len(),
            result.disposals.len(),
            result.warnings.len()
        );
        Ok(result)
    }

    fn group_trades<'a>(&self, trades: &'a [Trade]) -> BTreeMap<LotQueueKey, Vec<&'a Trade>> {
        let mut queues: BTreeMap<LotQueueKey, Vec<&Trade>> = BTreeMap::new();
        for trade in trades {
            let account_id = match self.grouping {
                LotGrouping::Symbol => None,
                LotGrouping::SymbolAndAccount => Some(trade.account_id.clone()),
            };
            queues
                .entry(LotQueueKey {
                    symbol: trade.symbol.clone(),
                    account_id,
                })
                .or_default()
                .push(trade);
        }
        queues
    }

    /// Replays one queue's trades, already in FIFO order.
    fn replay_queue(key: &LotQueueKey, trades: &[&Trade]) -> Result<QueueOutcome> {
        let mut outcome = QueueOutcome::default();

        for trade in trades {
            if trade.quantity.is_zero() {
                warn!(
                    "Ignoring zero-quantity trade {} for {}",
                    trade.id, trade.symbol
                );
                continue;
            }

            let (side, quantity) = trade.signed_side()?;
            match side {
                TradeSide::Buy => outcome.lots.push_back(TaxLot {
                    id: trade.id.clone(),
                    account_id: trade.account_id.clone(),
                    symbol: trade.symbol.clone(),
                    open_date: trade.trade_date,
                    quantity,
                    cost_price: trade.price,
                    currency: trade.currency.clone(),
                }),
                TradeSide::Sell => {
                    let unmatched = consume_fifo(
                        &mut outcome.lots,
                        &mut outcome.disposals,
                        trade,
                        quantity,
                        trade.trade_date,
                    );
                    if unmatched.is_positive() {
                        outcome.shortfall = Some(LotMatchWarning {
                            symbol: key.symbol.clone(),
                            account_id: key.account_id.clone(),
                            trade_id: trade.id.clone(),
                            error: CalculatorError::InsufficientLots {
                                symbol: key.symbol.clone(),
                                unmatched,
                            },
                        });
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }
}

/// Relieves `quantity` from the front of the queue, recording each consumed
/// portion. Returns the quantity left uncovered once the queue is empty.
fn consume_fifo(
    lots: &mut VecDeque<TaxLot>,
    disposals: &mut Vec<LotDisposal>,
    sell: &Trade,
    quantity: FixedDecimal,
    close_date: NaiveDate,
) -> FixedDecimal {
    let mut remaining = quantity;

    while remaining.is_positive() {
        let Some(front) = lots.front_mut() else {
            break;
        };

        let taken = if front.quantity <= remaining {
            front.quantity
        } else {
            remaining
        };
        disposals.push(LotDisposal {
            lot_id: front.id.clone(),
            sell_trade_id: sell.id.clone(),
            account_id: front.account_id.clone(),
            symbol: front.symbol.clone(),
            open_date: front.open_date,
            close_date,
            quantity: taken,
            cost_price: front.cost_price,
            currency: front.currency.clone(),
            sale_price: sell.price,
            sale_currency: sell.currency.clone(),
        });

        if taken == front.quantity {
            lots.pop_front();
        } else {
            front.quantity -= taken;
        }
        remaining -= taken;
    }

    remaining
}

/// Runs a FIFO pass with the grouping and failure policy from `settings`.
pub fn compute_tax_lots(trades: &[Trade], settings: &CoreSettings) -> Result<LotMatchResult> {
    FifoLotMatcher::from_settings(settings).match_trades(trades)
}
