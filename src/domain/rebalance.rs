//! Rebalance engine: reconcile holdings against the ranked target set.
//!
//! Processing order is load-bearing. The exit pass runs first so sell
//! proceeds are available to the entry pass, and targets are visited in
//! ranked order so the strongest names claim capital before cash runs out.
//! Per-symbol shortfalls (missing price, unaffordable buy) skip that one
//! intent and continue; partial completion is correct behavior, not a
//! failure.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::book::PositionBook;
use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    /// Pyramided add, numbered from 1.
    Add(u32),
    SellAll,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Add(n) => write!(f, "ADD_{n}"),
            TradeAction::SellAll => write!(f, "SELL_ALL"),
        }
    }
}

/// Immutable record of one decision. The ordered intent sequence for a run
/// is the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    pub action: TradeAction,
    pub symbol: String,
    pub sector: String,
    pub quantity: i64,
    pub price: f64,
    /// quantity * price, before brokerage.
    pub notional: f64,
}

#[derive(Debug, Clone)]
pub struct RebalanceConfig {
    /// Target portfolio size K.
    pub target_size: usize,
    /// Maximum pyramided adds per position lifetime.
    pub max_adds: u32,
    /// Position value cap, as a multiple of the per-slot allocation.
    pub max_position_multiplier: f64,
    /// Brokerage as a fraction of notional, paid on both sides.
    pub brokerage_rate: f64,
    /// Cash held back from every buy and add.
    pub min_cash_buffer: f64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        RebalanceConfig {
            target_size: 10,
            max_adds: 2,
            max_position_multiplier: 2.0,
            brokerage_rate: 0.001,
            min_cash_buffer: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RebalanceOutcome {
    /// Fresh holdings snapshot replacing the input book.
    pub book: PositionBook,
    pub intents: Vec<TradeIntent>,
    pub cash_after: f64,
}

/// Run one reconciliation pass.
///
/// Sizing policy: the per-slot allocation is `nav / K` where nav is cash
/// plus the marked value of current holdings, so
/// slots grow and shrink with the fund rather than staying pinned to the
/// initial capital.
pub fn rebalance(
    book: &PositionBook,
    targets: &[String],
    prices: &HashMap<String, f64>,
    sectors: &HashMap<String, String>,
    cash: f64,
    cfg: &RebalanceConfig,
) -> RebalanceOutcome {
    let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let nav = cash + book.invested_value(prices);
    let base_allocation = if cfg.target_size > 0 {
        nav / cfg.target_size as f64
    } else {
        0.0
    };

    let mut next = PositionBook::new();
    let mut cash = cash;
    let mut intents = Vec::new();

    // Exit pass: close everything held but no longer targeted. A holding
    // with no usable price cannot be marked for sale and is carried over.
    for symbol in book.symbols() {
        let Some(pos) = book.get(&symbol) else {
            continue;
        };
        if target_set.contains(symbol.as_str()) {
            next.insert(pos.clone());
            continue;
        }
        match prices.get(&symbol) {
            Some(&price) if price > 0.0 => {
                let notional = pos.market_value(price);
                cash += notional * (1.0 - cfg.brokerage_rate);
                intents.push(TradeIntent {
                    action: TradeAction::SellAll,
                    symbol: symbol.clone(),
                    sector: sector_of(sectors, &symbol),
                    quantity: pos.shares,
                    price,
                    notional,
                });
            }
            _ => next.insert(pos.clone()),
        }
    }

    // Entry/add pass in ranked order.
    for symbol in targets {
        let Some(&price) = prices.get(symbol) else {
            continue;
        };
        if price <= 0.0 {
            continue;
        }

        let held = next
            .get(symbol)
            .map(|p| (p.add_count, p.average_cost, p.shares));

        match held {
            None => {
                let quantity = (base_allocation / price).floor() as i64;
                if quantity <= 0 {
                    continue;
                }
                let cost = quantity as f64 * price * (1.0 + cfg.brokerage_rate);
                if cost > cash - cfg.min_cash_buffer {
                    continue;
                }
                cash -= cost;
                next.insert(Position::new(symbol, quantity, price));
                intents.push(TradeIntent {
                    action: TradeAction::Buy,
                    symbol: symbol.clone(),
                    sector: sector_of(sectors, symbol),
                    quantity,
                    price,
                    notional: quantity as f64 * price,
                });
            }
            Some((add_count, average_cost, shares)) => {
                // Add only into strength, below the add limit, below the
                // position-value cap. An ineligible hold is not an error.
                if add_count >= cfg.max_adds
                    || price <= average_cost
                    || shares as f64 * price >= base_allocation * cfg.max_position_multiplier
                {
                    continue;
                }
                let quantity = (base_allocation / price).floor() as i64;
                if quantity <= 0 {
                    continue;
                }
                let cost = quantity as f64 * price * (1.0 + cfg.brokerage_rate);
                if cost > cash - cfg.min_cash_buffer {
                    continue;
                }
                cash -= cost;
                if let Some(pos) = next.get_mut(symbol) {
                    pos.apply_add(quantity, price);
                }
                intents.push(TradeIntent {
                    action: TradeAction::Add(add_count + 1),
                    symbol: symbol.clone(),
                    sector: sector_of(sectors, symbol),
                    quantity,
                    price,
                    notional: quantity as f64 * price,
                });
            }
        }
    }

    RebalanceOutcome {
        book: next,
        intents,
        cash_after: cash,
    }
}

fn sector_of(sectors: &HashMap<String, String>, symbol: &str) -> String {
    sectors
        .get(symbol)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string())
}
