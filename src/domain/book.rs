//! Position book: current holdings keyed by symbol.
//!
//! The book is owned exclusively by the rebalance engine for the duration of
//! a run. Rebalancing builds a fresh snapshot rather than mutating the old
//! book while iterating it.

use std::collections::HashMap;

use super::position::Position;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionBook {
    positions: HashMap<String, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from persisted rows. Rows without shares are dropped;
    /// a zero-share position must not survive a round trip through storage.
    pub fn from_positions(positions: Vec<Position>) -> Self {
        let mut book = PositionBook::new();
        for pos in positions {
            if pos.shares > 0 {
                book.insert(pos);
            }
        }
        book
    }

    pub fn insert(&mut self, position: Position) {
        self.positions.insert(position.symbol.clone(), position);
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut Position> {
        self.positions.get_mut(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Held symbols in sorted order, for deterministic iteration.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.positions.keys().cloned().collect();
        symbols.sort_unstable();
        symbols
    }

    /// Positions as sorted rows, for persistence and display.
    pub fn to_rows(&self) -> Vec<Position> {
        let mut rows: Vec<Position> = self.positions.values().cloned().collect();
        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        rows
    }

    /// Market value of all holdings. A position whose symbol has no current
    /// price is carried at its average cost rather than valued at zero.
    pub fn invested_value(&self, prices: &HashMap<String, f64>) -> f64 {
        self.positions
            .values()
            .map(|pos| match prices.get(&pos.symbol) {
                Some(&price) if price > 0.0 => pos.market_value(price),
                _ => pos.market_value(pos.average_cost),
            })
            .sum()
    }
}
