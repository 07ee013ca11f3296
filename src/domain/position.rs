//! Open position with average-cost accounting.

/// A single open holding. `shares` is positive while open; a position sold
/// down to zero is removed from the book, never retained at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub shares: i64,
    /// Capital-weighted mean entry price across the initial buy and all adds.
    pub average_cost: f64,
    pub add_count: u32,
}

impl Position {
    pub fn new(symbol: &str, shares: i64, price: f64) -> Self {
        Position {
            symbol: symbol.to_string(),
            shares,
            average_cost: price,
            add_count: 0,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// Apply a pyramided add: shares grow, average cost is re-weighted by
    /// capital, the add counter advances.
    pub fn apply_add(&mut self, quantity: i64, price: f64) {
        let total_cost = self.shares as f64 * self.average_cost + quantity as f64 * price;
        self.shares += quantity;
        self.average_cost = total_cost / self.shares as f64;
        self.add_count += 1;
    }
}
