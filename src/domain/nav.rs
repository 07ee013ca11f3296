//! Net asset value history.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::book::PositionBook;

/// One append-only NAV observation: invested value plus cash.
#[derive(Debug, Clone, PartialEq)]
pub struct NavRecord {
    pub date: NaiveDate,
    pub nav: f64,
}

/// Mark the book to market and add cash.
pub fn mark_to_market(book: &PositionBook, prices: &HashMap<String, f64>, cash: f64) -> f64 {
    cash + book.invested_value(prices)
}

/// Return since inception against the configured initial capital.
pub fn total_return(history: &[NavRecord], initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    history
        .last()
        .map(|r| (r.nav - initial_capital) / initial_capital)
        .unwrap_or(0.0)
}
