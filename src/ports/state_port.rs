//! Durable state port trait.

use chrono::NaiveDate;

use crate::domain::book::PositionBook;
use crate::domain::error::RebalancerError;
use crate::domain::nav::NavRecord;
use crate::domain::position::Position;
use crate::domain::rebalance::TradeIntent;

/// Persisted fund state: holdings snapshot, append-only NAV history and
/// trade log. Absence of any backing file means empty state on first run,
/// never an error.
pub trait StatePort {
    fn load_positions(&self) -> Result<Vec<Position>, RebalancerError>;
    fn save_positions(&self, book: &PositionBook) -> Result<(), RebalancerError>;
    fn nav_history(&self) -> Result<Vec<NavRecord>, RebalancerError>;
    fn append_nav(&self, record: &NavRecord) -> Result<(), RebalancerError>;
    fn append_trades(&self, date: NaiveDate, intents: &[TradeIntent])
        -> Result<(), RebalancerError>;
}
