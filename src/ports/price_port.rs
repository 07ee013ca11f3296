//! Price feed port trait.

use crate::domain::error::RebalancerError;
use crate::domain::price_table::PriceTable;

/// External price feed: split/dividend-adjusted daily closes.
///
/// A symbol the feed knows nothing about is simply absent from the returned
/// table, not an error; coverage is judged downstream.
pub trait PricePort {
    fn fetch_closes(
        &self,
        symbols: &[String],
        lookback_days: usize,
    ) -> Result<PriceTable, RebalancerError>;
}
