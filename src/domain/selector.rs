//! Target portfolio selection.
//!
//! Ranks scored symbols by composite momentum and keeps the top K. Ties are
//! broken by lexicographic symbol order so a run is reproducible regardless
//! of input ordering.

use std::cmp::Ordering;

use super::scorer::ScoreRecord;

/// Per-symbol trend filter: price above the long average, short average
/// above the long average, both momentum terms positive.
pub fn passes_trend_filter(record: &ScoreRecord) -> bool {
    record.latest_price > record.long_trend_avg
        && record.short_trend_avg > record.long_trend_avg
        && record.short_momentum > 0.0
        && record.long_momentum > 0.0
}

/// Select the ranked target set. When fewer than `k` symbols survive the
/// filter, all survivors are returned rather than padding the portfolio.
pub fn select(mut scores: Vec<ScoreRecord>, k: usize, trend_filter: bool) -> Vec<ScoreRecord> {
    if trend_filter {
        scores.retain(passes_trend_filter);
    }

    scores.sort_by(|a, b| {
        b.composite()
            .partial_cmp(&a.composite())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    scores.truncate(k);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(symbol: &str, short_momentum: f64, long_momentum: f64) -> ScoreRecord {
        ScoreRecord {
            symbol: symbol.to_string(),
            latest_price: 110.0,
            short_momentum,
            long_momentum,
            short_trend_avg: 105.0,
            long_trend_avg: 100.0,
        }
    }

    #[test]
    fn ranks_by_composite_descending() {
        let scores = vec![
            record("TCS", 0.05, 0.10),
            record("INFY", 0.20, 0.15),
            record("WIPRO", 0.10, 0.12),
        ];
        let selected = select(scores, 2, false);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].symbol, "INFY");
        assert_eq!(selected[1].symbol, "WIPRO");
    }

    #[test]
    fn equal_scores_break_ties_lexicographically() {
        let scores = vec![
            record("WIPRO", 0.10, 0.10),
            record("INFY", 0.10, 0.10),
            record("TCS", 0.10, 0.10),
        ];
        let selected = select(scores, 2, false);
        assert_eq!(selected[0].symbol, "INFY");
        assert_eq!(selected[1].symbol, "TCS");
    }

    #[test]
    fn returns_all_when_fewer_than_k() {
        let scores = vec![record("TCS", 0.05, 0.10)];
        let selected = select(scores, 10, false);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn trend_filter_drops_negative_momentum() {
        let mut weak = record("INFY", -0.01, 0.30);
        weak.latest_price = 110.0;
        let scores = vec![record("TCS", 0.05, 0.10), weak];

        let selected = select(scores, 10, true);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].symbol, "TCS");
    }

    #[test]
    fn trend_filter_requires_price_above_long_average() {
        let mut below = record("INFY", 0.10, 0.10);
        below.latest_price = 95.0; // long_trend_avg is 100
        let selected = select(vec![below], 10, true);
        assert!(selected.is_empty());
    }

    #[test]
    fn trend_filter_requires_short_average_above_long() {
        let mut crossed = record("INFY", 0.10, 0.10);
        crossed.short_trend_avg = 99.0;
        let selected = select(vec![crossed], 10, true);
        assert!(selected.is_empty());
    }
}
