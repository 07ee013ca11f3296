//! Time-indexed adjusted-close price table.
//!
//! One series per symbol, strictly increasing dates. Absence is always
//! explicit: a symbol the feed did not return has no series, a date a symbol
//! did not trade has no row. Nothing is ever represented as a zero price.

use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    series: HashMap<String, Vec<ClosePoint>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a close-price series. Rows are sorted by date and duplicate
    /// dates collapsed (first row wins). An empty series is not stored; the
    /// symbol stays absent.
    pub fn insert_series(&mut self, symbol: &str, mut points: Vec<ClosePoint>) {
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        if points.is_empty() {
            return;
        }
        self.series.insert(symbol.to_string(), points);
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.series.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self, symbol: &str) -> Option<&[ClosePoint]> {
        self.series.get(symbol).map(Vec::as_slice)
    }

    /// Most recent date present anywhere in the table. All scoring is done
    /// as of this single date so every symbol is compared on the same close.
    pub fn as_of_date(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(|s| s.last().map(|p| p.date))
            .max()
    }

    pub fn price_at(&self, symbol: &str, date: NaiveDate) -> Option<f64> {
        let series = self.series.get(symbol)?;
        series
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| series[i].close)
    }

    /// Close on the as-of date, or `None` when the series is stale. A series
    /// that stopped updating must not contribute its last known price.
    pub fn latest_price(&self, symbol: &str) -> Option<f64> {
        let as_of = self.as_of_date()?;
        let last = self.series.get(symbol)?.last()?;
        (last.date == as_of).then_some(last.close)
    }

    /// Trailing `window` rows ending at the series end, or `None` when the
    /// series is shorter than the window.
    pub fn history(&self, symbol: &str, window: usize) -> Option<&[ClosePoint]> {
        let series = self.series.get(symbol)?;
        if window == 0 || series.len() < window {
            return None;
        }
        Some(&series[series.len() - window..])
    }

    /// Current price for every symbol with a close on the as-of date.
    pub fn latest_prices(&self) -> HashMap<String, f64> {
        self.series
            .keys()
            .filter_map(|s| self.latest_price(s).map(|p| (s.clone(), p)))
            .collect()
    }

    /// Fraction of `universe` symbols with a usable close on the as-of date.
    pub fn coverage_ratio(&self, universe: &[String]) -> f64 {
        if universe.is_empty() {
            return 0.0;
        }
        let usable = universe
            .iter()
            .filter(|s| self.latest_price(s).is_some())
            .count();
        usable as f64 / universe.len() as f64
    }
}
