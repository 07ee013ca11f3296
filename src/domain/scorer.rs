//! Trend and momentum scoring.
//!
//! Every symbol is scored on the same as-of close. A symbol that cannot be
//! scored (no series, a stale series, too little history) is skipped and
//! reported as such, never defaulted to zero. A partial lookback window
//! would fabricate a momentum signal out of missing data.

use chrono::NaiveDate;

use super::price_table::PriceTable;

#[derive(Debug, Clone)]
pub struct ScoreParams {
    /// Minimum trading days of history before a symbol is scoreable.
    pub min_history: usize,
    pub short_momentum_window: usize,
    pub long_momentum_window: usize,
    pub short_trend_window: usize,
    pub long_trend_window: usize,
}

impl Default for ScoreParams {
    fn default() -> Self {
        ScoreParams {
            min_history: 200,
            short_momentum_window: 63,
            long_momentum_window: 126,
            short_trend_window: 50,
            long_trend_window: 200,
        }
    }
}

impl ScoreParams {
    /// Rows needed so every lookback lands on a real close.
    pub fn required_rows(&self) -> usize {
        self.min_history
            .max(self.long_momentum_window + 1)
            .max(self.short_momentum_window + 1)
            .max(self.long_trend_window)
            .max(self.short_trend_window)
    }
}

/// Per-symbol indicator snapshot, recomputed each run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub symbol: String,
    pub latest_price: f64,
    pub short_momentum: f64,
    pub long_momentum: f64,
    pub short_trend_avg: f64,
    pub long_trend_avg: f64,
}

impl ScoreRecord {
    /// Ranking score: sum of the two momentum terms.
    pub fn composite(&self) -> f64 {
        self.short_momentum + self.long_momentum
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoSeries,
    StaleSeries { last: NaiveDate },
    InsufficientHistory { rows: usize, minimum: usize },
    NonPositivePrice,
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

pub fn score_symbol(
    table: &PriceTable,
    symbol: &str,
    as_of: NaiveDate,
    params: &ScoreParams,
) -> Result<ScoreRecord, SkipReason> {
    let series = table.series(symbol).ok_or(SkipReason::NoSeries)?;
    let last = series.last().ok_or(SkipReason::NoSeries)?;
    if last.date != as_of {
        return Err(SkipReason::StaleSeries { last: last.date });
    }

    let minimum = params.required_rows();
    if series.len() < minimum {
        return Err(SkipReason::InsufficientHistory {
            rows: series.len(),
            minimum,
        });
    }

    let t = series.len() - 1;
    let latest_price = last.close;
    let short_base = series[t - params.short_momentum_window].close;
    let long_base = series[t - params.long_momentum_window].close;
    if latest_price <= 0.0 || short_base <= 0.0 || long_base <= 0.0 {
        return Err(SkipReason::NonPositivePrice);
    }

    Ok(ScoreRecord {
        symbol: symbol.to_string(),
        latest_price,
        short_momentum: latest_price / short_base - 1.0,
        long_momentum: latest_price / long_base - 1.0,
        short_trend_avg: trailing_mean(series, params.short_trend_window),
        long_trend_avg: trailing_mean(series, params.long_trend_window),
    })
}

/// Score the whole universe, collecting skips alongside the records.
pub fn score_universe(
    table: &PriceTable,
    universe: &[String],
    as_of: NaiveDate,
    params: &ScoreParams,
) -> (Vec<ScoreRecord>, Vec<SkippedSymbol>) {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for symbol in universe {
        match score_symbol(table, symbol, as_of, params) {
            Ok(record) => records.push(record),
            Err(reason) => skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason,
            }),
        }
    }

    (records, skipped)
}

fn trailing_mean(series: &[super::price_table::ClosePoint], window: usize) -> f64 {
    let tail = &series[series.len() - window..];
    tail.iter().map(|p| p.close).sum::<f64>() / window as f64
}
