//! Market-level regime gate.
//!
//! Two filters evaluated against the benchmark index, both of which must
//! pass before any rebalance executes. Skipping a cycle is cheaper than
//! rebalancing into a confirmed downtrend.

use super::error::RebalancerError;
use super::price_table::PriceTable;

#[derive(Debug, Clone)]
pub struct RegimeParams {
    /// Trailing moving-average window for the trend filter, in trading days.
    pub trend_window: usize,
    /// Trailing-return lookback for the crash filter, in trading days.
    pub crash_lookback: usize,
    /// Crash trigger: trailing return below this (negative) threshold.
    pub crash_threshold: f64,
}

impl Default for RegimeParams {
    fn default() -> Self {
        RegimeParams {
            trend_window: 200,
            crash_lookback: 63,
            crash_threshold: -0.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegimeStatus {
    Bullish,
    BearishTrend { level: f64, average: f64 },
    Crash { trailing_return: f64, threshold: f64 },
}

impl RegimeStatus {
    pub fn allows_trading(&self) -> bool {
        matches!(self, RegimeStatus::Bullish)
    }
}

/// Evaluate both filters against the index series. The index not having
/// enough history is a cycle-level error: the gate cannot be evaluated, so
/// nothing may trade.
pub fn evaluate(
    table: &PriceTable,
    index_symbol: &str,
    params: &RegimeParams,
) -> Result<RegimeStatus, RebalancerError> {
    let minimum = params.trend_window.max(params.crash_lookback + 1);
    let series = table
        .series(index_symbol)
        .ok_or_else(|| RebalancerError::InsufficientHistory {
            symbol: index_symbol.to_string(),
            rows: 0,
            minimum,
        })?;

    if series.len() < minimum {
        return Err(RebalancerError::InsufficientHistory {
            symbol: index_symbol.to_string(),
            rows: series.len(),
            minimum,
        });
    }

    let t = series.len() - 1;
    let level = series[t].close;

    let tail = &series[series.len() - params.trend_window..];
    let average = tail.iter().map(|p| p.close).sum::<f64>() / params.trend_window as f64;
    if level <= average {
        return Ok(RegimeStatus::BearishTrend { level, average });
    }

    let base = series[t - params.crash_lookback].close;
    let trailing_return = level / base - 1.0;
    if trailing_return < params.crash_threshold {
        return Ok(RegimeStatus::Crash {
            trailing_return,
            threshold: params.crash_threshold,
        });
    }

    Ok(RegimeStatus::Bullish)
}
