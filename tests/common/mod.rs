#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;

use rebalancer::cli::EngineSettings;
use rebalancer::domain::book::PositionBook;
use rebalancer::domain::error::RebalancerError;
use rebalancer::domain::nav::NavRecord;
use rebalancer::domain::position::Position;
use rebalancer::domain::price_table::{ClosePoint, PriceTable};
use rebalancer::domain::rebalance::{RebalanceConfig, TradeIntent};
use rebalancer::domain::regime::RegimeParams;
use rebalancer::domain::scorer::ScoreParams;
use rebalancer::ports::notify_port::NotifyPort;
use rebalancer::ports::price_port::PricePort;
use rebalancer::ports::state_port::StatePort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily closes ending at `end`, walking back one calendar day per row,
/// rising by `step` per day toward the final value `last`.
pub fn trending_series(end: NaiveDate, rows: usize, last: f64, step: f64) -> Vec<ClosePoint> {
    (0..rows)
        .map(|i| {
            let back = (rows - 1 - i) as i64;
            ClosePoint {
                date: end - Duration::days(back),
                close: last - step * back as f64,
            }
        })
        .collect()
}

pub struct MockPricePort {
    pub table: PriceTable,
    pub error: Option<String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            table: PriceTable::new(),
            error: None,
        }
    }

    pub fn with_series(mut self, symbol: &str, points: Vec<ClosePoint>) -> Self {
        self.table.insert_series(symbol, points);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_closes(
        &self,
        _symbols: &[String],
        _lookback_days: usize,
    ) -> Result<PriceTable, RebalancerError> {
        if let Some(reason) = &self.error {
            return Err(RebalancerError::PriceFeed {
                reason: reason.clone(),
            });
        }
        Ok(self.table.clone())
    }
}

/// In-memory state port that records every write for assertions.
pub struct MockStatePort {
    pub positions: RefCell<Vec<Position>>,
    pub nav: RefCell<Vec<NavRecord>>,
    pub trades: RefCell<Vec<(NaiveDate, TradeIntent)>>,
    pub saves: RefCell<usize>,
}

impl MockStatePort {
    pub fn new() -> Self {
        Self {
            positions: RefCell::new(Vec::new()),
            nav: RefCell::new(Vec::new()),
            trades: RefCell::new(Vec::new()),
            saves: RefCell::new(0),
        }
    }

    pub fn with_position(self, symbol: &str, shares: i64, average_cost: f64) -> Self {
        self.positions
            .borrow_mut()
            .push(Position::new(symbol, shares, average_cost));
        self
    }

    pub fn with_nav(self, date: NaiveDate, nav: f64) -> Self {
        self.nav.borrow_mut().push(NavRecord { date, nav });
        self
    }
}

impl StatePort for MockStatePort {
    fn load_positions(&self) -> Result<Vec<Position>, RebalancerError> {
        Ok(self.positions.borrow().clone())
    }

    fn save_positions(&self, book: &PositionBook) -> Result<(), RebalancerError> {
        *self.positions.borrow_mut() = book.to_rows();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn nav_history(&self) -> Result<Vec<NavRecord>, RebalancerError> {
        Ok(self.nav.borrow().clone())
    }

    fn append_nav(&self, record: &NavRecord) -> Result<(), RebalancerError> {
        self.nav.borrow_mut().push(record.clone());
        Ok(())
    }

    fn append_trades(
        &self,
        date: NaiveDate,
        intents: &[TradeIntent],
    ) -> Result<(), RebalancerError> {
        let mut log = self.trades.borrow_mut();
        for intent in intents {
            log.push((date, intent.clone()));
        }
        Ok(())
    }
}

pub struct MockNotifier {
    pub messages: RefCell<Vec<String>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            messages: RefCell::new(Vec::new()),
        }
    }
}

impl NotifyPort for MockNotifier {
    fn send(&self, text: &str) -> Result<(), RebalancerError> {
        self.messages.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// Settings tuned for small fixtures: short windows so 210-row series
/// clear every history requirement, Friday cadence, index "NIFTY".
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        initial_capital: 10_000.0,
        rebalance_weekday: chrono::Weekday::Fri,
        min_coverage: 0.8,
        trend_filter: false,
        lookback_days: 260,
        index_symbol: "NIFTY".to_string(),
        rebalance: RebalanceConfig {
            target_size: 2,
            max_adds: 2,
            max_position_multiplier: 2.0,
            brokerage_rate: 0.0,
            min_cash_buffer: 0.0,
        },
        scoring: ScoreParams {
            min_history: 200,
            short_momentum_window: 63,
            long_momentum_window: 126,
            short_trend_window: 50,
            long_trend_window: 200,
        },
        regime: RegimeParams {
            trend_window: 200,
            crash_lookback: 63,
            crash_threshold: -0.12,
        },
    }
}

pub fn no_sectors() -> HashMap<String, String> {
    HashMap::new()
}
