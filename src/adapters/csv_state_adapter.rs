//! CSV durable-state adapter.
//!
//! Three tables under the state directory: `positions.csv` (holdings
//! snapshot, rewritten atomically each cycle), `nav_history.csv` and
//! `trade_log.csv` (append-only). Files absent on first run mean empty
//! state, not an error.

use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::domain::book::PositionBook;
use crate::domain::error::RebalancerError;
use crate::domain::nav::NavRecord;
use crate::domain::position::Position;
use crate::domain::rebalance::TradeIntent;
use crate::ports::state_port::StatePort;

pub struct CsvStateAdapter {
    state_dir: PathBuf,
}

impl CsvStateAdapter {
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    fn positions_path(&self) -> PathBuf {
        self.state_dir.join("positions.csv")
    }

    fn nav_path(&self) -> PathBuf {
        self.state_dir.join("nav_history.csv")
    }

    fn trades_path(&self) -> PathBuf {
        self.state_dir.join("trade_log.csv")
    }

    fn state_err(context: &str, err: impl std::fmt::Display) -> RebalancerError {
        RebalancerError::State {
            reason: format!("{context}: {err}"),
        }
    }

    /// Open an append-only writer, emitting the header when the file is new.
    fn append_writer(
        path: &Path,
        header: &[&str],
    ) -> Result<csv::Writer<std::fs::File>, RebalancerError> {
        let existed = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Self::state_err("failed to open log", e))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if !existed {
            wtr.write_record(header)
                .map_err(|e| Self::state_err("failed to write header", e))?;
        }
        Ok(wtr)
    }
}

impl StatePort for CsvStateAdapter {
    fn load_positions(&self) -> Result<Vec<Position>, RebalancerError> {
        let path = self.positions_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| Self::state_err("failed to read positions", e))?;
        let mut positions = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| Self::state_err("positions parse error", e))?;
            let symbol = record.get(0).unwrap_or("").trim().to_string();
            if symbol.is_empty() {
                continue;
            }
            let shares: i64 = record
                .get(1)
                .unwrap_or("0")
                .trim()
                .parse()
                .map_err(|e| Self::state_err("invalid shares value", e))?;
            let average_cost: f64 = record
                .get(2)
                .unwrap_or("0")
                .trim()
                .parse()
                .map_err(|e| Self::state_err("invalid average_cost value", e))?;
            let add_count: u32 = record
                .get(3)
                .unwrap_or("0")
                .trim()
                .parse()
                .map_err(|e| Self::state_err("invalid add_count value", e))?;

            positions.push(Position {
                symbol,
                shares,
                average_cost,
                add_count,
            });
        }

        Ok(positions)
    }

    fn save_positions(&self, book: &PositionBook) -> Result<(), RebalancerError> {
        let path = self.positions_path();
        let tmp = path.with_extension("csv.tmp");

        {
            let mut wtr = csv::Writer::from_path(&tmp)
                .map_err(|e| Self::state_err("failed to write positions", e))?;
            wtr.write_record(["symbol", "shares", "average_cost", "add_count"])
                .map_err(|e| Self::state_err("failed to write positions header", e))?;
            for pos in book.to_rows() {
                wtr.write_record([
                    pos.symbol.clone(),
                    pos.shares.to_string(),
                    format!("{:.6}", pos.average_cost),
                    pos.add_count.to_string(),
                ])
                .map_err(|e| Self::state_err("failed to write position row", e))?;
            }
            wtr.flush()
                .map_err(|e| Self::state_err("failed to flush positions", e))?;
        }

        fs::rename(&tmp, &path).map_err(|e| Self::state_err("failed to replace positions", e))
    }

    fn nav_history(&self) -> Result<Vec<NavRecord>, RebalancerError> {
        let path = self.nav_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr =
            csv::Reader::from_path(&path).map_err(|e| Self::state_err("failed to read NAV", e))?;
        let mut history = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| Self::state_err("NAV parse error", e))?;
            let date_str = record.get(0).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| Self::state_err("invalid NAV date", e))?;
            let nav: f64 = record
                .get(1)
                .unwrap_or("0")
                .trim()
                .parse()
                .map_err(|e| Self::state_err("invalid NAV value", e))?;
            history.push(NavRecord { date, nav });
        }

        Ok(history)
    }

    fn append_nav(&self, record: &NavRecord) -> Result<(), RebalancerError> {
        let mut wtr = Self::append_writer(&self.nav_path(), &["date", "nav"])?;
        wtr.write_record([record.date.to_string(), format!("{:.2}", record.nav)])
            .map_err(|e| Self::state_err("failed to append NAV", e))?;
        wtr.flush()
            .map_err(|e| Self::state_err("failed to flush NAV", e))
    }

    fn append_trades(
        &self,
        date: NaiveDate,
        intents: &[TradeIntent],
    ) -> Result<(), RebalancerError> {
        if intents.is_empty() {
            return Ok(());
        }
        let mut wtr = Self::append_writer(
            &self.trades_path(),
            &[
                "date", "symbol", "action", "sector", "quantity", "price", "notional",
            ],
        )?;
        for intent in intents {
            wtr.write_record([
                date.to_string(),
                intent.symbol.clone(),
                intent.action.to_string(),
                intent.sector.clone(),
                intent.quantity.to_string(),
                format!("{:.4}", intent.price),
                format!("{:.2}", intent.notional),
            ])
            .map_err(|e| Self::state_err("failed to append trade", e))?;
        }
        wtr.flush()
            .map_err(|e| Self::state_err("failed to flush trades", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rebalance::TradeAction;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn adapter() -> (TempDir, CsvStateAdapter) {
        let dir = TempDir::new().unwrap();
        let adapter = CsvStateAdapter::new(dir.path().to_path_buf());
        (dir, adapter)
    }

    #[test]
    fn first_run_loads_empty_state() {
        let (_dir, adapter) = adapter();
        assert!(adapter.load_positions().unwrap().is_empty());
        assert!(adapter.nav_history().unwrap().is_empty());
    }

    #[test]
    fn positions_round_trip() {
        let (_dir, adapter) = adapter();
        let mut book = PositionBook::new();
        book.insert(Position {
            symbol: "TCS".into(),
            shares: 12,
            average_cost: 4012.5,
            add_count: 1,
        });
        book.insert(Position {
            symbol: "INFY".into(),
            shares: 3,
            average_cost: 1500.0,
            add_count: 0,
        });

        adapter.save_positions(&book).unwrap();
        let loaded = adapter.load_positions().unwrap();

        assert_eq!(loaded.len(), 2);
        // Rows come back sorted by symbol.
        assert_eq!(loaded[0].symbol, "INFY");
        assert_eq!(loaded[1].symbol, "TCS");
        assert_eq!(loaded[1].shares, 12);
        assert!((loaded[1].average_cost - 4012.5).abs() < 1e-6);
        assert_eq!(loaded[1].add_count, 1);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let (_dir, adapter) = adapter();
        let mut book = PositionBook::new();
        book.insert(Position::new("TCS", 12, 4000.0));
        adapter.save_positions(&book).unwrap();

        adapter.save_positions(&PositionBook::new()).unwrap();
        assert!(adapter.load_positions().unwrap().is_empty());
    }

    #[test]
    fn nav_appends_across_runs() {
        let (_dir, adapter) = adapter();
        adapter
            .append_nav(&NavRecord {
                date: date(7),
                nav: 50_000.0,
            })
            .unwrap();
        adapter
            .append_nav(&NavRecord {
                date: date(14),
                nav: 51_250.0,
            })
            .unwrap();

        let history = adapter.nav_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, date(7));
        assert!((history[1].nav - 51_250.0).abs() < 1e-9);
    }

    #[test]
    fn trade_log_appends_with_header_once() {
        let (dir, adapter) = adapter();
        let intent = TradeIntent {
            action: TradeAction::Buy,
            symbol: "TCS".into(),
            sector: "IT".into(),
            quantity: 12,
            price: 4000.0,
            notional: 48_000.0,
        };

        adapter.append_trades(date(7), &[intent.clone()]).unwrap();
        adapter.append_trades(date(14), &[intent]).unwrap();

        let content = fs::read_to_string(dir.path().join("trade_log.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,symbol,action"));
        assert!(lines[1].contains("BUY"));
        assert!(lines[2].starts_with("2024-06-14"));
    }

    #[test]
    fn empty_trade_list_writes_nothing() {
        let (dir, adapter) = adapter();
        adapter.append_trades(date(7), &[]).unwrap();
        assert!(!dir.path().join("trade_log.csv").exists());
    }
}
