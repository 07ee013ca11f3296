//! CSV file price feed adapter.
//!
//! One `{SYMBOL}.csv` file per symbol under a base directory, columns
//! `date,close` with a header row, adjusted closes. A missing file is a
//! missing symbol, matching the feed contract.

use crate::domain::error::RebalancerError;
use crate::domain::price_table::{ClosePoint, PriceTable};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::path::PathBuf;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn read_series(&self, symbol: &str) -> Result<Vec<ClosePoint>, RebalancerError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| RebalancerError::PriceFeed {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| RebalancerError::PriceFeed {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| RebalancerError::PriceFeed {
                reason: format!("missing date column in {}", path.display()),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                RebalancerError::PriceFeed {
                    reason: format!("invalid date '{date_str}' in {}: {}", path.display(), e),
                }
            })?;

            let close: f64 = record
                .get(1)
                .ok_or_else(|| RebalancerError::PriceFeed {
                    reason: format!("missing close column in {}", path.display()),
                })?
                .parse()
                .map_err(|e| RebalancerError::PriceFeed {
                    reason: format!("invalid close value in {}: {}", path.display(), e),
                })?;

            points.push(ClosePoint { date, close });
        }

        Ok(points)
    }
}

impl PricePort for CsvPriceAdapter {
    fn fetch_closes(
        &self,
        symbols: &[String],
        lookback_days: usize,
    ) -> Result<PriceTable, RebalancerError> {
        let mut table = PriceTable::new();

        for symbol in symbols {
            if !self.csv_path(symbol).exists() {
                continue;
            }
            let mut points = self.read_series(symbol)?;
            points.sort_by_key(|p| p.date);
            // Lookback is counted in rows: each row is one trading day.
            if points.len() > lookback_days {
                points.drain(..points.len() - lookback_days);
            }
            table.insert_series(symbol, points);
        }

        Ok(table)
    }
}
