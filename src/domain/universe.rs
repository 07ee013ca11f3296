//! Candidate universe and sector labels.
//!
//! The universe is a static list of tradable symbols; sector labels are
//! cosmetic, used only in reports. The coverage check here is the one
//! condition that blocks a whole cycle before any trade is generated, since
//! partial data could produce a systematically biased rebalance.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::error::RebalancerError;
use super::price_table::PriceTable;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list from configuration. Duplicates and
/// empty tokens are configuration mistakes, not data to be cleaned up.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if seen.contains(&symbol) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        seen.insert(symbol.clone());
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Load a universe file: first CSV column, one symbol per row after the
/// header. Blank rows are skipped and duplicates collapsed; this is data
/// from elsewhere, not hand-written configuration.
pub fn load_universe_file(path: &Path) -> Result<Vec<String>, RebalancerError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| RebalancerError::State {
            reason: format!("failed to read universe file {}: {}", path.display(), e),
        })?;

    let mut symbols = Vec::new();
    let mut seen = HashSet::new();
    for result in rdr.records() {
        let record = result.map_err(|e| RebalancerError::State {
            reason: format!("universe file parse error: {e}"),
        })?;
        let Some(raw) = record.get(0) else { continue };
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() || seen.contains(&symbol) {
            continue;
        }
        seen.insert(symbol.clone());
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Load the optional `symbol,sector` mapping. An absent file means no
/// sector labels, not an error.
pub fn load_sector_file(path: &Path) -> Result<HashMap<String, String>, RebalancerError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| RebalancerError::State {
            reason: format!("failed to read sector file {}: {}", path.display(), e),
        })?;

    let mut sectors = HashMap::new();
    for result in rdr.records() {
        let record = result.map_err(|e| RebalancerError::State {
            reason: format!("sector file parse error: {e}"),
        })?;
        let (Some(symbol), Some(sector)) = (record.get(0), record.get(1)) else {
            continue;
        };
        let symbol = symbol.trim().to_uppercase();
        let sector = sector.trim();
        if !symbol.is_empty() && !sector.is_empty() {
            sectors.insert(symbol, sector.to_string());
        }
    }

    Ok(sectors)
}

/// Coverage gate: fail the cycle when too few universe symbols came back
/// with usable prices. Returns the usable count on success.
pub fn check_coverage(
    table: &PriceTable,
    universe: &[String],
    minimum: f64,
) -> Result<usize, RebalancerError> {
    let usable = universe
        .iter()
        .filter(|s| table.latest_price(s).is_some())
        .count();
    let total = universe.len();
    let ratio = if total == 0 {
        0.0
    } else {
        usable as f64 / total as f64
    };

    if ratio < minimum {
        return Err(RebalancerError::CoverageShortfall {
            usable,
            total,
            minimum,
        });
    }
    Ok(usable)
}
