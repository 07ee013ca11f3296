//! CLI definition, dispatch, and the rebalance cycle pipeline.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::csv_state_adapter::CsvStateAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::telegram_adapter::{ConsoleNotifier, TelegramNotifier};
use crate::domain::book::PositionBook;
use crate::domain::config_validation::{
    parse_weekday, validate_data_config, validate_fund_config, validate_regime_config,
    validate_signal_config,
};
use crate::domain::error::RebalancerError;
use crate::domain::nav::{self, NavRecord};
use crate::domain::rebalance::{self, RebalanceConfig, TradeIntent};
use crate::domain::regime::{self, RegimeParams, RegimeStatus};
use crate::domain::report::{self, CycleSummary};
use crate::domain::scorer::{self, ScoreParams};
use crate::domain::selector;
use crate::domain::universe;
use crate::ports::config_port::ConfigPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::price_port::PricePort;
use crate::ports::state_port::StatePort;

#[derive(Parser, Debug)]
#[command(name = "rebalancer", about = "Momentum portfolio rebalancing engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one rebalance cycle
    Rebalance {
        #[arg(short, long)]
        config: PathBuf,
        /// Run even when today is not the configured rebalance day
        #[arg(long)]
        force: bool,
        /// Compute and print the cycle without persisting or notifying
        #[arg(long)]
        dry_run: bool,
    },
    /// Show current holdings
    Positions {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show NAV history and return since inception
    Nav {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Rebalance {
            config,
            force,
            dry_run,
        } => run_rebalance(&config, force, dry_run),
        Command::Positions { config } => run_positions(&config),
        Command::Nav { config } => run_nav(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Everything the pipeline needs from configuration, parsed once.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub initial_capital: f64,
    pub rebalance_weekday: Weekday,
    pub min_coverage: f64,
    pub trend_filter: bool,
    pub lookback_days: usize,
    pub index_symbol: String,
    pub rebalance: RebalanceConfig,
    pub scoring: ScoreParams,
    pub regime: RegimeParams,
}

pub fn build_settings(adapter: &dyn ConfigPort) -> Result<EngineSettings, RebalancerError> {
    let index_symbol = require_string(adapter, "regime", "index_symbol")?;
    let weekday_str = adapter
        .get_string("fund", "rebalance_weekday")
        .unwrap_or_else(|| "fri".to_string());
    let rebalance_weekday =
        parse_weekday(&weekday_str).ok_or_else(|| RebalancerError::ConfigInvalid {
            section: "fund".into(),
            key: "rebalance_weekday".into(),
            reason: format!("unrecognized weekday '{weekday_str}'"),
        })?;

    Ok(EngineSettings {
        initial_capital: adapter.get_double("fund", "initial_capital", 50_000.0),
        rebalance_weekday,
        min_coverage: adapter.get_double("fund", "min_coverage", 0.8),
        trend_filter: adapter.get_bool("signals", "trend_filter", true),
        lookback_days: adapter.get_int("data", "lookback_days", 260) as usize,
        index_symbol,
        rebalance: RebalanceConfig {
            target_size: adapter.get_int("fund", "target_size", 10) as usize,
            max_adds: adapter.get_int("fund", "max_adds", 2) as u32,
            max_position_multiplier: adapter.get_double("fund", "max_position_multiplier", 2.0),
            brokerage_rate: adapter.get_double("fund", "brokerage_rate", 0.001),
            min_cash_buffer: adapter.get_double("fund", "min_cash_buffer", 0.0),
        },
        scoring: ScoreParams {
            min_history: adapter.get_int("signals", "min_history", 200) as usize,
            short_momentum_window: adapter.get_int("signals", "short_momentum_window", 63) as usize,
            long_momentum_window: adapter.get_int("signals", "long_momentum_window", 126) as usize,
            short_trend_window: adapter.get_int("signals", "short_trend_window", 50) as usize,
            long_trend_window: adapter.get_int("signals", "long_trend_window", 200) as usize,
        },
        regime: RegimeParams {
            trend_window: adapter.get_int("regime", "trend_window", 200) as usize,
            crash_lookback: adapter.get_int("regime", "crash_lookback", 63) as usize,
            crash_threshold: adapter.get_double("regime", "crash_threshold", -0.12),
        },
    })
}

/// What one cycle did, for the caller's exit reporting.
#[derive(Debug)]
pub enum CycleOutcome {
    OffDay { weekday: Weekday },
    RegimeBlocked(RegimeStatus),
    Executed { intents: Vec<TradeIntent>, nav: f64 },
}

/// One full rebalance cycle against abstract ports.
///
/// Per-symbol problems skip that symbol and continue. The only conditions
/// that stop the cycle whole are the coverage gate (before any trade) and
/// errors from the ports themselves.
#[allow(clippy::too_many_arguments)]
pub fn run_rebalance_pipeline(
    price_port: &dyn PricePort,
    state_port: &dyn StatePort,
    notifier: &dyn NotifyPort,
    settings: &EngineSettings,
    universe_symbols: &[String],
    sectors: &HashMap<String, String>,
    today: NaiveDate,
    force: bool,
    dry_run: bool,
) -> Result<CycleOutcome, RebalancerError> {
    // Stage 1: cadence.
    if !force && today.weekday() != settings.rebalance_weekday {
        return Ok(CycleOutcome::OffDay {
            weekday: today.weekday(),
        });
    }

    // Stage 2: fetch prices for the universe plus the benchmark index.
    let mut fetch_symbols = universe_symbols.to_vec();
    if !fetch_symbols.contains(&settings.index_symbol) {
        fetch_symbols.push(settings.index_symbol.clone());
    }
    let table = price_port.fetch_closes(&fetch_symbols, settings.lookback_days)?;
    let as_of = table
        .as_of_date()
        .ok_or_else(|| RebalancerError::PriceFeed {
            reason: "price feed returned no data".into(),
        })?;
    eprintln!(
        "Fetched {} of {} symbols, as of {}",
        table.len(),
        fetch_symbols.len(),
        as_of
    );

    // Stage 3: coverage gate, before any state is touched. A thin cycle
    // must not trade at all.
    if let Err(err) = universe::check_coverage(&table, universe_symbols, settings.min_coverage) {
        if let RebalancerError::CoverageShortfall {
            usable,
            total,
            minimum,
        } = &err
        {
            notify_best_effort(
                notifier,
                &report::coverage_shortfall_report(*usable, *total, *minimum, as_of),
            );
        }
        return Err(err);
    }

    // Stage 4: load state, mark holdings, reconstruct cash. Cash is not
    // persisted separately: it is the previous NAV less the current mark of
    // the holdings carried into this cycle.
    let book = PositionBook::from_positions(state_port.load_positions()?);
    let history = state_port.nav_history()?;
    let prices = table.latest_prices();
    let prev_nav = history
        .last()
        .map(|r| r.nav)
        .unwrap_or(settings.initial_capital);
    let cash = (prev_nav - book.invested_value(&prices)).max(0.0);

    // Stage 5: regime gate. A blocked cycle still marks NAV to market,
    // since the fund's value moved even though nothing traded.
    let status = regime::evaluate(&table, &settings.index_symbol, &settings.regime)?;
    if !status.allows_trading() {
        let nav_value = nav::mark_to_market(&book, &prices, cash);
        if !dry_run {
            state_port.append_nav(&NavRecord {
                date: as_of,
                nav: nav_value,
            })?;
        }
        notify_best_effort(notifier, &report::regime_blocked_report(&status, as_of));
        return Ok(CycleOutcome::RegimeBlocked(status));
    }

    // Stage 6: score, select, reconcile.
    let (scores, skipped) =
        scorer::score_universe(&table, universe_symbols, as_of, &settings.scoring);
    if !skipped.is_empty() {
        eprintln!(
            "Skipped {} of {} symbols for scoring",
            skipped.len(),
            universe_symbols.len()
        );
    }
    let selected = selector::select(scores, settings.rebalance.target_size, settings.trend_filter);
    let targets: Vec<String> = selected.iter().map(|s| s.symbol.clone()).collect();
    eprintln!("Target portfolio: {}", targets.join(", "));

    let outcome = rebalance::rebalance(&book, &targets, &prices, sectors, cash, &settings.rebalance);

    // Stage 7: persist and report.
    let nav_value = nav::mark_to_market(&outcome.book, &prices, outcome.cash_after);
    let nav_record = NavRecord {
        date: as_of,
        nav: nav_value,
    };
    let mut full_history = history;
    full_history.push(nav_record.clone());
    let total_return = nav::total_return(&full_history, settings.initial_capital);

    let text = report::rebalance_report(&CycleSummary {
        date: as_of,
        intents: &outcome.intents,
        cash: outcome.cash_after,
        nav: nav_value,
        total_return,
        holdings: outcome.book.len(),
    });

    if dry_run {
        println!("{text}");
    } else {
        state_port.save_positions(&outcome.book)?;
        state_port.append_trades(as_of, &outcome.intents)?;
        state_port.append_nav(&nav_record)?;
        notify_best_effort(notifier, &text);
    }

    Ok(CycleOutcome::Executed {
        intents: outcome.intents,
        nav: nav_value,
    })
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RebalancerError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), RebalancerError> {
    validate_fund_config(adapter)?;
    validate_signal_config(adapter)?;
    validate_regime_config(adapter)?;
    validate_data_config(adapter)?;
    Ok(())
}

fn require_string(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, RebalancerError> {
    adapter
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RebalancerError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

pub fn resolve_universe(adapter: &dyn ConfigPort) -> Result<Vec<String>, RebalancerError> {
    if let Some(list) = adapter.get_string("universe", "symbols") {
        return universe::parse_symbols(&list).map_err(|e| RebalancerError::ConfigInvalid {
            section: "universe".into(),
            key: "symbols".into(),
            reason: e.to_string(),
        });
    }
    if let Some(file) = adapter.get_string("universe", "universe_file") {
        return universe::load_universe_file(Path::new(&file));
    }
    Err(RebalancerError::ConfigMissing {
        section: "universe".into(),
        key: "symbols".into(),
    })
}

fn resolve_sectors(
    adapter: &dyn ConfigPort,
) -> Result<HashMap<String, String>, RebalancerError> {
    match adapter.get_string("universe", "sector_file") {
        Some(file) => universe::load_sector_file(Path::new(&file)),
        None => Ok(HashMap::new()),
    }
}

fn build_notifier(
    adapter: &dyn ConfigPort,
    dry_run: bool,
) -> Result<Box<dyn NotifyPort>, RebalancerError> {
    if dry_run {
        return Ok(Box::new(ConsoleNotifier));
    }
    let token = adapter.get_string("telegram", "bot_token");
    let chat_id = adapter.get_string("telegram", "chat_id");
    match (token, chat_id) {
        (Some(token), Some(chat_id)) if !token.trim().is_empty() && !chat_id.trim().is_empty() => {
            Ok(Box::new(TelegramNotifier::new(token.trim(), chat_id.trim())?))
        }
        _ => Ok(Box::new(ConsoleNotifier)),
    }
}

fn notify_best_effort(notifier: &dyn NotifyPort, text: &str) {
    if let Err(e) = notifier.send(text) {
        eprintln!("warning: notification failed: {e}");
    }
}

fn run_rebalance(config_path: &PathBuf, force: bool, dry_run: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let prepared = build_settings(&adapter)
        .and_then(|settings| Ok((settings, resolve_universe(&adapter)?, resolve_sectors(&adapter)?)));
    let (settings, universe_symbols, sectors) = match prepared {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let price_dir = adapter.get_string("data", "price_dir").unwrap_or_default();
    let state_dir = adapter.get_string("data", "state_dir").unwrap_or_default();
    let price_port = CsvPriceAdapter::new(PathBuf::from(price_dir));
    let state_port = CsvStateAdapter::new(PathBuf::from(state_dir));
    let notifier = match build_notifier(&adapter, dry_run) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let today = Local::now().date_naive();
    match run_rebalance_pipeline(
        &price_port,
        &state_port,
        notifier.as_ref(),
        &settings,
        &universe_symbols,
        &sectors,
        today,
        force,
        dry_run,
    ) {
        Ok(CycleOutcome::OffDay { weekday }) => {
            eprintln!(
                "Not a rebalance day ({weekday}, configured {}); use --force to override",
                settings.rebalance_weekday
            );
            ExitCode::SUCCESS
        }
        Ok(CycleOutcome::RegimeBlocked(status)) => {
            eprintln!("Cycle skipped by regime gate: {status:?}");
            ExitCode::SUCCESS
        }
        Ok(CycleOutcome::Executed { intents, nav }) => {
            eprintln!("Cycle complete: {} trades, NAV {:.2}", intents.len(), nav);
            ExitCode::SUCCESS
        }
        Err(e) => {
            // The coverage gate already sent its own warning; anything else
            // unexpected is reported through the channel before we bail.
            if !matches!(e, RebalancerError::CoverageShortfall { .. }) {
                notify_best_effort(notifier.as_ref(), &report::failure_report(&e.to_string()));
            }
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_positions(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let state_dir = match require_string(&adapter, "data", "state_dir") {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let state_port = CsvStateAdapter::new(PathBuf::from(state_dir));
    match state_port.load_positions() {
        Ok(positions) if positions.is_empty() => {
            eprintln!("No open positions");
            ExitCode::SUCCESS
        }
        Ok(positions) => {
            println!("{:<12} {:>8} {:>12} {:>6}", "symbol", "shares", "avg_cost", "adds");
            for pos in &positions {
                println!(
                    "{:<12} {:>8} {:>12.2} {:>6}",
                    pos.symbol, pos.shares, pos.average_cost, pos.add_count
                );
            }
            eprintln!("{} positions", positions.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_nav(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let state_dir = match require_string(&adapter, "data", "state_dir") {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let initial_capital = adapter.get_double("fund", "initial_capital", 50_000.0);

    let state_port = CsvStateAdapter::new(PathBuf::from(state_dir));
    match state_port.nav_history() {
        Ok(history) if history.is_empty() => {
            eprintln!("No NAV history yet");
            ExitCode::SUCCESS
        }
        Ok(history) => {
            for record in &history {
                println!("{}  {:.2}", record.date, record.nav);
            }
            let total = nav::total_return(&history, initial_capital);
            eprintln!(
                "{} records, total return {:+.2}%",
                history.len(),
                total * 100.0
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = validate_all(&adapter)
        .and_then(|()| build_settings(&adapter).map(|_| ()))
        .and_then(|()| resolve_universe(&adapter).map(|_| ()));

    match result {
        Ok(()) => {
            eprintln!("Configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
