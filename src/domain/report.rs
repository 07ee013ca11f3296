//! Human-readable cycle reports for the notification channel.
//!
//! Pure formatting: no side effects beyond producing text.

use chrono::NaiveDate;

use super::rebalance::{TradeAction, TradeIntent};
use super::regime::RegimeStatus;

/// Everything the executed-cycle report needs.
#[derive(Debug, Clone)]
pub struct CycleSummary<'a> {
    pub date: NaiveDate,
    pub intents: &'a [TradeIntent],
    pub cash: f64,
    pub nav: f64,
    pub total_return: f64,
    pub holdings: usize,
}

pub fn rebalance_report(summary: &CycleSummary<'_>) -> String {
    let mut out = format!("WEEKLY REBALANCE — {}\n\n", summary.date);

    if summary.intents.is_empty() {
        out.push_str("No trades: portfolio already aligned with target.\n");
    } else {
        for intent in summary.intents {
            match intent.action {
                TradeAction::SellAll => {
                    out.push_str(&format!(
                        "SELL {} ({} @ {:.2})\n",
                        intent.symbol, intent.quantity, intent.price
                    ));
                }
                action => {
                    out.push_str(&format!(
                        "{} {} [{}] — {} @ {:.2}\n",
                        action, intent.symbol, intent.sector, intent.quantity, intent.price
                    ));
                }
            }
        }
    }

    out.push_str(&format!("\nCash:         {:.2}\n", summary.cash));
    out.push_str(&format!("NAV:          {:.2}\n", summary.nav));
    out.push_str(&format!(
        "Total return: {:+.2}%\n",
        summary.total_return * 100.0
    ));
    out.push_str(&format!("Holdings:     {}\n", summary.holdings));
    out
}

pub fn regime_blocked_report(status: &RegimeStatus, date: NaiveDate) -> String {
    match status {
        RegimeStatus::BearishTrend { level, average } => format!(
            "REBALANCE SKIPPED — {date}\n\nMarket not bullish: index {level:.2} \
             at or below its trend average {average:.2}. No allocation.",
        ),
        RegimeStatus::Crash {
            trailing_return,
            threshold,
        } => format!(
            "REBALANCE SKIPPED — {date}\n\nCrash filter triggered: trailing return \
             {:.1}% below threshold {:.1}%. No allocation.",
            trailing_return * 100.0,
            threshold * 100.0,
        ),
        RegimeStatus::Bullish => format!("REBALANCE SKIPPED — {date}\n\nNo allocation."),
    }
}

pub fn coverage_shortfall_report(usable: usize, total: usize, minimum: f64, date: NaiveDate) -> String {
    format!(
        "REBALANCE ABORTED — {date}\n\nPrice data covered only {usable} of {total} \
         universe symbols (minimum ratio {minimum:.2}). Holdings left untouched.",
    )
}

pub fn failure_report(detail: &str) -> String {
    format!("REBALANCE FAILED\n\n{detail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 7).unwrap()
    }

    fn intent(action: TradeAction, symbol: &str, quantity: i64, price: f64) -> TradeIntent {
        TradeIntent {
            action,
            symbol: symbol.to_string(),
            sector: "IT".to_string(),
            quantity,
            price,
            notional: quantity as f64 * price,
        }
    }

    #[test]
    fn executed_report_lists_trades_in_order() {
        let intents = vec![
            intent(TradeAction::SellAll, "WIPRO", 10, 450.0),
            intent(TradeAction::Buy, "TCS", 1, 4000.0),
            intent(TradeAction::Add(2), "INFY", 3, 1550.0),
        ];
        let report = rebalance_report(&CycleSummary {
            date: date(),
            intents: &intents,
            cash: 1234.56,
            nav: 52_000.0,
            total_return: 0.04,
            holdings: 10,
        });

        let sell = report.find("SELL WIPRO").unwrap();
        let buy = report.find("BUY TCS").unwrap();
        let add = report.find("ADD_2 INFY").unwrap();
        assert!(sell < buy && buy < add);
        assert!(report.contains("Cash:         1234.56"));
        assert!(report.contains("NAV:          52000.00"));
        assert!(report.contains("Total return: +4.00%"));
        assert!(report.contains("Holdings:     10"));
    }

    #[test]
    fn executed_report_without_trades() {
        let report = rebalance_report(&CycleSummary {
            date: date(),
            intents: &[],
            cash: 100.0,
            nav: 100.0,
            total_return: -0.015,
            holdings: 0,
        });
        assert!(report.contains("No trades"));
        assert!(report.contains("Total return: -1.50%"));
    }

    #[test]
    fn bearish_report_names_the_filter() {
        let status = RegimeStatus::BearishTrend {
            level: 21_500.0,
            average: 22_000.0,
        };
        let report = regime_blocked_report(&status, date());
        assert!(report.contains("Market not bullish"));
        assert!(report.contains("21500.00"));
    }

    #[test]
    fn crash_report_shows_percentages() {
        let status = RegimeStatus::Crash {
            trailing_return: -0.18,
            threshold: -0.12,
        };
        let report = regime_blocked_report(&status, date());
        assert!(report.contains("Crash filter"));
        assert!(report.contains("-18.0%"));
        assert!(report.contains("-12.0%"));
    }

    #[test]
    fn coverage_report_shows_counts() {
        let report = coverage_shortfall_report(5, 10, 0.8, date());
        assert!(report.contains("5 of 10"));
        assert!(report.contains("0.80"));
        assert!(report.contains("untouched"));
    }
}
