//! Configuration validation.
//!
//! Every field is checked up front so a bad config fails the run before any
//! price data is fetched or state touched.

use chrono::Weekday;

use crate::domain::error::RebalancerError;
use crate::ports::config_port::ConfigPort;

pub fn validate_fund_config(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    validate_initial_capital(config)?;
    validate_target_size(config)?;
    validate_max_adds(config)?;
    validate_position_multiplier(config)?;
    validate_brokerage_rate(config)?;
    validate_cash_buffer(config)?;
    validate_min_coverage(config)?;
    validate_weekday(config)?;
    Ok(())
}

pub fn validate_signal_config(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    validate_window(config, "signals", "min_history", 200)?;
    validate_window(config, "signals", "short_momentum_window", 63)?;
    validate_window(config, "signals", "long_momentum_window", 126)?;
    validate_window(config, "signals", "short_trend_window", 50)?;
    validate_window(config, "signals", "long_trend_window", 200)?;
    validate_window_order(
        config,
        "signals",
        ("short_momentum_window", 63),
        ("long_momentum_window", 126),
    )?;
    validate_window_order(
        config,
        "signals",
        ("short_trend_window", 50),
        ("long_trend_window", 200),
    )?;
    Ok(())
}

pub fn validate_regime_config(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    if config
        .get_string("regime", "index_symbol")
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        return Err(RebalancerError::ConfigMissing {
            section: "regime".into(),
            key: "index_symbol".into(),
        });
    }
    validate_window(config, "regime", "trend_window", 200)?;
    validate_window(config, "regime", "crash_lookback", 63)?;

    let threshold = config.get_double("regime", "crash_threshold", -0.12);
    if threshold > 0.0 || threshold <= -1.0 {
        return Err(RebalancerError::ConfigInvalid {
            section: "regime".into(),
            key: "crash_threshold".into(),
            reason: "crash_threshold must be in (-1, 0]".into(),
        });
    }
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    for key in ["price_dir", "state_dir"] {
        if config
            .get_string("data", key)
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
        {
            return Err(RebalancerError::ConfigMissing {
                section: "data".into(),
                key: key.into(),
            });
        }
    }
    validate_window(config, "data", "lookback_days", 260)?;
    Ok(())
}

/// Accepts full weekday names or three-letter abbreviations, any case.
pub fn parse_weekday(input: &str) -> Option<Weekday> {
    input.trim().parse::<Weekday>().ok()
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config.get_double("fund", "initial_capital", 50_000.0);
    if value <= 0.0 {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_target_size(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config.get_int("fund", "target_size", 10);
    if value < 1 {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "target_size".to_string(),
            reason: "target_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_max_adds(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config.get_int("fund", "max_adds", 2);
    if value < 0 {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "max_adds".to_string(),
            reason: "max_adds must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_position_multiplier(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config.get_double("fund", "max_position_multiplier", 2.0);
    if value < 1.0 {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "max_position_multiplier".to_string(),
            reason: "max_position_multiplier must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_brokerage_rate(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config.get_double("fund", "brokerage_rate", 0.001);
    if !(0.0..1.0).contains(&value) {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "brokerage_rate".to_string(),
            reason: "brokerage_rate must be in [0, 1)".to_string(),
        });
    }
    Ok(())
}

fn validate_cash_buffer(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config.get_double("fund", "min_cash_buffer", 0.0);
    if value < 0.0 {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "min_cash_buffer".to_string(),
            reason: "min_cash_buffer must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_min_coverage(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config.get_double("fund", "min_coverage", 0.8);
    if value <= 0.0 || value > 1.0 {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "min_coverage".to_string(),
            reason: "min_coverage must be in (0, 1]".to_string(),
        });
    }
    Ok(())
}

fn validate_weekday(config: &dyn ConfigPort) -> Result<(), RebalancerError> {
    let value = config
        .get_string("fund", "rebalance_weekday")
        .unwrap_or_else(|| "fri".to_string());
    if parse_weekday(&value).is_none() {
        return Err(RebalancerError::ConfigInvalid {
            section: "fund".to_string(),
            key: "rebalance_weekday".to_string(),
            reason: format!("unrecognized weekday '{value}'"),
        });
    }
    Ok(())
}

fn validate_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), RebalancerError> {
    let value = config.get_int(section, key, default);
    if value < 1 {
        return Err(RebalancerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be at least 1"),
        });
    }
    Ok(())
}

fn validate_window_order(
    config: &dyn ConfigPort,
    section: &str,
    short: (&str, i64),
    long: (&str, i64),
) -> Result<(), RebalancerError> {
    let short_value = config.get_int(section, short.0, short.1);
    let long_value = config.get_int(section, long.0, long.1);
    if short_value >= long_value {
        return Err(RebalancerError::ConfigInvalid {
            section: section.to_string(),
            key: short.0.to_string(),
            reason: format!("{} must be shorter than {}", short.0, long.0),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn defaults_pass_validation() {
        let config = adapter("[fund]\n[signals]\n[regime]\nindex_symbol = NIFTY\n");
        assert!(validate_fund_config(&config).is_ok());
        assert!(validate_signal_config(&config).is_ok());
        assert!(validate_regime_config(&config).is_ok());
    }

    #[test]
    fn rejects_non_positive_capital() {
        let config = adapter("[fund]\ninitial_capital = 0\n");
        assert!(matches!(
            validate_fund_config(&config),
            Err(RebalancerError::ConfigInvalid { key, .. }) if key == "initial_capital"
        ));
    }

    #[test]
    fn rejects_zero_target_size() {
        let config = adapter("[fund]\ntarget_size = 0\n");
        assert!(validate_fund_config(&config).is_err());
    }

    #[test]
    fn rejects_brokerage_of_one() {
        let config = adapter("[fund]\nbrokerage_rate = 1.0\n");
        assert!(validate_fund_config(&config).is_err());
    }

    #[test]
    fn rejects_bad_weekday() {
        let config = adapter("[fund]\nrebalance_weekday = someday\n");
        assert!(matches!(
            validate_fund_config(&config),
            Err(RebalancerError::ConfigInvalid { key, .. }) if key == "rebalance_weekday"
        ));
    }

    #[test]
    fn accepts_weekday_names_and_abbreviations() {
        assert_eq!(parse_weekday("fri"), Some(Weekday::Fri));
        assert_eq!(parse_weekday("Monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday(" SUN "), Some(Weekday::Sun));
        assert_eq!(parse_weekday("humpday"), None);
    }

    #[test]
    fn rejects_inverted_momentum_windows() {
        let config = adapter("[signals]\nshort_momentum_window = 126\nlong_momentum_window = 63\n");
        assert!(validate_signal_config(&config).is_err());
    }

    #[test]
    fn regime_requires_index_symbol() {
        let config = adapter("[regime]\n");
        assert!(matches!(
            validate_regime_config(&config),
            Err(RebalancerError::ConfigMissing { key, .. }) if key == "index_symbol"
        ));
    }

    #[test]
    fn rejects_positive_crash_threshold() {
        let config = adapter("[regime]\nindex_symbol = NIFTY\ncrash_threshold = 0.05\n");
        assert!(validate_regime_config(&config).is_err());
    }

    #[test]
    fn data_config_requires_directories() {
        let config = adapter("[data]\nprice_dir = data/prices\n");
        assert!(matches!(
            validate_data_config(&config),
            Err(RebalancerError::ConfigMissing { key, .. }) if key == "state_dir"
        ));

        let config = adapter("[data]\nprice_dir = data/prices\nstate_dir = data/state\n");
        assert!(validate_data_config(&config).is_ok());
    }
}
