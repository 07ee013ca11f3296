//! Concrete adapter implementations for ports.

pub mod csv_price_adapter;
pub mod csv_state_adapter;
pub mod file_config_adapter;
pub mod telegram_adapter;
