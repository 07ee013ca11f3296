//! Core domain types and logic.

pub mod price_table;
pub mod scorer;
pub mod regime;
pub mod selector;
pub mod position;
pub mod book;
pub mod rebalance;
pub mod nav;
pub mod report;
pub mod universe;
pub mod config_validation;
pub mod error;
