//! Outbound notification port trait.

use crate::domain::error::RebalancerError;

/// Fire-and-forget message channel. Callers treat failures as best-effort:
/// log and continue, never abort the run.
pub trait NotifyPort {
    fn send(&self, text: &str) -> Result<(), RebalancerError>;
}
