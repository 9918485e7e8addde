//! RecordSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for observation log sinks.

use crate::{ContractError, ObservationRecord};

/// Log output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append one observation row
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, record: &ObservationRecord) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
