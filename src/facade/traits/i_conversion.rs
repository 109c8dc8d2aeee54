use crate::error::OrchestratorError;
use crate::models::conversion::{BatchRequest, BatchResult};

// Facade port, coordinates one batch run
pub trait ConversionFacadeTrait: Send {
    /// Runs a whole batch: discovery, backend setup, per-file conversion.
    /// # Returns
    /// - the aggregated result, with zero counts when the batch aborted during
    ///   setup; `Err` only for a run already in flight or a backend contract
    ///   violation
    fn run_batch(&mut self, request: &BatchRequest) -> Result<BatchResult, OrchestratorError>;
}
