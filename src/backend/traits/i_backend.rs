use crate::error::{InitError, NotInitialized};
use crate::models::conversion::{ConversionOutcome, ConversionTask};

// Backend port, wraps the external application
pub trait ConversionBackend: Send {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Establishes the external session. Calling it again after a success is a
    /// no-op that succeeds.
    /// # Returns
    /// - a human-readable "ready" message, or why the application is unavailable
    fn initialize(&mut self) -> Result<String, InitError>;

    /// Converts one document. Expected failures (missing tool, bad input,
    /// timeout, automation fault) come back as `Failure` outcomes; `Err` is
    /// reserved for calls made before `initialize`.
    fn convert(&mut self, task: &ConversionTask) -> Result<ConversionOutcome, NotInitialized>;

    /// Releases the external session. Idempotent, and safe after a failed
    /// `initialize`.
    fn shutdown(&mut self);
}
