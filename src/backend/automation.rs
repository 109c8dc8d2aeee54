//! Converter driven through one long-lived automation session.
//!
//! The session is opened once in `initialize` and reused for every file, so
//! the word processor starts only once per batch. Each conversion is open,
//! then save-as, then clear. Clear runs even when open or save-as failed.

use std::path::Path;
use log::{debug, info, warn};
use crate::backend::traits::i_backend::ConversionBackend;
use crate::error::{AutomationFault, InitError, NotInitialized};
use crate::models::conversion::{ConversionOutcome, ConversionTask, FailureKind};
use crate::utils::utils::{format_file_size, remove_stale_output, verified_output_size};

/// Requests understood by an attached application instance.
pub trait AutomationSession: Send {
    /// Opens `source`, forcing past format-version warnings.
    fn open(&mut self, source: &Path) -> Result<(), AutomationFault>;
    fn save_as(&mut self, destination: &Path, format_token: &str) -> Result<(), AutomationFault>;
    /// Discards the currently open document.
    fn clear(&mut self) -> Result<(), AutomationFault>;
    fn quit(&mut self) -> Result<(), AutomationFault>;
}

/// Launches or attaches to the application with its window hidden.
pub trait AutomationConnector: Send {
    fn describe(&self) -> String;
    fn connect(&mut self) -> Result<Box<dyn AutomationSession>, InitError>;
}

pub struct AutomationBackend {
    connector: Box<dyn AutomationConnector>,
    session: Option<Box<dyn AutomationSession>>,
    format_token: String,
}

impl AutomationBackend {
    pub fn new(connector: Box<dyn AutomationConnector>, format_token: &str) -> Self {
        AutomationBackend {
            connector,
            session: None,
            format_token: format_token.to_string(),
        }
    }
}

impl ConversionBackend for AutomationBackend {
    fn name(&self) -> &'static str {
        "automation"
    }

    fn initialize(&mut self) -> Result<String, InitError> {
        if self.session.is_none() {
            let session = self.connector.connect()?;
            info!("automation session attached via {}", self.connector.describe());
            self.session = Some(session);
        }
        Ok(format!("word processor ready ({})", self.connector.describe()))
    }

    fn convert(&mut self, task: &ConversionTask) -> Result<ConversionOutcome, NotInitialized> {
        let session = self.session.as_mut().ok_or(NotInitialized)?;
        let name = task.source_name();
        remove_stale_output(&task.destination);

        let converted = session
            .open(&task.source)
            .and_then(|()| session.save_as(&task.destination, &self.format_token));

        if let Err(e) = session.clear() {
            warn!("could not clear automation session after {}: {}", name, e);
        }

        let outcome = match converted {
            Ok(()) => match verified_output_size(&task.destination) {
                Some(size) => ConversionOutcome::success(task, format!("converted: {} ({})", name, format_file_size(size))),
                None => ConversionOutcome::failure(
                    task,
                    FailureKind::AutomationError,
                    format!("conversion failed: {} (save reported success but no output was written)", name),
                ),
            },
            Err(e) => ConversionOutcome::failure(
                task,
                FailureKind::AutomationError,
                format!("conversion failed: {} - {}", name, e),
            ),
        };
        Ok(outcome)
    }

    fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            match session.quit() {
                Ok(()) => debug!("automation session closed"),
                Err(e) => warn!("automation session did not quit cleanly: {}", e),
            }
        }
    }
}

impl Drop for AutomationBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
