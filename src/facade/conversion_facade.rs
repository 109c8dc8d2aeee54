use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use log::{debug, error, info};
use crate::backend::traits::i_backend::ConversionBackend;
use crate::error::OrchestratorError;
use crate::facade::traits::i_conversion::ConversionFacadeTrait;
use crate::models::conversion::{
    display_name, BatchRequest, BatchResult, ConversionOutcome, ConversionTask, FailureKind, FormatSpec,
};
use crate::models::event::{BatchEvent, EventSink, Severity};
use crate::utils::discovery::discover;
use crate::utils::path_mapper::PathMapper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Discovering,
    Converting,
    Completed,
    Aborted,
}

/// Runs batches against one backend, reporting through one event sink.
pub struct BatchOrchestrator {
    backend: Box<dyn ConversionBackend>,
    sink: Box<dyn EventSink>,
    format: FormatSpec,
    state: BatchState,
}

impl BatchOrchestrator {
    pub fn new(backend: Box<dyn ConversionBackend>, sink: Box<dyn EventSink>, format: FormatSpec) -> Self {
        BatchOrchestrator {
            backend,
            sink,
            format,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }
}

/// Shuts the backend down when dropped, whichever way the batch ends.
struct ShutdownGuard<'a> {
    backend: &'a mut dyn ConversionBackend,
}

impl Drop for ShutdownGuard<'_> {
    fn drop(&mut self) {
        self.backend.shutdown();
        debug!("{} backend shut down", self.backend.name());
    }
}

impl ConversionFacadeTrait for BatchOrchestrator {
    fn run_batch(&mut self, request: &BatchRequest) -> Result<BatchResult, OrchestratorError> {
        if matches!(self.state, BatchState::Discovering | BatchState::Converting) {
            return Err(OrchestratorError::AlreadyRunning);
        }
        let BatchOrchestrator { backend, sink, format, state } = self;
        let sink: &dyn EventSink = &**sink;
        let mut result = BatchResult::empty();

        *state = BatchState::Discovering;
        info!(
            "starting batch, input: {}, output: {}, recursive: {}",
            request.input_root.display(),
            request.output_root.display(),
            request.recursive
        );
        emit_log(
            sink,
            Severity::Info,
            format!("searching for .{} files in {}", format.source_extension, request.input_root.display()),
        );

        let discovery = discover(&request.input_root, request.recursive, &format.source_extension);
        for diagnostic in &discovery.diagnostics {
            emit_log(sink, Severity::Warning, diagnostic.to_string());
        }
        if discovery.files.is_empty() {
            emit_log(sink, Severity::Warning, format!("no .{} files found to convert", format.source_extension));
            *state = BatchState::Aborted;
            return Ok(result.finalize());
        }
        let total = discovery.files.len();
        emit_log(sink, Severity::Info, format!("found {} .{} file(s)", total, format.source_extension));

        let mut guard = ShutdownGuard { backend: &mut **backend };
        match guard.backend.initialize() {
            Ok(ready) => emit_log(sink, Severity::Info, ready),
            Err(e) => {
                error!("{} backend failed to initialize: {}", guard.backend.name(), e);
                emit_log(sink, Severity::Error, format!("initialization failed: {}", e));
                *state = BatchState::Aborted;
                return Ok(result.finalize());
            }
        }

        *state = BatchState::Converting;
        let mapper = PathMapper::new(&request.input_root, &request.output_root, &format.target_extension);
        for (index, source) in discovery.files.iter().enumerate() {
            let outcome = match mapper.map(source) {
                Ok(destination) => {
                    let task = ConversionTask::new(source.clone(), destination);
                    let backend = &mut *guard.backend;
                    match panic::catch_unwind(AssertUnwindSafe(|| backend.convert(&task))) {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(e)) => {
                            error!("backend contract violated while converting {}: {}", source.display(), e);
                            emit_log(sink, Severity::Error, format!("internal error: {}", e));
                            *state = BatchState::Aborted;
                            return Err(e.into());
                        }
                        Err(payload) => {
                            let reason = panic_message(payload.as_ref());
                            error!("converting {} panicked: {}", source.display(), reason);
                            ConversionOutcome::failure(
                                &task,
                                FailureKind::Unexpected,
                                format!("unexpected error: {} - {}", task.source_name(), reason),
                            )
                        }
                    }
                }
                Err(e) => ConversionOutcome::unmapped(
                    source,
                    format!("cannot prepare output for {}: {}", display_name(source), e),
                ),
            };

            report_outcome(sink, &outcome);
            result.record(outcome);
            sink.emit(BatchEvent::Progress { completed: index + 1, total });
        }
        drop(guard);

        *state = BatchState::Completed;
        emit_log(sink, Severity::Info, "=".repeat(50));
        emit_log(
            sink,
            Severity::Info,
            format!("conversion finished: {} succeeded, {} failed", result.succeeded, result.failed),
        );
        info!("batch finished: {} succeeded, {} failed", result.succeeded, result.failed);
        Ok(result.finalize())
    }
}

fn emit_log(sink: &dyn EventSink, severity: Severity, message: impl Into<String>) {
    sink.emit(BatchEvent::Log {
        message: message.into(),
        severity,
    });
}

fn report_outcome(sink: &dyn EventSink, outcome: &ConversionOutcome) {
    if outcome.is_success() {
        emit_log(sink, Severity::Success, format!("✓ {}", outcome.message));
    } else {
        let cause = outcome.cause.map(|c| format!(" [{}]", c)).unwrap_or_default();
        emit_log(sink, Severity::Error, format!("✗ {}{}", outcome.message, cause));
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
