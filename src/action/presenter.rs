use std::time::Duration;
use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use crate::error::OrchestratorError;
use crate::facade::worker::BatchWorker;
use crate::models::conversion::BatchResult;
use crate::models::event::{BatchEvent, Severity};
use crate::utils::utils::{create_progress_bar, ProgressManager};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

// Owns all display state; the batch thread only talks to it through events
pub struct Presenter {
    progress: ProgressManager,
    errors: usize,
}

impl Presenter {
    pub fn new(no_progress: bool) -> Self {
        Presenter {
            progress: create_progress_bar(0, no_progress),
            errors: 0,
        }
    }

    pub fn handle(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Progress { completed, total } => {
                self.progress.update(completed as u64, total as u64);
            }
            BatchEvent::Log { message, severity } => {
                if severity == Severity::Error {
                    self.errors += 1;
                }
                log::debug!(target: "hwpx_batch::events", "{:?}: {}", severity, message);
                self.progress.println(&format_line(Local::now(), severity, &message));
            }
        }
    }

    /// Shows events until the worker's batch ends, then collects its result.
    pub fn drive(
        &mut self,
        worker: &mut BatchWorker,
        events: &Receiver<BatchEvent>,
    ) -> Result<BatchResult, OrchestratorError> {
        loop {
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout) if worker.is_running() => {}
                Err(_) => break,
            }
        }
        // events sent between the last poll and the thread exiting
        for event in events.try_iter() {
            self.handle(event);
        }
        worker.wait()
    }

    pub fn finish(&self, result: &BatchResult) {
        self.progress.finish(result.succeeded, result.failed);
    }

    /// Error events seen so far, per-file failures and setup failures alike.
    pub fn errors(&self) -> usize {
        self.errors
    }
}

pub fn format_line(at: DateTime<Local>, severity: Severity, message: &str) -> String {
    let prefix = match severity {
        Severity::Warning => "warning: ",
        _ => "",
    };
    format!("[{}] {}{}", at.format("%H:%M:%S"), prefix, message)
}
