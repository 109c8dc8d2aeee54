use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};

/// Source/target format pair handled by a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    /// Extension of convertible inputs, without the dot.
    pub source_extension: String,
    /// Extension written on outputs, without the dot.
    pub target_extension: String,
    /// Token handed to the external tool to select the output format.
    pub format_token: String,
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec {
            source_extension: "hwp".to_string(),
            target_extension: "hwpx".to_string(),
            format_token: "HWPX".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub recursive: bool,
}

/// One source file and where its converted copy goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl ConversionTask {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        ConversionTask {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn source_name(&self) -> String {
        display_name(&self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Why a single file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Path,
    Timeout,
    ToolInvocationFailure,
    AutomationError,
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Path => "path error",
            FailureKind::Timeout => "timeout",
            FailureKind::ToolInvocationFailure => "tool invocation failure",
            FailureKind::AutomationError => "automation error",
            FailureKind::Unexpected => "unexpected error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    /// `None` only when no destination could be mapped for the source.
    pub destination: Option<PathBuf>,
    pub status: OutcomeStatus,
    pub message: String,
    pub cause: Option<FailureKind>,
}

impl ConversionOutcome {
    pub fn success(task: &ConversionTask, message: impl Into<String>) -> Self {
        ConversionOutcome {
            source: task.source.clone(),
            destination: Some(task.destination.clone()),
            status: OutcomeStatus::Success,
            message: message.into(),
            cause: None,
        }
    }

    pub fn failure(task: &ConversionTask, cause: FailureKind, message: impl Into<String>) -> Self {
        ConversionOutcome {
            source: task.source.clone(),
            destination: Some(task.destination.clone()),
            status: OutcomeStatus::Failure,
            message: message.into(),
            cause: Some(cause),
        }
    }

    /// Failure recorded before a task existed, e.g. an unmappable path.
    pub fn unmapped(source: &Path, message: impl Into<String>) -> Self {
        ConversionOutcome {
            source: source.to_path_buf(),
            destination: None,
            status: OutcomeStatus::Failure,
            message: message.into(),
            cause: Some(FailureKind::Path),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Aggregate of a finished (or aborted) batch.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<ConversionOutcome>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl BatchResult {
    pub fn empty() -> Self {
        let now = Local::now();
        BatchResult {
            succeeded: 0,
            failed: 0,
            outcomes: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn record(&mut self, outcome: ConversionOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn finalize(mut self) -> Self {
        self.finished_at = Local::now();
        self
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_by_status() {
        let task = ConversionTask::new("/in/a.hwp", "/out/a.hwpx");
        let mut result = BatchResult::empty();
        result.record(ConversionOutcome::success(&task, "ok"));
        result.record(ConversionOutcome::failure(&task, FailureKind::Timeout, "slow"));
        result.record(ConversionOutcome::unmapped(Path::new("/elsewhere/b.hwp"), "outside"));

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 2);
        assert_eq!(result.total(), 3);
        assert_eq!(result.outcomes[2].destination, None);
        assert_eq!(result.outcomes[2].cause, Some(FailureKind::Path));
    }

    #[test]
    fn default_format_is_hwp_to_hwpx() {
        let format = FormatSpec::default();
        assert_eq!(format.source_extension, "hwp");
        assert_eq!(format.target_extension, "hwpx");
        assert_eq!(format.format_token, "HWPX");
    }
}
