//! Error types for the conversion engine.
//!
//! Per-file problems never surface as these errors past the file boundary; they
//! are folded into a `ConversionOutcome` with a `FailureKind`. Only batch setup
//! problems and contract violations travel as `Err`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Destination could not be derived for a source file.
#[derive(Debug, Error)]
pub enum PathError {
    /// Source is not located under the input root.
    #[error("{source_path} is not under input root {root}")]
    OutsideRoot {
        source_path: PathBuf,
        root: PathBuf,
    },

    /// Parent directory of the destination could not be created.
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Non-fatal problem met while listing the input tree.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("input root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// External tool or application is unavailable. Fatal to the batch.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("converter not found at {0}; check that the word processor is installed")]
    ToolNotFound(PathBuf),

    #[error("cannot launch automation bridge {program}: {source}")]
    BridgeLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("automation session unavailable: {0}")]
    Automation(#[from] AutomationFault),
}

/// `convert` was called before a successful `initialize`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("backend used before initialize()")]
pub struct NotInitialized;

/// A request to the automation session failed.
#[derive(Debug, Error)]
pub enum AutomationFault {
    #[error("automation bridge I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("automation bridge closed its output")]
    Disconnected,

    #[error("unexpected reply from automation bridge: {0:?}")]
    Protocol(String),

    #[error("{0}")]
    Rejected(String),
}

/// Errors returned by the orchestrator and its worker.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("a batch is already running")]
    AlreadyRunning,

    #[error("no batch has been started")]
    NotStarted,

    #[error(transparent)]
    NotInitialized(#[from] NotInitialized),

    #[error("cannot start batch worker: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error("batch worker panicked: {0}")]
    WorkerPanicked(String),
}
