#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use hwpx_batch::action::cli::run_conversion;
use hwpx_batch::backend::process::{ProcessBackend, ProcessBackendConfig};
use hwpx_batch::config::config::BackendKind;
use hwpx_batch::config::ports::ConfigPort;
use hwpx_batch::facade::conversion_facade::{BatchOrchestrator, BatchState};
use hwpx_batch::facade::traits::i_conversion::ConversionFacadeTrait;
use hwpx_batch::facade::worker::BatchWorker;
use hwpx_batch::models::conversion::{BatchRequest, FailureKind, FormatSpec, OutcomeStatus};
use hwpx_batch::models::event::BatchEvent;
use hwpx_batch::service::config_service::DefaultConfigAdapter;
use tempfile::TempDir;

// Copies the source unless its name contains "broken".
const CONVERTER: &str = r#"case "$0" in *broken*) exit 3 ;; esac; cp "$0" "$1""#;

fn sh_args(script: &str) -> Vec<String> {
    ["-c", script, "{source}", "{destination}"].iter().map(|s| s.to_string()).collect()
}

fn sh_backend(script: &str) -> ProcessBackend {
    ProcessBackend::new(ProcessBackendConfig {
        tool: PathBuf::from("/bin/sh"),
        timeout: Duration::from_secs(10),
        primary_args: sh_args(script),
        fallback_args: Vec::new(),
        format_token: "HWPX".to_string(),
    })
}

fn tree(files: &[&str]) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    for name in files {
        let path = input.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("document {}", name)).unwrap();
    }
    fs::create_dir_all(&output).unwrap();
    (dir, input, output)
}

fn drain(events: &Receiver<BatchEvent>) -> (Vec<(usize, usize)>, Vec<String>) {
    let mut progress = Vec::new();
    let mut logs = Vec::new();
    for event in events.try_iter() {
        match event {
            BatchEvent::Progress { completed, total } => progress.push((completed, total)),
            BatchEvent::Log { message, .. } => logs.push(message),
        }
    }
    (progress, logs)
}

fn request(input: &Path, output: &Path, recursive: bool) -> BatchRequest {
    BatchRequest {
        input_root: input.to_path_buf(),
        output_root: output.to_path_buf(),
        recursive,
    }
}

#[test]
fn recursive_batch_mirrors_tree_and_keeps_going_after_failures() {
    let (_dir, input, output) = tree(&["a.hwp", "broken.hwp", "sub/deeper/c.hwp", "notes.txt"]);
    let (sender, events) = unbounded();
    let mut orchestrator =
        BatchOrchestrator::new(Box::new(sh_backend(CONVERTER)), Box::new(sender), FormatSpec::default());

    let result = orchestrator.run_batch(&request(&input, &output, true)).unwrap();

    assert_eq!((result.succeeded, result.failed), (2, 1));
    let statuses: Vec<_> = result.outcomes.iter().map(|o| (o.source.clone(), o.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (input.join("a.hwp"), OutcomeStatus::Success),
            (input.join("broken.hwp"), OutcomeStatus::Failure),
            (input.join("sub/deeper/c.hwp"), OutcomeStatus::Success),
        ]
    );
    assert_eq!(result.outcomes[1].cause, Some(FailureKind::ToolInvocationFailure));
    assert_eq!(fs::read_to_string(output.join("sub/deeper/c.hwpx")).unwrap(), "document sub/deeper/c.hwp");
    assert!(!output.join("broken.hwpx").exists());
    assert!(!output.join("notes.hwpx").exists());
    assert_eq!(orchestrator.state(), BatchState::Completed);

    let (progress, logs) = drain(&events);
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(logs.last().unwrap(), "conversion finished: 2 succeeded, 1 failed");
}

#[test]
fn top_level_batch_skips_subfolders() {
    let (_dir, input, output) = tree(&["a.hwp", "sub/b.hwp"]);
    let (sender, _events) = unbounded::<BatchEvent>();
    let mut orchestrator =
        BatchOrchestrator::new(Box::new(sh_backend(CONVERTER)), Box::new(sender), FormatSpec::default());

    let result = orchestrator.run_batch(&request(&input, &output, false)).unwrap();

    assert_eq!(result.total(), 1);
    assert!(output.join("a.hwpx").is_file());
    assert!(!output.join("sub").exists());
}

#[test]
fn missing_converter_aborts_before_any_file() {
    let (_dir, input, output) = tree(&["a.hwp", "b.hwp"]);
    let backend = ProcessBackend::new(ProcessBackendConfig {
        tool: PathBuf::from("/no/such/converter"),
        ..ProcessBackendConfig::default()
    });
    let (sender, events) = unbounded();
    let mut orchestrator = BatchOrchestrator::new(Box::new(backend), Box::new(sender), FormatSpec::default());

    let result = orchestrator.run_batch(&request(&input, &output, false)).unwrap();

    assert_eq!((result.succeeded, result.failed), (0, 0));
    assert!(result.outcomes.is_empty());
    assert_eq!(orchestrator.state(), BatchState::Aborted);
    let (progress, logs) = drain(&events);
    assert!(progress.is_empty());
    assert!(logs.iter().any(|l| l.starts_with("initialization failed")));
}

#[test]
fn worker_runs_batch_off_the_calling_thread() {
    let (_dir, input, output) = tree(&["one.hwp", "two.hwp"]);
    let (sender, events) = unbounded();
    let orchestrator = BatchOrchestrator::new(Box::new(sh_backend(CONVERTER)), Box::new(sender), FormatSpec::default());
    let mut worker = BatchWorker::new(Box::new(orchestrator));

    worker.start(request(&input, &output, false)).unwrap();
    let result = worker.wait().unwrap();

    assert_eq!(result.succeeded, 2);
    let (progress, _) = drain(&events);
    assert_eq!(progress.last(), Some(&(2, 2)));

    // same orchestrator again, outputs are replaced
    worker.start(request(&input, &output, false)).unwrap();
    assert_eq!(worker.wait().unwrap().succeeded, 2);
}

#[test]
fn run_conversion_creates_output_root_and_reports() {
    let (dir, input, _) = tree(&["a.hwp", "broken.hwp"]);
    let output = dir.path().join("fresh").join("out");
    let mut config = DefaultConfigAdapter::new(
        input.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    )
    .get_config()
    .unwrap();
    config.backend = BackendKind::Process;
    config.tool_path = "/bin/sh".to_string();
    config.primary_args = sh_args(CONVERTER);
    config.fallback_args = Vec::new();
    config.no_progress = true;

    let report = run_conversion(&config).unwrap();

    assert!(output.join("a.hwpx").is_file());
    assert_eq!((report.result.succeeded, report.result.failed), (1, 1));
    assert!(!report.is_clean());
}

#[test]
fn run_conversion_rejects_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = DefaultConfigAdapter::new(
        dir.path().join("missing").to_string_lossy().into_owned(),
        dir.path().join("out").to_string_lossy().into_owned(),
    )
    .get_config()
    .unwrap();

    assert!(run_conversion(&config).is_err());
    assert!(!dir.path().join("out").exists());
}
