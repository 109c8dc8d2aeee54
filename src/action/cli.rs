use std::io;
use clap::Parser;
use crossbeam_channel::unbounded;
use crate::action::interactive::process_interactive_mode;
use crate::action::presenter::Presenter;
use crate::backend::bridge::{default_bridge_args, DEFAULT_BRIDGE_PROGRAM};
use crate::backend::process::{DEFAULT_FALLBACK_ARGS, DEFAULT_PRIMARY_ARGS, DEFAULT_TIMEOUT_SECS, DEFAULT_TOOL_PATH};
use crate::config::config::{validate_folders, validate_input_path, validate_output_path, validate_templates, BackendKind, Cli};
use crate::config::ports::{AppConfig, ConfigPort};
use crate::facade::conversion_facade::BatchOrchestrator;
use crate::facade::worker::BatchWorker;
use crate::models::conversion::{BatchResult, FormatSpec};
use crate::service::config_service::{build_backend, build_request, to_strings, ConfigService, DefaultConfigAdapter};
use crate::utils::utils::setup_logging;

/// What a finished run reports back to `main`.
#[derive(Debug)]
pub struct RunReport {
    pub output_dir: String,
    pub result: BatchResult,
    /// Error events seen during the run, including a failed backend start.
    pub errors: usize,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.errors == 0 && self.result.failed == 0
    }
}

pub fn process_args(args: Vec<String>) -> io::Result<RunReport> {
    if args.len() == 1 {
        process_interactive_mode()
    } else {
        process_cli_mode()
    }
}

pub fn process_cli_mode() -> io::Result<RunReport> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    // only the two folders given
    let is_default_config = cli.backend.is_none()
        && cli.tool.is_none()
        && cli.timeout_secs.is_none()
        && cli.primary_args.is_none()
        && cli.fallback_args.is_none()
        && cli.bridge_program.is_none()
        && cli.bridge_args.is_none()
        && !cli.recursive
        && !cli.no_progress;

    let config_port: Box<dyn ConfigPort> = if is_default_config {
        log::info!("no options given, using defaults: process backend, top folder only");
        Box::new(DefaultConfigAdapter::new(cli.input.clone(), cli.output.clone()))
    } else {
        Box::new(CliConfigAdapter::new(cli.clone()))
    };

    let config_service = ConfigService::new(config_port);
    let mut config = config_service.get_config()?;
    config.log_level = cli.log_level.clone();

    if cli.show_config {
        println!("Effective configuration: {:#?}", config);
    }

    run_conversion(&config)
}

/// Validates the folders, runs one batch on the worker thread and shows its
/// events until it ends.
pub fn run_conversion(config: &AppConfig) -> io::Result<RunReport> {
    validate_folders(&config.input, &config.output)?;

    let (sender, events) = unbounded();
    let orchestrator = BatchOrchestrator::new(build_backend(config), Box::new(sender), config.format.clone());
    let mut worker = BatchWorker::new(Box::new(orchestrator));
    worker.start(build_request(config)).map_err(io::Error::other)?;

    let mut presenter = Presenter::new(config.no_progress);
    let result = presenter.drive(&mut worker, &events).map_err(io::Error::other)?;
    presenter.finish(&result);

    Ok(RunReport {
        output_dir: config.output.clone(),
        result,
        errors: presenter.errors(),
    })
}

// CLI configuration adapter
pub struct CliConfigAdapter {
    cli: Cli,
}

impl CliConfigAdapter {
    pub fn new(cli: Cli) -> Self {
        CliConfigAdapter { cli }
    }
}

impl ConfigPort for CliConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        validate_input_path(&self.cli.input)?;
        validate_output_path(&self.cli.output)?;

        let primary_args = self.cli.primary_args.clone().unwrap_or_else(|| to_strings(DEFAULT_PRIMARY_ARGS));
        let fallback_args = self.cli.fallback_args.clone().unwrap_or_else(|| to_strings(DEFAULT_FALLBACK_ARGS));
        validate_templates("--primary-args", &primary_args)?;
        validate_templates("--fallback-args", &fallback_args)?;
        if primary_args.is_empty() && fallback_args.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "at least one of --primary-args and --fallback-args must be set",
            ));
        }

        let timeout_secs = self.cli.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "--timeout-secs must be at least 1"));
        }

        let backend = self.cli.backend.unwrap_or(BackendKind::Process);
        if backend == BackendKind::Automation && (self.cli.tool.is_some() || self.cli.timeout_secs.is_some()) {
            log::warn!("--tool and --timeout-secs only apply to the process backend and are ignored");
        }

        Ok(AppConfig {
            input: self.cli.input.clone(),
            output: self.cli.output.clone(),
            recursive: self.cli.recursive,
            backend,
            tool_path: self.cli.tool.clone().unwrap_or_else(|| DEFAULT_TOOL_PATH.to_string()),
            timeout_secs,
            primary_args,
            fallback_args,
            bridge_program: self
                .cli
                .bridge_program
                .clone()
                .unwrap_or_else(|| DEFAULT_BRIDGE_PROGRAM.to_string()),
            bridge_args: self.cli.bridge_args.clone().unwrap_or_else(default_bridge_args),
            format: FormatSpec::default(),
            no_progress: self.cli.no_progress,
            log_level: self.cli.log_level.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(extra: &[&str], input: &str) -> Cli {
        let mut args = vec!["hwpx-batch", input, "-o", "out"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        let config = CliConfigAdapter::new(cli(&["-r", "--tool", "/opt/conv", "--timeout-secs", "5"], input))
            .get_config()
            .unwrap();
        assert!(config.recursive);
        assert_eq!(config.tool_path, "/opt/conv");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.fallback_args, to_strings(DEFAULT_FALLBACK_ARGS));
        assert_eq!(config.bridge_program, DEFAULT_BRIDGE_PROGRAM);
    }

    #[test]
    fn rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        assert!(CliConfigAdapter::new(cli(&["--timeout-secs", "0"], input)).get_config().is_err());
        assert!(CliConfigAdapter::new(cli(&["--primary-args", "{source}"], input)).get_config().is_err());
        assert!(CliConfigAdapter::new(cli(&["-r"], &dir.path().join("missing").to_string_lossy()))
            .get_config()
            .is_err());
    }

    #[test]
    fn report_is_clean_only_without_errors() {
        let report = RunReport {
            output_dir: "out".to_string(),
            result: BatchResult::empty().finalize(),
            errors: 1,
        };
        assert!(!report.is_clean());
    }
}
