//! Converter driven as one subprocess per attempt.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use crate::backend::traits::i_backend::ConversionBackend;
use crate::error::{InitError, NotInitialized};
use crate::models::conversion::{ConversionOutcome, ConversionTask, FailureKind};
use crate::utils::utils::{format_file_size, hide_console_window, remove_stale_output, verified_output_size};

pub const DEFAULT_TOOL_PATH: &str = r"C:\Program Files (x86)\Hnc\Office 2024\HOffice130\Bin\HwpConverter.exe";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// `<tool> <source> <format> <destination>`
pub const DEFAULT_PRIMARY_ARGS: &[&str] = &["{source}", "{format}", "{destination}"];
/// `<tool> -i <source> -o <destination> -f <format>`
pub const DEFAULT_FALLBACK_ARGS: &[&str] = &["-i", "{source}", "-o", "{destination}", "-f", "{format}"];

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ProcessBackendConfig {
    pub tool: PathBuf,
    pub timeout: Duration,
    /// Argument template tried first. `{source}`, `{destination}` and
    /// `{format}` are substituted.
    pub primary_args: Vec<String>,
    /// Tried once when the primary attempt leaves no usable output. Empty
    /// disables the retry.
    pub fallback_args: Vec<String>,
    pub format_token: String,
}

impl Default for ProcessBackendConfig {
    fn default() -> Self {
        ProcessBackendConfig {
            tool: PathBuf::from(DEFAULT_TOOL_PATH),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            primary_args: DEFAULT_PRIMARY_ARGS.iter().map(|s| s.to_string()).collect(),
            fallback_args: DEFAULT_FALLBACK_ARGS.iter().map(|s| s.to_string()).collect(),
            format_token: "HWPX".to_string(),
        }
    }
}

enum Attempt {
    Exited(ExitStatus),
    TimedOut,
    Failed(io::Error),
}

pub struct ProcessBackend {
    config: ProcessBackendConfig,
    initialized: bool,
}

impl ProcessBackend {
    pub fn new(config: ProcessBackendConfig) -> Self {
        ProcessBackend { config, initialized: false }
    }

    fn run_attempt(&self, args: &[OsString]) -> Attempt {
        let mut cmd = Command::new(&self.config.tool);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        hide_console_window(&mut cmd);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return Attempt::Failed(e),
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Attempt::Exited(status),
                Ok(None) => {
                    let elapsed = started.elapsed();
                    if elapsed >= self.config.timeout {
                        terminate(&mut child);
                        return Attempt::TimedOut;
                    }
                    thread::sleep(POLL_INTERVAL.min(self.config.timeout - elapsed));
                }
                Err(e) => {
                    terminate(&mut child);
                    return Attempt::Failed(e);
                }
            }
        }
    }
}

impl ConversionBackend for ProcessBackend {
    fn name(&self) -> &'static str {
        "process"
    }

    fn initialize(&mut self) -> Result<String, InitError> {
        if !self.initialized {
            if !self.config.tool.exists() {
                return Err(InitError::ToolNotFound(self.config.tool.clone()));
            }
            self.initialized = true;
            info!("using converter {}", self.config.tool.display());
        }
        Ok(format!("converter ready: {}", self.config.tool.display()))
    }

    fn convert(&mut self, task: &ConversionTask) -> Result<ConversionOutcome, NotInitialized> {
        if !self.initialized {
            return Err(NotInitialized);
        }
        let name = task.source_name();
        let conventions = [("primary", &self.config.primary_args), ("fallback", &self.config.fallback_args)];

        for (label, template) in conventions {
            if template.is_empty() {
                continue;
            }
            remove_stale_output(&task.destination);
            let args = substitute_args(template, &task.source, &task.destination, &self.config.format_token);
            debug!("{} attempt for {}: {:?}", label, name, args);

            match self.run_attempt(&args) {
                Attempt::Exited(status) => {
                    if let Some(size) = verified_output_size(&task.destination) {
                        return Ok(ConversionOutcome::success(
                            task,
                            format!("converted: {} ({})", name, format_file_size(size)),
                        ));
                    }
                    warn!("{} argument convention produced no output for {} ({})", label, name, status);
                }
                Attempt::TimedOut => {
                    return Ok(ConversionOutcome::failure(
                        task,
                        FailureKind::Timeout,
                        format!("conversion timed out after {:?}: {}", self.config.timeout, name),
                    ));
                }
                Attempt::Failed(e) => {
                    return Ok(ConversionOutcome::failure(
                        task,
                        FailureKind::ToolInvocationFailure,
                        format!("conversion error: {} - {}", name, e),
                    ));
                }
            }
        }

        Ok(ConversionOutcome::failure(
            task,
            FailureKind::ToolInvocationFailure,
            format!("conversion failed: {} (no output produced)", name),
        ))
    }

    fn shutdown(&mut self) {
        if self.initialized {
            debug!("process backend released");
        }
        self.initialized = false;
    }
}

/// Replaces `{source}`, `{destination}` and `{format}` in each template argument.
///
/// An argument that is exactly a path placeholder receives the path as-is, so
/// names that are not valid Unicode reach the converter unchanged.
pub fn substitute_args(template: &[String], source: &Path, destination: &Path, format: &str) -> Vec<OsString> {
    template
        .iter()
        .map(|arg| match arg.as_str() {
            "{source}" => source.as_os_str().to_os_string(),
            "{destination}" => destination.as_os_str().to_os_string(),
            _ => OsString::from(embed_paths(arg, source, destination, format)),
        })
        .collect()
}

fn embed_paths(arg: &str, source: &Path, destination: &Path, format: &str) -> String {
    for (placeholder, path) in [("{source}", source), ("{destination}", destination)] {
        if arg.contains(placeholder) && path.to_str().is_none() {
            warn!(
                "{} is not valid Unicode and is embedded in {:?}; the converter receives a lossy copy",
                path.display(),
                arg
            );
        }
    }
    arg.replace("{source}", &source.to_string_lossy())
        .replace("{destination}", &destination.to_string_lossy())
        .replace("{format}", format)
}

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("failed to kill converter process {}: {}", child.id(), e);
    }
    // reap so no zombie is left behind
    let _ = child.wait();
}
