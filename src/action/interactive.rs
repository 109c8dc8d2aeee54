use dialoguer::{Confirm, Input, Select};
use std::io;
use std::path::Path;

use crate::action::cli::{run_conversion, RunReport};
use crate::backend::bridge::{default_bridge_args, DEFAULT_BRIDGE_PROGRAM};
use crate::backend::process::{DEFAULT_FALLBACK_ARGS, DEFAULT_PRIMARY_ARGS, DEFAULT_TIMEOUT_SECS, DEFAULT_TOOL_PATH};
use crate::config::config::BackendKind;
use crate::config::ports::{AppConfig, ConfigPort};
use crate::models::conversion::FormatSpec;
use crate::service::config_service::{to_strings, ConfigService};
use crate::utils::utils::setup_logging;

pub fn process_interactive_mode() -> io::Result<RunReport> {
    setup_logging("info")?;
    println!("=== hwpx-batch interactive mode ===");
    let input = get_input_path()?;
    let output = get_output_path()?;

    let config_service = ConfigService::new(Box::new(InteractiveConfigAdapter::new(input, output)));
    let config = config_service.get_config()?;
    println!("Effective configuration: {:#?}", config);
    run_conversion(&config)
}

fn prompt_error(what: &str, e: dialoguer::Error) -> io::Error {
    io::Error::other(format!("{} input failed: {}", what, e))
}

pub fn get_input_path() -> io::Result<String> {
    Input::new()
        .with_prompt("Folder containing .hwp files")
        .validate_with(|input: &String| -> Result<(), String> {
            let path = Path::new(input);
            if input.trim().is_empty() {
                Err("please choose an input folder".to_string())
            } else if !path.is_dir() {
                Err(format!("'{}' is not an existing folder", input))
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| prompt_error("input folder", e))
}

pub fn get_output_path() -> io::Result<String> {
    Input::new()
        .with_prompt("Output folder for .hwpx files")
        .default("output".to_string())
        .validate_with(|output: &String| -> Result<(), String> {
            if output.trim().is_empty() {
                Err("please choose an output folder".to_string())
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| prompt_error("output folder", e))
}

pub fn get_recursive_option() -> io::Result<bool> {
    Confirm::new()
        .with_prompt("Include subfolders?")
        .default(false)
        .interact()
        .map_err(|e| prompt_error("subfolder option", e))
}

pub fn get_backend_option() -> io::Result<BackendKind> {
    let choice = Select::new()
        .with_prompt("Conversion method (arrow keys to move, Enter to confirm)")
        .items(&[
            "Converter program - one process per file",
            "Automation - one hidden word processor for the whole batch",
        ])
        .default(0)
        .interact()
        .map_err(|e| prompt_error("conversion method", e))?;
    Ok(if choice == 1 { BackendKind::Automation } else { BackendKind::Process })
}

pub fn get_tool_path() -> io::Result<String> {
    Input::new()
        .with_prompt("Converter program path")
        .default(DEFAULT_TOOL_PATH.to_string())
        .interact_text()
        .map_err(|e| prompt_error("converter path", e))
}

// Interactive configuration adapter
pub struct InteractiveConfigAdapter {
    input: String,
    output: String,
}

impl InteractiveConfigAdapter {
    pub fn new(input: String, output: String) -> Self {
        InteractiveConfigAdapter { input, output }
    }
}

impl ConfigPort for InteractiveConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        let recursive = get_recursive_option()?;
        let backend = get_backend_option()?;
        let tool_path = match backend {
            BackendKind::Process => get_tool_path()?,
            BackendKind::Automation => DEFAULT_TOOL_PATH.to_string(),
        };

        Ok(AppConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            recursive,
            backend,
            tool_path,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            primary_args: to_strings(DEFAULT_PRIMARY_ARGS),
            fallback_args: to_strings(DEFAULT_FALLBACK_ARGS),
            bridge_program: DEFAULT_BRIDGE_PROGRAM.to_string(),
            bridge_args: default_bridge_args(),
            format: FormatSpec::default(),
            no_progress: false,
            log_level: "info".to_string(),
        })
    }
}
