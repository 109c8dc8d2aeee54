use std::io;
use std::path::PathBuf;
use std::time::Duration;
use crate::backend::automation::AutomationBackend;
use crate::backend::bridge::{default_bridge_args, BridgeConnector, DEFAULT_BRIDGE_PROGRAM};
use crate::backend::process::{
    ProcessBackend, ProcessBackendConfig, DEFAULT_FALLBACK_ARGS, DEFAULT_PRIMARY_ARGS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_TOOL_PATH,
};
use crate::backend::traits::i_backend::ConversionBackend;
use crate::config::config::BackendKind;
use crate::config::ports::{AppConfig, ConfigPort};
use crate::models::conversion::{BatchRequest, FormatSpec};

// Picks the configuration source and turns the result into engine parts
pub struct ConfigService {
    config_port: Box<dyn ConfigPort>,
}

impl ConfigService {
    pub fn new(config_port: Box<dyn ConfigPort>) -> Self {
        ConfigService { config_port }
    }

    pub fn get_config(&self) -> io::Result<AppConfig> {
        self.config_port.get_config()
    }
}

pub fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builds the backend the configuration asks for. Nothing is launched yet.
pub fn build_backend(config: &AppConfig) -> Box<dyn ConversionBackend> {
    match config.backend {
        BackendKind::Process => Box::new(ProcessBackend::new(ProcessBackendConfig {
            tool: PathBuf::from(&config.tool_path),
            timeout: Duration::from_secs(config.timeout_secs),
            primary_args: config.primary_args.clone(),
            fallback_args: config.fallback_args.clone(),
            format_token: config.format.format_token.clone(),
        })),
        BackendKind::Automation => Box::new(AutomationBackend::new(
            Box::new(BridgeConnector::new(&config.bridge_program, &config.bridge_args)),
            &config.format.format_token,
        )),
    }
}

pub fn build_request(config: &AppConfig) -> BatchRequest {
    BatchRequest {
        input_root: PathBuf::from(&config.input),
        output_root: PathBuf::from(&config.output),
        recursive: config.recursive,
    }
}

// Defaults for everything except the two folders
pub struct DefaultConfigAdapter {
    input: String,
    output: String,
}

impl DefaultConfigAdapter {
    pub fn new(input: String, output: String) -> Self {
        DefaultConfigAdapter { input, output }
    }
}

impl ConfigPort for DefaultConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        Ok(AppConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            recursive: false,
            backend: BackendKind::Process,
            tool_path: DEFAULT_TOOL_PATH.to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_process_backend() {
        let config = DefaultConfigAdapter::new("in".into(), "out".into()).get_config().unwrap();
        assert_eq!(config.backend, BackendKind::Process);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.primary_args, vec!["{source}", "{format}", "{destination}"]);
        assert_eq!(config.format.target_extension, "hwpx");
        assert!(!config.recursive);
    }

    #[test]
    fn default_bridge_does_not_depend_on_working_directory() {
        let config = DefaultConfigAdapter::new("in".into(), "out".into()).get_config().unwrap();
        assert!(!config.bridge_args.iter().any(|a| a.eq_ignore_ascii_case("-File")));
        assert!(!config.bridge_args.iter().any(|a| a.contains("assets/")));
        assert!(config.bridge_args.iter().any(|a| a == "-EncodedCommand"));
    }

    #[test]
    fn builds_requested_backend() {
        let mut config = DefaultConfigAdapter::new("in".into(), "out".into()).get_config().unwrap();
        assert_eq!(build_backend(&config).name(), "process");
        config.backend = BackendKind::Automation;
        assert_eq!(build_backend(&config).name(), "automation");
    }

    #[test]
    fn request_carries_folders_and_recursion() {
        let service = ConfigService::new(Box::new(DefaultConfigAdapter::new("docs".into(), "converted".into())));
        let mut config = service.get_config().unwrap();
        config.recursive = true;
        let request = build_request(&config);
        assert_eq!(request.input_root, PathBuf::from("docs"));
        assert_eq!(request.output_root, PathBuf::from("converted"));
        assert!(request.recursive);
    }
}
