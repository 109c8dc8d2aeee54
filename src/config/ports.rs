use std::io;
use crate::config::config::BackendKind;
use crate::models::conversion::FormatSpec;

// Application configuration, one struct for every entry mode
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: String,
    pub output: String,
    pub recursive: bool,
    pub backend: BackendKind,
    pub tool_path: String,
    pub timeout_secs: u64,
    pub primary_args: Vec<String>,
    pub fallback_args: Vec<String>,
    pub bridge_program: String,
    pub bridge_args: Vec<String>,
    pub format: FormatSpec,
    pub no_progress: bool,
    pub log_level: String,
}

// Port for configuration sources
pub trait ConfigPort {
    fn get_config(&self) -> io::Result<AppConfig>;
}
