use clap::{Parser, ValueEnum};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Parser, Clone, Debug)]
#[command(
    name = "hwpx-batch",
    about = "Batch-convert HWP documents to HWPX",
    long_about = "Converts every .hwp file under an input folder to .hwpx, mirroring the folder layout under the output folder.\nThe process backend runs the word processor's command-line converter for each file; the automation backend drives one running instance through a helper script.\nRun without arguments for interactive mode. Use --show-config to print the effective configuration.",
    arg_required_else_help = true
)]
pub struct Cli {
    pub input: String,
    #[arg(short, long, default_value = "output")]
    pub output: String,
    /// Include subfolders
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
    /// Path to the command-line converter
    #[arg(long)]
    pub tool: Option<String>,
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// First argument convention, comma separated; {source}, {destination}, {format} are substituted
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub primary_args: Option<Vec<String>>,
    /// Second argument convention, tried when the first leaves no output
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub fallback_args: Option<Vec<String>>,
    #[arg(long)]
    pub bridge_program: Option<String>,
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub bridge_args: Option<Vec<String>>,
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warn", "error"])]
    pub log_level: String,
    #[arg(long, default_value_t = false)]
    pub show_config: bool,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq, Debug)]
pub enum BackendKind {
    /// One converter process per file
    Process,
    /// One automation session for the whole batch
    Automation,
}

pub fn validate_input_path(input: &str) -> io::Result<&Path> {
    if input.trim().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "input folder is not set"));
    }
    let path = Path::new(input);
    if !path.exists() {
        log::error!("input folder does not exist: {}", input);
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("input folder '{}' does not exist", input),
        ));
    }
    if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("input path '{}' is not a folder", input),
        ));
    }
    Ok(path)
}

pub fn validate_output_path(output: &str) -> io::Result<&Path> {
    if output.trim().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "output folder is not set"));
    }
    Ok(Path::new(output))
}

/// Checks both folders and creates the output root.
pub fn validate_folders(input: &str, output: &str) -> io::Result<()> {
    validate_input_path(input)?;
    let output = validate_output_path(output)?;
    fs::create_dir_all(output).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("cannot create output folder '{}': {}", output.display(), e),
        )
    })
}

pub fn validate_templates(name: &str, template: &[String]) -> io::Result<()> {
    if template.is_empty() {
        return Ok(());
    }
    for placeholder in ["{source}", "{destination}"] {
        if !template.iter().any(|arg| arg.contains(placeholder)) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is missing the {} placeholder", name, placeholder),
            ));
        }
    }
    Ok(())
}
