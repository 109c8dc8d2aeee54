use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Instant;
use indicatif::{ProgressBar, ProgressStyle};

pub fn setup_logging(log_level: &str) -> io::Result<()> {
    let log_level_filter = match log_level {
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    // a second init (interactive mode after CLI parsing) is harmless
    let _ = env_logger::Builder::new()
        .filter_level(log_level_filter)
        .try_init();
    Ok(())
}

pub struct ProgressManager {
    pb: ProgressBar,
    no_progress: bool,
    start: Instant,
}

impl ProgressManager {
    pub fn new(total: u64, no_progress: bool) -> Self {
        let pb = if no_progress {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len} ETA: {eta_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-");
            pb.set_style(style);
            pb
        };
        ProgressManager {
            pb,
            no_progress,
            start: Instant::now(),
        }
    }

    pub fn update(&self, completed: u64, total: u64) {
        if self.no_progress {
            return;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 { completed as f64 / elapsed } else { 0.0 };
        self.pb.set_length(total);
        self.pb.set_message(format!("Converting ({}/{}), {:.1} files/s", completed, total, speed));
        self.pb.set_position(completed);
    }

    /// Prints a line above the bar without tearing it.
    pub fn println(&self, line: &str) {
        if self.no_progress || self.pb.is_hidden() {
            println!("{}", line);
        } else {
            self.pb.println(line);
        }
    }

    pub fn finish(&self, succeeded: usize, failed: usize) {
        if self.no_progress {
            return;
        }
        self.pb.finish_with_message(format!(
            "Done in {:.1}s, {} succeeded, {} failed",
            self.start.elapsed().as_secs_f64(),
            succeeded,
            failed
        ));
    }
}

pub fn create_progress_bar(total: u64, no_progress: bool) -> ProgressManager {
    ProgressManager::new(total, no_progress)
}

pub fn format_file_size(size: u64) -> String {
    if size < 1024 * 1024 {
        format!("{:.2} KB", size as f64 / 1024.0)
    } else {
        format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
    }
}

/// Size of `path` if it is a regular, non-empty file. Anything else means the
/// converter did not produce a usable document.
pub fn verified_output_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file() && meta.len() > 0)
        .map(|meta| meta.len())
}

/// Deletes a destination left over from an earlier run, so only output
/// written by the current attempt can pass `verified_output_size`.
pub fn remove_stale_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed stale output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("cannot remove stale output {}: {}", path.display(), e),
    }
}

/// Keeps helper processes from flashing a console window on Windows.
#[cfg(windows)]
pub fn hide_console_window(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
pub fn hide_console_window(_cmd: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_switch_units_at_one_megabyte() {
        assert_eq!(format_file_size(512), "0.50 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024 / 2), "1.50 MB");
    }

    #[test]
    fn empty_and_missing_outputs_are_not_verified() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.hwpx");
        let full = dir.path().join("full.hwpx");
        fs::write(&empty, b"").unwrap();
        fs::write(&full, b"PK").unwrap();

        assert_eq!(verified_output_size(&empty), None);
        assert_eq!(verified_output_size(&dir.path().join("missing.hwpx")), None);
        assert_eq!(verified_output_size(dir.path()), None);
        assert_eq!(verified_output_size(&full), Some(2));
    }

    #[test]
    fn stale_output_is_removed_and_missing_output_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("a.hwpx");
        fs::write(&stale, b"from an earlier run").unwrap();

        remove_stale_output(&stale);
        remove_stale_output(&stale);

        assert!(!stale.exists());
    }
}
