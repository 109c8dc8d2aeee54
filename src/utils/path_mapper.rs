use std::fs;
use std::path::{Component, Path, PathBuf};
use log::debug;
use pathdiff::diff_paths;
use crate::error::PathError;

/// Maps discovered sources to destinations under the output root.
#[derive(Debug, Clone)]
pub struct PathMapper {
    input_root: PathBuf,
    output_root: PathBuf,
    target_extension: String,
}

impl PathMapper {
    pub fn new(input_root: &Path, output_root: &Path, target_extension: &str) -> Self {
        PathMapper {
            input_root: input_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            target_extension: target_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Computes the destination for `source` and creates its parent directory.
    pub fn map(&self, source: &Path) -> Result<PathBuf, PathError> {
        let destination = output_path_for(source, &self.input_root, &self.output_root, &self.target_extension)?;
        if let Some(parent) = destination.parent() {
            if !parent.is_dir() {
                fs::create_dir_all(parent).map_err(|source| PathError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
                debug!("created output directory {}", parent.display());
            }
        }
        Ok(destination)
    }
}

/// Pure part of the mapping: relative path under `input_root`, extension
/// swapped for `target_extension`, joined onto `output_root`.
pub fn output_path_for(
    source: &Path,
    input_root: &Path,
    output_root: &Path,
    target_extension: &str,
) -> Result<PathBuf, PathError> {
    let outside = || PathError::OutsideRoot {
        source_path: source.to_path_buf(),
        root: input_root.to_path_buf(),
    };

    let relative = diff_paths(source, input_root).ok_or_else(outside)?;
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || relative.file_name().is_none() {
        return Err(outside());
    }

    Ok(output_root.join(relative).with_extension(target_extension))
}
