use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use walkdir::WalkDir;
use crate::error::DiscoveryError;

/// Files found under an input root, plus anything that could not be read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub diagnostics: Vec<DiscoveryError>,
}

/// Lists convertible files under `root`.
///
/// Only regular files whose name ends in `.{extension}` (any case) are kept;
/// symlinks are skipped. Entries are visited in file-name order so repeated
/// runs over the same tree produce the same list. Errors never abort the
/// listing: they are collected in `diagnostics`.
pub fn discover(root: &Path, recursive: bool, extension: &str) -> Discovery {
    let mut discovery = Discovery::default();

    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            discovery.diagnostics.push(DiscoveryError::NotADirectory(root.to_path_buf()));
            return discovery;
        }
        Err(source) => {
            discovery.diagnostics.push(DiscoveryError::Unreadable {
                path: root.to_path_buf(),
                source,
            });
            return discovery;
        }
    }

    let suffix = format!(".{}", extension.trim_start_matches('.').to_lowercase());
    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                warn!("skipping unreadable entry {}: {}", path.display(), e);
                discovery.diagnostics.push(DiscoveryError::Walk { path, source: e });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if has_suffix(entry.file_name().to_string_lossy().as_ref(), &suffix) {
            discovery.files.push(entry.into_path());
        }
    }

    debug!("found {} file(s) under {}", discovery.files.len(), root.display());
    discovery
}

fn has_suffix(name: &str, lowercase_suffix: &str) -> bool {
    name.to_lowercase().ends_with(lowercase_suffix)
}
