//! FILENAME: app/src/discovery.rs
//! Input discovery and output path mapping.

use crate::log_warn;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every file under `root` (recursively) whose extension equals `extension`,
/// ignoring ASCII case. Sorted by path.
pub fn find_input_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Input folder {} does not exist or is not a directory", root.display());
    }
    let extension = extension.trim_start_matches('.');

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log_warn!("DISCOVERY", "Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// `input` relative to `input_root`, re-rooted under `output_root` with an
/// `.xlsx` extension. Falls back to the bare file name when `input` lies outside
/// `input_root`.
pub fn output_path_for(input: &Path, input_root: &Path, output_root: &Path) -> PathBuf {
    let relative = match input.strip_prefix(input_root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => input
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| input.to_path_buf()),
    };
    output_root.join(relative).with_extension("xlsx")
}
