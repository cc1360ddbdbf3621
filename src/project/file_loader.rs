//! File discovery and loading for SystemVerilog sources.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::AutoError;

/// Extensions treated as SystemVerilog sources when walking directories.
pub const SOURCE_EXTENSIONS: &[&str] = &["sv", "svh", "v", "vh"];

/// Get file extension from path
pub fn get_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Whether a path has one of the source extensions
pub fn is_source_file(path: &Path) -> bool {
    get_extension(path).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Load file contents
pub fn load_file(path: &Path) -> Result<String, AutoError> {
    std::fs::read_to_string(path).map_err(|e| AutoError::io(path, e))
}

/// Write file contents
pub fn write_file(path: &Path, text: &str) -> Result<(), AutoError> {
    std::fs::write(path, text).map_err(|e| AutoError::io(path, e))
}

/// Recursively collect source files under a directory, sorted by path.
pub fn collect_file_paths(dir: &Path) -> Result<Vec<PathBuf>, AutoError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            AutoError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Expand command-line paths: directories become their source files.
pub fn expand_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AutoError> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(collect_file_paths(input)?);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}
