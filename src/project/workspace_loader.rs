use std::path::{Path, PathBuf};

use crate::error::AutoError;
use crate::hir::Compilation;

use super::file_loader;

/// Loads source files into a [`Compilation`]
pub struct WorkspaceLoader;

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self
    }

    /// Loads every source file under a directory into a compilation.
    pub fn load_directory_into_compilation(
        &self,
        path: &Path,
        compilation: &mut Compilation,
    ) -> Result<(), AutoError> {
        if !path.is_dir() {
            return Err(AutoError::invalid_argument(format!(
                "directory not found: {}",
                path.display()
            )));
        }
        let paths = file_loader::collect_file_paths(path)?;
        let failures = self.load_files_into_compilation(&paths, compilation);
        match failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    /// Loads files into a compilation, returning the ones that failed.
    pub fn load_files_into_compilation(
        &self,
        paths: &[PathBuf],
        compilation: &mut Compilation,
    ) -> Vec<(PathBuf, AutoError)> {
        let mut failures = Vec::new();
        for path in paths {
            if let Err(err) = self.load_file_into_compilation(path, compilation) {
                failures.push((path.clone(), err));
            }
        }
        if !failures.is_empty() {
            tracing::warn!("failed to load {} file(s)", failures.len());
        }
        failures
    }

    /// Loads a single file into a compilation.
    pub fn load_file_into_compilation(
        &self,
        path: &Path,
        compilation: &mut Compilation,
    ) -> Result<(), AutoError> {
        let text = file_loader::load_file(path)?;
        compilation.add_source(path, text);
        Ok(())
    }
}

impl Default for WorkspaceLoader {
    fn default() -> Self {
        Self::new()
    }
}
