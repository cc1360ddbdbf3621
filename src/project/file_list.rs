//! Simulator-style file lists (`-f list.f`).
//!
//! One entry per whitespace-separated token; `//` and `#` start comments.
//!
//! | Entry              | Meaning                              |
//! |--------------------|--------------------------------------|
//! | `path`             | source file                          |
//! | `-f file`          | nested file list                     |
//! | `-y dir`           | library directory                    |
//! | `-v file`          | library file                         |
//! | `+incdir+a+b`      | include directories                  |
//! | `+libext+.sv+.v`   | library extensions                   |
//!
//! Relative paths resolve against the directory of the list that names them.

use std::path::{Path, PathBuf};

use super::config::ConfigLayer;
use crate::error::AutoError;

/// Nested `-f` depth guard against include cycles.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    pub sources: Vec<PathBuf>,
    pub library_dirs: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub library_files: Vec<PathBuf>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a file list from disk.
    pub fn load(path: &Path) -> Result<Self, AutoError> {
        let mut list = Self::new();
        list.load_nested(path, 0)?;
        Ok(list)
    }

    fn load_nested(&mut self, path: &Path, depth: usize) -> Result<(), AutoError> {
        if depth > MAX_DEPTH {
            return Err(AutoError::FileList {
                path: path.to_path_buf(),
                line: 0,
                message: "file lists nested too deeply".to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| AutoError::io(path, e))?;
        let base = path.parent().unwrap_or(Path::new(""));

        for (line_no, line) in text.lines().enumerate() {
            let line = strip_comment(line);
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let nested = self
                .apply_flags(&tokens, base)
                .map_err(|message| AutoError::FileList {
                    path: path.to_path_buf(),
                    line: line_no + 1,
                    message,
                })?;
            for list in nested {
                self.load_nested(&list, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Apply flag tokens, returning any nested `-f` lists still to be read.
    pub fn apply_flags(&mut self, tokens: &[&str], base: &Path) -> Result<Vec<PathBuf>, String> {
        let mut nested = Vec::new();
        let mut iter = tokens.iter();
        while let Some(&token) = iter.next() {
            match token {
                "-f" | "-F" | "-y" | "-v" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| format!("'{}' expects an argument", token))?;
                    let path = resolve(base, value);
                    match token {
                        "-y" => self.library_dirs.push(path),
                        "-v" => self.library_files.push(path),
                        _ => nested.push(path),
                    }
                }
                t if t.starts_with("+incdir+") => self.include_dirs.extend(
                    plus_args(&t["+incdir+".len()..]).map(|dir| resolve(base, dir)),
                ),
                t if t.starts_with("+libext+") => self
                    .extensions
                    .extend(plus_args(&t["+libext+".len()..]).map(str::to_string)),
                t if t.starts_with('+') || t.starts_with('-') => {
                    tracing::debug!(flag = t, "ignoring unsupported file list flag");
                }
                path => self.sources.push(resolve(base, path)),
            }
        }
        Ok(nested)
    }

    /// Append the search-path part of the list to a configuration layer.
    pub fn extend_layer(self, layer: &mut ConfigLayer) {
        layer.library_dirs.extend(self.library_dirs);
        layer.include_dirs.extend(self.include_dirs);
        layer.extensions.extend(self.extensions);
        layer.library_files.extend(self.library_files);
    }
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find("//"), line.find('#')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

fn plus_args(rest: &str) -> impl Iterator<Item = &str> {
    rest.split('+').filter(|s| !s.is_empty())
}

fn resolve(base: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_flags() {
        let mut list = FileList::new();
        let nested = list
            .apply_flags(
                &["top.sv", "-y", "lib", "+incdir+inc+inc2", "+libext+.sv+.v", "-v", "cells.v", "+define+X=1"],
                Path::new("/proj"),
            )
            .unwrap();

        assert!(nested.is_empty());
        assert_eq!(list.sources, vec![PathBuf::from("/proj/top.sv")]);
        assert_eq!(list.library_dirs, vec![PathBuf::from("/proj/lib")]);
        assert_eq!(
            list.include_dirs,
            vec![PathBuf::from("/proj/inc"), PathBuf::from("/proj/inc2")]
        );
        assert_eq!(list.extensions, vec![".sv".to_string(), ".v".to_string()]);
        assert_eq!(list.library_files, vec![PathBuf::from("/proj/cells.v")]);
    }

    #[test]
    fn test_missing_argument() {
        let mut list = FileList::new();
        assert!(list.apply_flags(&["-y"], Path::new("")).is_err());
    }

    #[test]
    fn test_load_nested_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inner.f"), "b.sv // trailing\n").unwrap();
        std::fs::write(
            dir.path().join("outer.f"),
            "# header\na.sv\n-f inner.f\n-y rtl\n",
        )
        .unwrap();

        let list = FileList::load(&dir.path().join("outer.f")).unwrap();
        assert_eq!(
            list.sources,
            vec![dir.path().join("a.sv"), dir.path().join("b.sv")]
        );
        assert_eq!(list.library_dirs, vec![dir.path().join("rtl")]);
    }

    #[test]
    fn test_load_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.f"), "a.sv\n-v\n").unwrap();
        let err = FileList::load(&dir.path().join("bad.f")).unwrap_err();
        assert!(matches!(err, AutoError::FileList { line: 2, .. }));
    }
}
