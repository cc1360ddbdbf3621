//! Compilation: the set of parsed files and the modules they define.
//!
//! Modules missing from the loaded files are searched for in library
//! directories (`<dir>/<module><ext>`) and library files. `` `include ``
//! directives are followed through the including file's directory and the
//! include directories.
//!
//! ## Lifecycle
//!
//! ```text
//! add_file / add_source      ← parse and index modules
//!     │
//!     ▼
//! ensure_modules(names)      ← library search, fill PortCache
//!     │
//!     ▼
//! module_ports(name)         ← read-only during an expansion
//! ```
//!
//! Replacing a file's text drops the port cache; it is rebuilt on the next
//! `ensure_modules` call rather than patched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::diagnostics::{Diagnostic, codes};
use super::ports::{PortCache, PortFacts, PortLookup, ports_from_module};
use crate::base::LineIndex;
use crate::error::AutoError;
use crate::parser::{ModuleDecl, SourceFile, parse};

/// Extensions tried during library search when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".sv", ".v"];

/// Where to look for modules and include files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    /// `-y` style directories searched for `<module><ext>`.
    pub library_dirs: Vec<PathBuf>,
    /// `+incdir+` directories for `` `include ``.
    pub include_dirs: Vec<PathBuf>,
    /// Extensions for library search, with leading dot.
    pub extensions: Vec<String>,
    /// `-v` files loaded when a module is not found elsewhere.
    pub library_files: Vec<PathBuf>,
}

impl SearchPaths {
    fn extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.to_vec()
        } else {
            self.extensions.iter().map(String::as_str).collect()
        }
    }
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub text: Arc<str>,
    pub syntax: SourceFile,
    pub line_index: LineIndex,
}

impl ParsedFile {
    pub fn new(path: PathBuf, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        Self {
            syntax: parse(&text),
            line_index: LineIndex::new(&text),
            path,
            text,
        }
    }

    pub fn display_path(&self) -> Arc<str> {
        Arc::from(self.path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleLocation {
    file: PathBuf,
    index: usize,
}

/// Parsed files, module index and port cache for one design.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    files: IndexMap<PathBuf, ParsedFile>,
    modules: FxHashMap<SmolStr, ModuleLocation>,
    search: SearchPaths,
    cache: PortCache,
    library_files_loaded: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn new(search: SearchPaths) -> Self {
        Self {
            search,
            ..Self::default()
        }
    }

    pub fn search_paths(&self) -> &SearchPaths {
        &self.search
    }

    /// Add search locations not already known. Cached misses are dropped
    /// when anything new arrives.
    pub fn extend_search_paths(&mut self, extra: &SearchPaths) {
        fn merge<T: Clone + PartialEq>(into: &mut Vec<T>, from: &[T]) -> bool {
            let before = into.len();
            for item in from {
                if !into.contains(item) {
                    into.push(item.clone());
                }
            }
            into.len() != before
        }

        let changed = merge(&mut self.search.library_dirs, &extra.library_dirs)
            | merge(&mut self.search.include_dirs, &extra.include_dirs)
            | merge(&mut self.search.extensions, &extra.extensions)
            | merge(&mut self.search.library_files, &extra.library_files);
        if changed {
            tracing::debug!("search paths extended");
            self.library_files_loaded = false;
            self.cache.clear();
        }
    }

    /// Read and parse a file, following its includes.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<(), AutoError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AutoError::io(path, e))?;
        self.add_source(path, text);
        Ok(())
    }

    /// Parse in-memory text for a path, replacing any earlier version.
    pub fn add_source(&mut self, path: impl AsRef<Path>, text: impl Into<Arc<str>>) {
        let path = path.as_ref().to_path_buf();
        let file = ParsedFile::new(path.clone(), text);
        tracing::debug!(
            path = %path.display(),
            modules = file.syntax.modules.len(),
            "parsed file"
        );

        for error in &file.syntax.errors {
            self.diagnostics.push(
                Diagnostic::error(error.message.clone())
                    .with_code(codes::SYNTAX_ERROR)
                    .with_file(file.display_path())
                    .at(file.line_index.line_col(error.range.start())),
            );
        }

        let includes = file.syntax.includes.clone();
        self.remove_file(&path);
        for (index, module) in file.syntax.modules.iter().enumerate() {
            self.modules
                .entry(module.name.clone())
                .or_insert_with(|| ModuleLocation {
                    file: path.clone(),
                    index,
                });
        }
        self.files.insert(path.clone(), file);
        self.cache.clear();

        for include in includes {
            self.follow_include(&path, &include);
        }
    }

    /// Forget a file and every module it defined.
    pub fn remove_file(&mut self, path: &Path) {
        if self.files.shift_remove(path).is_some() {
            self.modules.retain(|_, loc| loc.file != path);
            self.cache.clear();
        }
    }

    pub fn file(&self, path: &Path) -> Option<&ParsedFile> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &ParsedFile> {
        self.files.values()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDecl> {
        let loc = self.modules.get(name)?;
        self.files.get(&loc.file)?.syntax.modules.get(loc.index)
    }

    pub fn port_cache(&self) -> &PortCache {
        &self.cache
    }

    /// Diagnostics from loading, parsing and port extraction.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Make sure every named module has a port cache entry.
    ///
    /// Missing modules are searched for in the library paths first.
    pub fn ensure_modules<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        let names: Vec<&str> = names.into_iter().collect();
        // Loading a library file drops the cache, so search before filling it.
        for name in &names {
            if !self.modules.contains_key(*name) {
                self.search_library(name);
            }
        }
        for name in names {
            if self.cache.contains(name) {
                continue;
            }

            let lookup = match self.module(name).map(ports_from_module) {
                Some(Ok(ports)) => PortLookup::Found(ports.into()),
                Some(Err(empty)) => {
                    let diag = self
                        .modules
                        .get(name)
                        .and_then(|loc| self.files.get(&loc.file))
                        .map(|file| {
                            Diagnostic::error(format!(
                                "module '{}' has a port with an empty name; its port list is ignored",
                                empty.module
                            ))
                            .with_file(file.display_path())
                            .at(file.line_index.line_col(empty.range.start()))
                        })
                        .unwrap_or_else(|| {
                            Diagnostic::error(format!(
                                "module '{}' has a port with an empty name",
                                empty.module
                            ))
                        });
                    self.diagnostics
                        .push(diag.with_code(codes::EMPTY_PORT_NAME));
                    PortLookup::Found(Vec::new().into())
                }
                None => PortLookup::NotFound,
            };
            self.cache.insert(name, lookup);
        }
    }

    fn search_library(&mut self, name: &str) {
        let extensions: Vec<String> = self
            .search
            .extensions()
            .into_iter()
            .map(str::to_string)
            .collect();
        let candidates: Vec<PathBuf> = self
            .search
            .library_dirs
            .iter()
            .flat_map(|dir| extensions.iter().map(move |ext| dir.join(format!("{name}{ext}"))))
            .collect();

        for candidate in candidates {
            if candidate.is_file() && !self.files.contains_key(&candidate) {
                tracing::debug!(module = name, path = %candidate.display(), "library hit");
                if let Err(err) = self.add_file(&candidate) {
                    self.load_failure(&err);
                }
                if self.modules.contains_key(name) {
                    return;
                }
            }
        }

        if !self.library_files_loaded {
            self.library_files_loaded = true;
            for path in self.search.library_files.clone() {
                if let Err(err) = self.add_file(&path) {
                    self.load_failure(&err);
                }
            }
        }
    }

    fn follow_include(&mut self, includer: &Path, include: &str) {
        let base = includer.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut candidates = vec![base.join(include)];
        candidates.extend(self.search.include_dirs.iter().map(|dir| dir.join(include)));

        match candidates.into_iter().find(|c| c.is_file()) {
            Some(found) if self.files.contains_key(&found) => {}
            Some(found) => {
                if let Err(err) = self.add_file(&found) {
                    self.load_failure(&err);
                }
            }
            None => self.diagnostics.push(
                Diagnostic::warning(format!("include file '{}' not found", include))
                    .with_code(codes::INCLUDE_NOT_FOUND)
                    .with_file(includer.display().to_string()),
            ),
        }
    }

    fn load_failure(&mut self, err: &AutoError) {
        self.diagnostics
            .push(Diagnostic::error(err.to_string()).with_code(codes::LOAD_FAILURE));
    }

    /// Names of every module instantiated anywhere in a file.
    pub fn instantiated_in(&self, path: &Path) -> Vec<SmolStr> {
        let mut seen = FxHashSet::default();
        self.files
            .get(path)
            .map(|file| {
                file.syntax
                    .instantiated_modules()
                    .filter(|name| seen.insert((*name).clone()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl PortFacts for Compilation {
    fn module_ports(&self, module: &str) -> PortLookup {
        self.cache.module_ports(module)
    }
}
