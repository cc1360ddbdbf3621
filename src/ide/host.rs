//! AutoHost: document store behind editor integrations.
//!
//! The host owns the compilation and the configuration stack. Editors push
//! document text with `set_file_content()` and ask for edits with
//! `expand_autos()` / `delete_autos()`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut host = AutoHost::new();
//! host.set_file_content("sub.sv", "module sub(input logic a); endmodule");
//! host.set_file_content("top.sv", "module top; sub u(/*AUTOINST*/); endmodule");
//!
//! if let Some(edit) = host.expand_autos("top.sv") {
//!     // replace the whole document with edit.new_text
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::auto::{AutoExpander, ExpandResult, ExpandStats, Replacement};
use crate::base::Span;
use crate::hir::{Compilation, Diagnostic};
use crate::parser::SyntaxError;
use crate::project::{ConfigLayer, ConfigStack};

/// Edit for one document. `range` always covers the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEdit {
    pub path: PathBuf,
    pub range: Span,
    pub new_text: String,
    /// The individual edits, against the text the host holds.
    pub replacements: Vec<Replacement>,
    pub stats: ExpandStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Expand,
    Delete,
}

/// Owns all mutable state for editor requests.
///
/// One host serves one request at a time.
pub struct AutoHost {
    compilation: Compilation,
    config: ConfigStack,
    /// Diagnostics of the most recent operation.
    diagnostics: Vec<Diagnostic>,
}

impl Default for AutoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoHost {
    pub fn new() -> Self {
        Self::with_config(ConfigStack::new(ConfigLayer::default()))
    }

    pub fn with_config(config: ConfigStack) -> Self {
        Self {
            compilation: Compilation::new(config.base().search_paths()),
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Set the content of a document, parsing it. Returns its syntax errors.
    pub fn set_file_content(&mut self, path: impl AsRef<Path>, content: &str) -> Vec<SyntaxError> {
        let path = path.as_ref();
        self.compilation.add_source(path, content);
        self.compilation
            .file(path)
            .map(|f| f.syntax.errors.clone())
            .unwrap_or_default()
    }

    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.compilation.remove_file(path.as_ref());
    }

    pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
        self.compilation.file(path.as_ref()).is_some()
    }

    pub fn file_count(&self) -> usize {
        self.compilation.files().count()
    }

    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Expand every AUTO marker in a document. `None` when nothing changes.
    pub fn expand_autos(&mut self, path: impl AsRef<Path>) -> Option<DocumentEdit> {
        self.run(path.as_ref(), Operation::Expand)
    }

    /// Remove every generated region in a document. `None` when nothing
    /// changes.
    pub fn delete_autos(&mut self, path: impl AsRef<Path>) -> Option<DocumentEdit> {
        self.run(path.as_ref(), Operation::Delete)
    }

    fn run(&mut self, path: &Path, operation: Operation) -> Option<DocumentEdit> {
        self.diagnostics.clear();
        let text = self.compilation.file(path)?.text.clone();

        let config = match self.config.for_file(path, &text) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), "{}", err);
                self.config.base()
            }
        };

        if operation == Operation::Expand {
            self.compilation.extend_search_paths(&config.search_paths());
            let names = self.compilation.instantiated_in(path);
            self.compilation.ensure_modules(names.iter().map(|n| n.as_str()));
        }
        self.diagnostics.extend(self.compilation.take_diagnostics());

        let file = self.compilation.file(path)?;
        let mut expander = AutoExpander::new(&self.compilation, &config);
        let result = match operation {
            Operation::Expand => expander.expand_file(file),
            Operation::Delete => expander.delete(&file.text, &file.syntax),
        };
        let result: ExpandResult = match result {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(path = %path.display(), "{}", err);
                return None;
            }
        };
        self.diagnostics.extend(result.diagnostics);

        if result.replacements.is_empty() {
            return None;
        }
        Some(DocumentEdit {
            path: path.to_path_buf(),
            range: Span::document(&file.line_index),
            new_text: result.text,
            replacements: result.replacements,
            stats: result.stats,
        })
    }
}
