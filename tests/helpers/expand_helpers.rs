//! Helpers for running expansions over in-memory sources.

use std::path::Path;

use svauto::auto::{AutoExpander, ExpandResult};
use svauto::hir::Compilation;
use svauto::project::MergedConfig;

pub const TOP_PATH: &str = "top.sv";

/// Builds a compilation holding `library` files plus `top`.
pub fn compilation_with(library: &[(&str, &str)], top: &str) -> Compilation {
    let mut compilation = Compilation::default();
    for (path, source) in library {
        compilation.add_source(path, *source);
    }
    compilation.add_source(TOP_PATH, top);
    let names = compilation.instantiated_in(Path::new(TOP_PATH));
    compilation.ensure_modules(names.iter().map(|n| n.as_str()));
    compilation
}

/// Expands `top` against `library` with the given configuration.
pub fn expand_with(library: &[(&str, &str)], top: &str, config: &MergedConfig) -> ExpandResult {
    let compilation = compilation_with(library, top);
    let file = compilation
        .file(Path::new(TOP_PATH))
        .expect("top file should be loaded");
    AutoExpander::new(&compilation, config)
        .expand_file(file)
        .expect("replacements should apply")
}

/// Expands `top` with default configuration.
pub fn expand(library: &[(&str, &str)], top: &str) -> ExpandResult {
    expand_with(library, top, &MergedConfig::default())
}

/// Deletes generated regions from `text`.
pub fn delete(text: &str) -> ExpandResult {
    let compilation = compilation_with(&[], text);
    let file = compilation
        .file(Path::new(TOP_PATH))
        .expect("top file should be loaded");
    let config = MergedConfig::default();
    AutoExpander::new(&compilation, &config)
        .delete(&file.text, &file.syntax)
        .expect("replacements should apply")
}
