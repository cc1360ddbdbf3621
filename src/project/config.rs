//! Layered configuration.
//!
//! Four layers, lowest priority first:
//!
//! ```text
//! MergedConfig::default()      compiled defaults
//!     ↓
//! .svauto.toml                 nearest project file, upward search
//!     ↓
//! Local Variables: block       inline directives in the file itself
//!     ↓
//! CliOverrides                 only flags the user actually passed
//! ```
//!
//! Scalars override; path lists concatenate in priority order without
//! deduplication.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use super::file_list::FileList;
use crate::error::AutoError;
use crate::hir::SearchPaths;

/// Project file name looked up by [`discover_project_file`].
pub const PROJECT_FILE: &str = ".svauto.toml";

/// Directories marking a version-control root; upward search stops there.
const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn"];

/// Order of generated AUTOINST connections and AUTOPORTS entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grouping {
    /// Outputs, then inouts, then inputs, each under a header comment.
    #[default]
    ByDirection,
    /// One list sorted by port name.
    Alphabetical,
}

impl FromStr for Grouping {
    type Err = AutoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by-direction" | "direction" => Ok(Grouping::ByDirection),
            "alphabetical" | "alpha" => Ok(Grouping::Alphabetical),
            other => Err(AutoError::invalid_argument(format!(
                "unknown grouping '{}', expected 'by-direction' or 'alphabetical'",
                other
            ))),
        }
    }
}

/// Whether unresolved modules and ports are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    Strict,
    #[default]
    Lenient,
}

impl Strictness {
    pub fn from_flag(strict: bool) -> Self {
        if strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }
}

/// One configuration layer; `None` and empty lists fall through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub indent: Option<String>,
    pub align: Option<bool>,
    pub grouping: Option<Grouping>,
    pub strictness: Option<Strictness>,
    pub verbosity: Option<u8>,
    pub single_unit: Option<bool>,
    pub library_dirs: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub library_files: Vec<PathBuf>,
}

/// The effective option set for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    /// One indentation unit for generated lines.
    pub indent: String,
    pub align: bool,
    pub grouping: Grouping,
    pub strictness: Strictness,
    pub verbosity: u8,
    /// Load every input file into one compilation before expanding.
    pub single_unit: bool,
    pub library_dirs: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub library_files: Vec<PathBuf>,
}

impl Default for MergedConfig {
    fn default() -> Self {
        Self {
            indent: " ".repeat(4),
            align: false,
            grouping: Grouping::ByDirection,
            strictness: Strictness::Lenient,
            verbosity: 0,
            single_unit: false,
            library_dirs: Vec::new(),
            include_dirs: Vec::new(),
            extensions: Vec::new(),
            library_files: Vec::new(),
        }
    }
}

impl MergedConfig {
    /// Merge layers given lowest priority first on top of the defaults.
    pub fn merge<'a>(layers: impl IntoIterator<Item = &'a ConfigLayer>) -> Self {
        let mut config = Self::default();
        for layer in layers {
            config.apply(layer);
        }
        config
    }

    /// Apply one layer on top of this configuration.
    pub fn apply(&mut self, layer: &ConfigLayer) {
        if let Some(indent) = &layer.indent {
            self.indent = indent.clone();
        }
        if let Some(align) = layer.align {
            self.align = align;
        }
        if let Some(grouping) = layer.grouping {
            self.grouping = grouping;
        }
        if let Some(strictness) = layer.strictness {
            self.strictness = strictness;
        }
        if let Some(verbosity) = layer.verbosity {
            self.verbosity = verbosity;
        }
        if let Some(single_unit) = layer.single_unit {
            self.single_unit = single_unit;
        }
        self.library_dirs.extend(layer.library_dirs.iter().cloned());
        self.include_dirs.extend(layer.include_dirs.iter().cloned());
        self.extensions.extend(layer.extensions.iter().cloned());
        self.library_files.extend(layer.library_files.iter().cloned());
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }

    pub fn search_paths(&self) -> SearchPaths {
        SearchPaths {
            library_dirs: self.library_dirs.clone(),
            include_dirs: self.include_dirs.clone(),
            extensions: self.extensions.clone(),
            library_files: self.library_files.clone(),
        }
    }
}

// ============================================================================
// PROJECT FILE
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProjectFile {
    library: LibrarySection,
    format: FormatSection,
    behavior: BehaviorSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LibrarySection {
    directories: Vec<PathBuf>,
    include: Vec<PathBuf>,
    extensions: Vec<String>,
    files: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FormatSection {
    indent: Option<IndentSetting>,
    align: Option<bool>,
    grouping: Option<Grouping>,
}

/// `indent = 2` (spaces) or `indent = "\t"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IndentSetting {
    Width(usize),
    Text(String),
}

impl IndentSetting {
    fn into_string(self) -> String {
        match self {
            IndentSetting::Width(width) => " ".repeat(width),
            IndentSetting::Text(text) => text,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BehaviorSection {
    strict: Option<bool>,
    verbosity: Option<u8>,
    single_unit: Option<bool>,
}

/// Parse project file text; relative paths resolve against `base`.
pub fn parse_project_file(text: &str, path: &Path) -> Result<ConfigLayer, AutoError> {
    let file: ProjectFile = toml::from_str(text).map_err(|source| AutoError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or(Path::new(""));
    let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

    Ok(ConfigLayer {
        indent: file.format.indent.map(IndentSetting::into_string),
        align: file.format.align,
        grouping: file.format.grouping,
        strictness: file.behavior.strict.map(Strictness::from_flag),
        verbosity: file.behavior.verbosity,
        single_unit: file.behavior.single_unit,
        library_dirs: file.library.directories.into_iter().map(resolve).collect(),
        include_dirs: file.library.include.into_iter().map(resolve).collect(),
        extensions: file.library.extensions,
        library_files: file.library.files.into_iter().map(resolve).collect(),
    })
}

/// Read and parse a project file.
pub fn load_project_file(path: &Path) -> Result<ConfigLayer, AutoError> {
    let text = std::fs::read_to_string(path).map_err(|e| AutoError::io(path, e))?;
    parse_project_file(&text, path)
}

/// Nearest `.svauto.toml` at or above `start`.
///
/// The search includes the first directory holding a version-control
/// marker and stops there.
pub fn discover_project_file(start: &Path) -> Option<PathBuf> {
    let start = if start.is_file() {
        start.parent()?
    } else {
        start
    };
    for dir in start.ancestors() {
        let candidate = dir.join(PROJECT_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if VCS_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            return None;
        }
    }
    None
}

// ============================================================================
// INLINE DIRECTIVES
// ============================================================================

/// Parse an Emacs-style `Local Variables:` block from source comments.
///
/// ```text
/// // Local Variables:
/// // verilog-library-directories:("." "../rtl")
/// // svauto-indent: 2
/// // End:
/// ```
pub fn parse_inline_directives(text: &str, base: &Path) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut lines = text.lines();

    let Some(prefix) = lines.by_ref().find_map(|line| {
        line.find("Local Variables:").map(|idx| line[..idx].to_string())
    }) else {
        return layer;
    };

    for line in lines {
        let line = line.strip_prefix(prefix.as_str()).unwrap_or(line).trim();
        if line.starts_with("End:") {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "verilog-library-directories" => layer
                .library_dirs
                .extend(lisp_strings(value).into_iter().map(|d| base.join(d))),
            "verilog-library-extensions" => layer.extensions.extend(lisp_strings(value)),
            "verilog-library-flags" => {
                let flags = lisp_strings(value);
                let tokens: Vec<&str> = flags.iter().flat_map(|f| f.split_whitespace()).collect();
                let mut list = FileList::new();
                match list.apply_flags(&tokens, base) {
                    Ok(_) => list.extend_layer(&mut layer),
                    Err(message) => tracing::warn!("ignoring verilog-library-flags: {}", message),
                }
            }
            "svauto-indent" => {
                layer.indent = match value.parse::<usize>() {
                    Ok(width) => Some(" ".repeat(width)),
                    Err(_) => lisp_strings(value).into_iter().next(),
                }
            }
            "svauto-align" => layer.align = lisp_bool(value),
            "svauto-grouping" => {
                layer.grouping = lisp_strings(value)
                    .first()
                    .and_then(|g| g.parse().ok())
            }
            "svauto-strict" => layer.strictness = lisp_bool(value).map(Strictness::from_flag),
            other => tracing::trace!(key = other, "ignoring local variable"),
        }
    }
    layer
}

/// Strings in a lisp value: `("a" "b")`, `"a"`, or a bare symbol.
fn lisp_strings(value: &str) -> Vec<String> {
    let quoted: Vec<String> = value
        .split('"')
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }
    value
        .trim_matches(|c| c == '(' || c == ')')
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn lisp_bool(value: &str) -> Option<bool> {
    match value {
        "t" | "true" | "1" => Some(true),
        "nil" | "false" | "0" => Some(false),
        _ => None,
    }
}

// ============================================================================
// COMMAND LINE
// ============================================================================

/// Command-line settings that take part in the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CliFlag {
    Indent,
    Align,
    Grouping,
    Strict,
    Verbosity,
    SingleUnit,
}

/// Values parsed from the command line plus which of them were passed.
///
/// A flag's default value is indistinguishable from the user passing it,
/// so only flags in `explicit` override lower layers.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub indent: Option<String>,
    pub align: bool,
    pub grouping: Grouping,
    pub strict: bool,
    pub verbosity: u8,
    pub single_unit: bool,
    pub library_dirs: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub library_files: Vec<PathBuf>,
    explicit: FxHashSet<CliFlag>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_explicit(&mut self, flag: CliFlag) {
        self.explicit.insert(flag);
    }

    pub fn is_explicit(&self, flag: CliFlag) -> bool {
        self.explicit.contains(&flag)
    }

    pub fn to_layer(&self) -> ConfigLayer {
        let pick = |flag: CliFlag| self.is_explicit(flag);
        ConfigLayer {
            indent: self.indent.clone().filter(|_| pick(CliFlag::Indent)),
            align: pick(CliFlag::Align).then_some(self.align),
            grouping: pick(CliFlag::Grouping).then_some(self.grouping),
            strictness: pick(CliFlag::Strict).then(|| Strictness::from_flag(self.strict)),
            verbosity: pick(CliFlag::Verbosity).then_some(self.verbosity),
            single_unit: pick(CliFlag::SingleUnit).then_some(self.single_unit),
            library_dirs: self.library_dirs.clone(),
            include_dirs: self.include_dirs.clone(),
            extensions: self.extensions.clone(),
            library_files: self.library_files.clone(),
        }
    }
}

// ============================================================================
// CONFIG STACK
// ============================================================================

/// Resolves the merged configuration for each file of a run.
///
/// Project files are discovered per target directory and cached.
#[derive(Debug, Default)]
pub struct ConfigStack {
    cli: ConfigLayer,
    project_override: Option<ConfigLayer>,
    discovered: FxHashMap<PathBuf, ConfigLayer>,
}

impl ConfigStack {
    pub fn new(cli: ConfigLayer) -> Self {
        Self {
            cli,
            ..Self::default()
        }
    }

    /// Use an explicit project layer instead of upward discovery.
    pub fn with_project(mut self, project: ConfigLayer) -> Self {
        self.project_override = Some(project);
        self
    }

    /// Configuration without any file-specific layers.
    pub fn base(&self) -> MergedConfig {
        MergedConfig::merge(self.project_override.iter().chain([&self.cli]))
    }

    /// Configuration for one file: project file, inline directives, CLI.
    pub fn for_file(&mut self, path: &Path, text: &str) -> Result<MergedConfig, AutoError> {
        let project = match &self.project_override {
            Some(layer) => Some(layer.clone()),
            None => self.project_layer(path)?,
        };
        let base = path.parent().unwrap_or(Path::new(""));
        let inline = parse_inline_directives(text, base);
        Ok(MergedConfig::merge(
            project.iter().chain([&inline, &self.cli]),
        ))
    }

    fn project_layer(&mut self, path: &Path) -> Result<Option<ConfigLayer>, AutoError> {
        let Some(config_path) = discover_project_file(path) else {
            return Ok(None);
        };
        if let Some(layer) = self.discovered.get(&config_path) {
            return Ok(Some(layer.clone()));
        }
        tracing::debug!(path = %config_path.display(), "loading project file");
        let layer = load_project_file(&config_path)?;
        self.discovered.insert(config_path, layer.clone());
        Ok(Some(layer))
    }
}
