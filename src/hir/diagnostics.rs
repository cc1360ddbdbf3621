//! Diagnostics: expansion error reporting.
//!
//! Every stage of an expansion reports problems here instead of failing.
//! Only unrecoverable conditions (unreadable input, invalid arguments)
//! escape as [`crate::AutoError`].

use std::fmt;
use std::sync::Arc;

use crate::base::LineCol;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file containing this diagnostic, when known.
    pub file: Option<Arc<str>>,
    /// Line (0-indexed).
    pub line: u32,
    /// Column (0-indexed).
    pub col: u32,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<&'static str>,
    /// The diagnostic message.
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self {
            file: None,
            line: 0,
            col: 0,
            severity: Severity::Error,
            code: None,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(message)
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_file(mut self, file: impl Into<Arc<str>>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at(mut self, pos: LineCol) -> Self {
        self.line = pos.line;
        self.col = pos.col;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    /// `file:line:col: severity[code]: message`, positions 1-based.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}: ", file, self.line + 1, self.col + 1)?;
        }
        f.write_str(self.severity.as_str())?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Error Code Ranges
///
/// - **E0001-E0099**: constructs that could not be expanded
/// - **W0001-W0099**: best-effort warnings, expansion continues
pub mod codes {
    // ========================================================================
    // ERRORS (E0001-E0099)
    // ========================================================================

    /// Instantiated module not found (strict mode).
    pub const UNRESOLVED_MODULE: &str = "E0001";
    /// Port declared with an empty name, usually an unexpanded macro.
    pub const EMPTY_PORT_NAME: &str = "E0002";
    /// Structural syntax error in a source file.
    pub const SYNTAX_ERROR: &str = "E0003";
    /// Manual connection to a port the module does not have (strict mode).
    pub const UNKNOWN_PORT: &str = "E0004";
    /// A file could not be read or loaded.
    pub const LOAD_FAILURE: &str = "E0005";

    // ========================================================================
    // WARNINGS (W0001-W0099)
    // ========================================================================

    /// Instantiated module not found; marker left untouched.
    pub const MODULE_NOT_FOUND: &str = "W0001";
    /// AUTO_TEMPLATE without any rule.
    pub const EMPTY_TEMPLATE: &str = "W0002";
    /// Placeholder left in a template result after substitution.
    pub const UNRESOLVED_PLACEHOLDER: &str = "W0003";
    /// Regular expression in a template or filter failed to compile.
    pub const INVALID_PATTERN: &str = "W0004";
    /// Inout port wider than the net it connects to.
    pub const INOUT_WIDTH_MISMATCH: &str = "W0005";
    /// AUTO marker that could not be paired with a construct.
    pub const ORPHAN_MARKER: &str = "W0006";
    /// Manual connection to a port the module does not have.
    pub const UNKNOWN_PORT_WARNING: &str = "W0007";
    /// `include target not found.
    pub const INCLUDE_NOT_FOUND: &str = "W0008";
    /// Positional connections; AUTOINST cannot tell which ports are used.
    pub const POSITIONAL_CONNECTIONS: &str = "W0009";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one run.
///
/// Each diagnostic is mirrored to `tracing` as it is added.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!(code = diagnostic.code, "{}", diagnostic),
            Severity::Warning => tracing::warn!(code = diagnostic.code, "{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add(diagnostic);
        }
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
