//! # svauto
//!
//! Expansion engine for verilog-mode style AUTO markers in SystemVerilog:
//! `/*AUTOINST*/`, `/*AUTOLOGIC*/` (`/*AUTOWIRE*/`, `/*AUTOREG*/`) and
//! `/*AUTOPORTS*/`, driven by `AUTO_TEMPLATE` blocks.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → AutoHost document store, unified diff
//!   ↓
//! auto      → collector, templates, matcher, aggregator, renderer, expander
//!   ↓
//! project   → configuration layers, file lists, workspace loading
//!   ↓
//! hir       → PortInfo facts, Compilation, diagnostics
//!   ↓
//! parser    → Logos lexer, structural SystemVerilog parser
//!   ↓
//! base      → Primitives (TextRange, LineIndex, text helpers)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → hir → project → auto → ide)
// ============================================================================

/// Foundation types: TextRange, LineIndex, text helpers
pub mod base;

/// Parser: Logos lexer, structural parser, AST
pub mod parser;

/// High-level IR: port facts, compilation, diagnostics
pub mod hir;

/// Project management: configuration, file lists, workspace loading
pub mod project;

/// AUTO expansion engine
pub mod auto;

/// Editor-facing operations
pub mod ide;

mod error;

pub use error::{ApplyError, AutoError};

// Re-export foundation types
pub use base::{LineCol, LineIndex, Position, Span, TextRange, TextSize};

pub use auto::{AutoExpander, ExpandResult, ExpandStats, Replacement, apply_replacements};
pub use hir::{Compilation, Diagnostic, PortFacts, PortInfo, Severity};
pub use ide::{AutoHost, DocumentEdit, unified_diff};
pub use project::MergedConfig;
