//! Structural parser for SystemVerilog
//!
//! This module provides a lossless lexer and a tolerant recursive-descent
//! parser using:
//! - **logos** for fast lexing
//! - plain AST structs with **text-size** ranges into the source
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind
//!     ↓
//! Parser → SourceFile (modules, ports, nets, instances, comments)
//! ```
//!
//! The parser only understands the structure AUTO expansion needs. Bodies of
//! procedural blocks, functions and tasks are skipped as balanced token runs.

#[allow(clippy::module_inception)]
mod parser;

pub mod ast;
mod lexer;
mod syntax_kind;

pub use ast::*;
pub use lexer::{Lexer, Token, tokenize};
pub use parser::{SyntaxError, parse};
pub use syntax_kind::SyntaxKind;
