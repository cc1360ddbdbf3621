//! Editor-facing operations.
//!
//! This module is the surface a remote-procedure layer adapts: a document
//! store with two operations, each returning a whole-document edit or
//! nothing.
//!
//! ## Design Principles
//!
//! 1. **Own types**: edits use [`Span`](crate::base::Span), converted at the
//!    protocol boundary
//! 2. **Thin**: every operation delegates to [`AutoExpander`](crate::auto::AutoExpander)
//!
//! ## Usage
//!
//! ```ignore
//! use svauto::ide::AutoHost;
//!
//! let mut host = AutoHost::new();
//! host.set_file_content("top.sv", text);
//! let edit = host.expand_autos("top.sv");
//! ```

mod diff;
mod host;

pub use diff::{CONTEXT_LINES, unified_diff};
pub use host::{AutoHost, DocumentEdit};
