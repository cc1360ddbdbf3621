//! High-level IR (HIR): port facts and the design being expanded.
//!
//! ## Key Types
//!
//! - [`Compilation`] - parsed files, module index, library search, port cache
//! - [`PortFacts`] - trait the expansion engine queries for module ports
//! - [`PortInfo`] - one resolved port: direction, width, range text
//! - [`DiagnosticCollector`] - run-wide error and warning sink
//!
//! ## Layers
//!
//! ```text
//! SourceFile (parser)
//!     │
//!     ▼
//! ports_from_module      ← directions, widths via const_eval
//!     │
//!     ▼
//! PortCache              ← keyed by module name, read-only per expansion
//! ```

mod compilation;
pub mod const_eval;
mod diagnostics;
mod ports;

pub use compilation::{Compilation, DEFAULT_EXTENSIONS, ParsedFile, SearchPaths};
pub use const_eval::{EvaluatedRange, ParamEnv, eval_packed};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use ports::{
    EmptyPortName, PortCache, PortFacts, PortInfo, PortLookup, ports_from_module, range_text,
};
