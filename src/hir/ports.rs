//! Port facts for instantiated modules.
//!
//! [`PortFacts`] is the seam between the expansion engine and whatever
//! front-end knows the design. [`Compilation`](super::Compilation) is the
//! built-in implementation.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::TextRange;

use super::const_eval::{ParamEnv, eval_packed};
use crate::parser::{ModuleDecl, PortDecl, PortDirection};

/// Resolved information about one port of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: SmolStr,
    pub direction: PortDirection,
    /// Bit width, `None` when the range could not be evaluated.
    pub width: Option<u32>,
    pub msb: Option<i64>,
    pub lsb: Option<i64>,
    /// Numeric range such as `[7:0]`, empty for scalars.
    pub resolved_range: String,
    /// Range as written in the source, e.g. `[WIDTH-1:0]`.
    pub original_range: String,
    /// User-defined type such as `pkg::bus_t`.
    pub data_type: Option<SmolStr>,
    pub unpacked: String,
    pub is_array: bool,
}

impl PortInfo {
    /// A port with a plain `[width-1:0]` range.
    pub fn new(name: impl Into<SmolStr>, direction: PortDirection, width: u32) -> Self {
        let resolved_range = range_text(width);
        Self {
            name: name.into(),
            direction,
            width: Some(width),
            msb: Some(i64::from(width) - 1),
            lsb: Some(0),
            original_range: resolved_range.clone(),
            resolved_range,
            data_type: None,
            unpacked: String::new(),
            is_array: false,
        }
    }

    /// Range to use in declarations: original syntax when present.
    pub fn declared_range(&self) -> &str {
        if self.original_range.is_empty() {
            &self.resolved_range
        } else {
            &self.original_range
        }
    }
}

/// `[w-1:0]` for a width, empty for scalars.
pub fn range_text(width: u32) -> String {
    if width <= 1 {
        String::new()
    } else {
        format!("[{}:0]", width - 1)
    }
}

/// Result of asking for a module's ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortLookup {
    Found(Arc<[PortInfo]>),
    NotFound,
}

impl PortLookup {
    pub fn ports(&self) -> Option<&[PortInfo]> {
        match self {
            PortLookup::Found(ports) => Some(ports),
            PortLookup::NotFound => None,
        }
    }
}

/// Source of port information for instantiated modules.
pub trait PortFacts {
    fn module_ports(&self, module: &str) -> PortLookup;
}

/// Port lists keyed by module name.
///
/// Filled before an expansion starts and only read while it runs.
#[derive(Debug, Clone, Default)]
pub struct PortCache {
    entries: FxHashMap<SmolStr, PortLookup>,
}

impl PortCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: impl Into<SmolStr>, lookup: PortLookup) {
        self.entries.insert(module.into(), lookup);
    }

    pub fn insert_ports(&mut self, module: impl Into<SmolStr>, ports: Vec<PortInfo>) {
        self.insert(module, PortLookup::Found(ports.into()));
    }

    pub fn contains(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl PortFacts for PortCache {
    fn module_ports(&self, module: &str) -> PortLookup {
        self.entries
            .get(module)
            .cloned()
            .unwrap_or(PortLookup::NotFound)
    }
}

/// A port whose name could not be resolved, usually an unexpanded macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyPortName {
    pub module: SmolStr,
    pub range: TextRange,
}

/// Extract resolved port facts from a parsed module, in header order.
pub fn ports_from_module(module: &ModuleDecl) -> Result<Vec<PortInfo>, EmptyPortName> {
    if let Some(decl) = module.ports.iter().find(|p| p.name.is_empty()) {
        return Err(EmptyPortName {
            module: module.name.clone(),
            range: decl.range,
        });
    }

    let env = ParamEnv::from_module(module);
    let mut seen = Vec::<&str>::new();
    let mut ports = Vec::new();
    for decl in &module.ports {
        if seen.contains(&decl.name.as_str()) {
            continue;
        }
        seen.push(&decl.name);
        let Some(full) = module.port_decl(&decl.name) else {
            continue;
        };
        let Some(direction) = full.direction else {
            tracing::debug!(module = %module.name, port = %decl.name, "port without direction");
            continue;
        };
        ports.push(port_info(full, direction, &env));
    }
    Ok(ports)
}

fn port_info(decl: &PortDecl, direction: PortDirection, env: &ParamEnv) -> PortInfo {
    let builtin_width = match decl.data_type.as_deref() {
        Some("int") | Some("integer") => Some(32),
        _ => None,
    };

    let (width, msb, lsb) = match (&decl.data_type, builtin_width) {
        (_, Some(width)) => (Some(width), Some(i64::from(width) - 1), Some(0)),
        (Some(_), None) => (None, None, None),
        (None, None) => match eval_packed(&decl.packed, env) {
            Some(range) => (Some(range.width), Some(range.msb), Some(range.lsb)),
            None => (None, None, None),
        },
    };

    let resolved_range = match (msb, lsb, width) {
        (Some(msb), Some(lsb), Some(w)) if w > 1 || !decl.packed.is_empty() => {
            format!("[{}:{}]", msb, lsb)
        }
        _ => String::new(),
    };

    PortInfo {
        name: decl.name.clone(),
        direction,
        width,
        msb,
        lsb,
        resolved_range,
        original_range: decl.packed.clone(),
        data_type: decl.data_type.clone(),
        unpacked: decl.unpacked.clone(),
        is_array: !decl.unpacked.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn ports(src: &str) -> Vec<PortInfo> {
        let file = parse(src);
        ports_from_module(&file.modules[0]).unwrap()
    }

    #[test]
    fn test_ports_ansi_widths() {
        let ports = ports(
            "module sub #(parameter W = 8) (input logic clk, input logic [W-1:0] d, output logic [W-1:0] q); endmodule",
        );
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0].width, Some(1));
        assert_eq!(ports[0].resolved_range, "");
        assert_eq!(ports[1].width, Some(8));
        assert_eq!(ports[1].resolved_range, "[7:0]");
        assert_eq!(ports[1].original_range, "[W-1:0]");
        assert_eq!(ports[2].direction, PortDirection::Output);
    }

    #[test]
    fn test_ports_non_ansi_follow_header_order() {
        let ports = ports("module m (b, a);\n  input [3:0] a;\n  output b;\nendmodule");
        let names: Vec<_> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(ports[1].width, Some(4));
    }

    #[test]
    fn test_ports_unknown_width_keeps_text() {
        let ports = ports("module m (input logic [N-1:0] a); endmodule");
        assert_eq!(ports[0].width, None);
        assert_eq!(ports[0].declared_range(), "[N-1:0]");
    }

    #[test]
    fn test_ports_user_type_and_array() {
        let ports = ports("module m (input pkg::bus_t b, output logic [1:0] q [4]); endmodule");
        assert_eq!(ports[0].data_type.as_deref(), Some("pkg::bus_t"));
        assert_eq!(ports[0].width, None);
        assert!(ports[1].is_array);
        assert_eq!(ports[1].unpacked, "[4]");
    }

    #[test]
    fn test_ports_empty_name_is_error() {
        let file = parse("module m (input logic `NAME, input logic b); endmodule");
        let err = ports_from_module(&file.modules[0]).unwrap_err();
        assert_eq!(err.module, "m");
    }

    #[test]
    fn test_port_cache_lookup() {
        let mut cache = PortCache::new();
        cache.insert_ports("sub", vec![PortInfo::new("a", PortDirection::Input, 4)]);
        assert_eq!(cache.module_ports("sub").ports().map(|p| p.len()), Some(1));
        assert_eq!(cache.module_ports("other"), PortLookup::NotFound);
    }
}
