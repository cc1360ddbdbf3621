//! Structural syntax tree for SystemVerilog source files.
//!
//! The tree only keeps what AUTO expansion needs: module headers, port and
//! signal declarations, instantiations with their connection lists, and every
//! comment with its byte range. All ranges index into the original text.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::parser::SyntaxError;

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PortDirection {
    Output,
    Inout,
    Input,
}

impl PortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
            PortDirection::Inout => "inout",
        }
    }
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse result for one file.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    pub modules: Vec<ModuleDecl>,
    /// Every comment in the file, in source order.
    pub comments: Vec<Comment>,
    /// `` `include "..." `` targets, in source order.
    pub includes: Vec<SmolStr>,
    pub errors: Vec<SyntaxError>,
}

impl SourceFile {
    pub fn module(&self, name: &str) -> Option<&ModuleDecl> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Module types of every instantiation in the file.
    pub fn instantiated_modules(&self) -> impl Iterator<Item = &SmolStr> {
        self.modules
            .iter()
            .flat_map(|m| m.instances.iter().map(|i| &i.module_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
    pub range: TextRange,
}

impl Comment {
    pub fn start(&self) -> TextSize {
        self.range.start()
    }

    pub fn end(&self) -> TextSize {
        self.range.end()
    }
}

/// `parameter NAME = default` from the header or the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: SmolStr,
    pub default: Option<String>,
}

/// The parenthesised port list following the module name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortList {
    pub open_paren: TextSize,
    pub close_paren: TextSize,
    pub is_ansi: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDecl {
    /// Empty when the name position holds an unexpanded macro.
    pub name: SmolStr,
    pub direction: Option<PortDirection>,
    /// User-defined type, e.g. `pkg::bus_t` or `axi_if.master`.
    pub data_type: Option<SmolStr>,
    /// Packed dimensions as written, e.g. `[WIDTH-1:0]`.
    pub packed: String,
    /// Unpacked dimensions as written.
    pub unpacked: String,
    pub range: TextRange,
    pub in_header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclName {
    pub name: SmolStr,
    pub range: TextRange,
    pub unpacked: String,
}

/// A net or variable declaration: `logic [7:0] a, b;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDecl {
    pub data_type: Option<SmolStr>,
    pub packed: String,
    pub names: Vec<DeclName>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub port: SmolStr,
    /// `None` for an explicitly empty `.port()`.
    pub expr: Option<String>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDecl {
    pub module_name: SmolStr,
    pub instance_name: SmolStr,
    /// From the module type name to the closing parenthesis.
    pub range: TextRange,
    pub open_paren: TextSize,
    pub close_paren: TextSize,
    pub connections: Vec<Connection>,
    pub has_wildcard: bool,
    pub has_positional: bool,
}

impl InstanceDecl {
    pub fn connection(&self, port: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.port == port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: SmolStr,
    pub name_range: TextRange,
    pub range: TextRange,
    pub parameters: Vec<ParamDecl>,
    pub port_list: Option<PortList>,
    pub ports: Vec<PortDecl>,
    pub nets: Vec<NetDecl>,
    pub instances: Vec<InstanceDecl>,
    pub comments: Vec<Comment>,
}

impl ModuleDecl {
    /// The declaration carrying a port's direction. Non-ANSI headers list
    /// bare names and declare directions in the body.
    pub fn port_decl(&self, name: &str) -> Option<&PortDecl> {
        self.ports
            .iter()
            .filter(|p| p.name == name)
            .max_by_key(|p| p.direction.is_some())
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamDecl> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
