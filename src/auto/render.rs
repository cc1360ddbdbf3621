//! Text generation for AUTOINST, AUTOLOGIC and AUTOPORTS.
//!
//! Every renderer returns the exact text that belongs between the marker
//! comment and the end of its region, or an empty string when there is
//! nothing to generate.

use smol_str::SmolStr;

use super::collector::LogicFlavor;
use crate::parser::PortDirection;
use crate::project::{Grouping, MergedConfig};

/// Closing sentinel of an AUTOLOGIC block.
pub const END_OF_AUTOMATICS: &str = "// End of automatics";

fn group_header(direction: PortDirection) -> &'static str {
    match direction {
        PortDirection::Output => "// Outputs",
        PortDirection::Inout => "// Inouts",
        PortDirection::Input => "// Inputs",
    }
}

/// One generated `.port(signal)` connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstEntry {
    pub port: SmolStr,
    pub direction: PortDirection,
    pub connection: String,
}

/// A declaration line without its trailing `;` or `,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: SmolStr,
    pub data_type: Option<SmolStr>,
    pub range: String,
    pub unpacked: String,
}

impl Declaration {
    /// `keyword [range] name [unpacked]`, or `type name` for user types.
    pub fn render(&self, keyword: &str) -> String {
        let mut out = match &self.data_type {
            Some(data_type) => data_type.to_string(),
            None => keyword.to_string(),
        };
        if !self.range.is_empty() {
            out.push(' ');
            out.push_str(&self.range);
        }
        out.push(' ');
        out.push_str(&self.name);
        if !self.unpacked.is_empty() {
            out.push(' ');
            out.push_str(&self.unpacked);
        }
        out
    }
}

/// One generated AUTOPORTS entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub direction: PortDirection,
    pub decl: Declaration,
}

/// Order items per the grouping mode; `Some(header)` marks a group start.
fn arrange<'a, T>(
    items: &'a [T],
    grouping: Grouping,
    direction: impl Fn(&T) -> PortDirection,
    name: impl Fn(&T) -> &str,
) -> Vec<(Option<&'static str>, &'a T)> {
    let mut sorted: Vec<&T> = items.iter().collect();
    match grouping {
        Grouping::ByDirection => {
            sorted.sort_by_key(|item| direction(item));
            let mut previous = None;
            sorted
                .into_iter()
                .map(|item| {
                    let dir = direction(item);
                    let header = (previous != Some(dir)).then(|| group_header(dir));
                    previous = Some(dir);
                    (header, item)
                })
                .collect()
        }
        Grouping::Alphabetical => {
            sorted.sort_by(|a, b| name(a).cmp(name(b)));
            sorted.into_iter().map(|item| (None, item)).collect()
        }
    }
}

fn join_lines(lines: &[String], construct_indent: &str) -> String {
    if lines.is_empty() {
        return String::new();
    }
    format!("\n{}\n{}", lines.join("\n"), construct_indent)
}

/// Connections following `/*AUTOINST*/`, ending with the indentation of
/// the closing parenthesis.
pub fn render_autoinst(entries: &[InstEntry], config: &MergedConfig, construct_indent: &str) -> String {
    let indent = format!("{}{}", construct_indent, config.indent);
    let arranged = arrange(entries, config.grouping, |e| e.direction, |e| e.port.as_str());
    let column = if config.align {
        entries.iter().map(|e| e.port.len()).max().unwrap_or(0)
    } else {
        0
    };

    let mut lines = Vec::new();
    let last = arranged.len().saturating_sub(1);
    for (idx, (header, entry)) in arranged.into_iter().enumerate() {
        if let Some(header) = header {
            lines.push(format!("{}{}", indent, header));
        }
        let comma = if idx == last { "" } else { "," };
        lines.push(format!(
            "{}.{:<width$}({}){}",
            indent,
            entry.port,
            entry.connection,
            comma,
            width = column
        ));
    }
    join_lines(&lines, construct_indent)
}

/// Declarations following `/*AUTOLOGIC*/` between the two sentinels.
pub fn render_autologic(flavor: LogicFlavor, decls: &[Declaration], indent: &str) -> String {
    if decls.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{}{}", indent, flavor.begin_sentinel());
    for decl in decls {
        out.push('\n');
        out.push_str(indent);
        out.push_str(&decl.render(flavor.keyword()));
        out.push(';');
    }
    out.push('\n');
    out.push_str(indent);
    out.push_str(END_OF_AUTOMATICS);
    out
}

/// Port declarations following `/*AUTOPORTS*/` inside the port list.
pub fn render_autoports(entries: &[PortEntry], config: &MergedConfig, construct_indent: &str) -> String {
    let indent = format!("{}{}", construct_indent, config.indent);
    let arranged = arrange(
        entries,
        config.grouping,
        |e| e.direction,
        |e| e.decl.name.as_str(),
    );

    let mut lines = Vec::new();
    let last = arranged.len().saturating_sub(1);
    for (idx, (header, entry)) in arranged.into_iter().enumerate() {
        if let Some(header) = header {
            lines.push(format!("{}{}", indent, header));
        }
        let comma = if idx == last { "" } else { "," };
        lines.push(format!(
            "{}{} {}{}",
            indent,
            entry.direction,
            entry.decl.render("logic"),
            comma
        ));
    }
    join_lines(&lines, construct_indent)
}
