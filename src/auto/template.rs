//! AUTO_TEMPLATE blocks.
//!
//! ```text
//! /* sub AUTO_TEMPLATE "u_sub_(\d+)"
//!    data_in  => fifo_%1_in      // trailing comments are stripped
//!    (.*)_o   => $1_from_sub
//!  */
//! ```
//!
//! A template binds to an instantiation of its module when it is the closest
//! template above it: greatest line strictly less than the instance's line.

use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;
use text_size::TextRange;

use crate::base::LineIndex;
use crate::hir::{Diagnostic, codes};
use crate::parser::{Comment, CommentKind};

static HEADER: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)^\s*([A-Za-z_][A-Za-z0-9_$]*)\s+AUTO_TEMPLATE\b[ \t]*(?:"((?:[^"\\]|\\.)*)")?(.*)$"#,
    )
});

/// `port-regex => signal-expression`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRule {
    pub port_pattern: String,
    pub signal: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoTemplate {
    pub module_name: SmolStr,
    /// Empty matches any instance and captures its first digit run as `%1`.
    pub instance_pattern: String,
    pub rules: Vec<TemplateRule>,
    /// 0-based line of the comment start.
    pub line: u32,
    pub range: TextRange,
}

/// Every template in a file, in source order.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<AutoTemplate>,
}

impl TemplateSet {
    /// Scan all comments of a file for template blocks.
    pub fn collect(
        comments: &[Comment],
        line_index: &LineIndex,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut templates = Vec::new();
        for comment in comments.iter().filter(|c| c.kind == CommentKind::Block) {
            let Some(body) = comment
                .text
                .strip_prefix("/*")
                .and_then(|t| t.strip_suffix("*/"))
            else {
                continue;
            };
            let line = line_index.line(comment.start());
            if let Some(template) = parse_template(body, line, comment.range) {
                if template.rules.is_empty() {
                    diagnostics.push(
                        Diagnostic::warning(format!(
                            "AUTO_TEMPLATE for '{}' has no rules",
                            template.module_name
                        ))
                        .with_code(codes::EMPTY_TEMPLATE)
                        .at(line_index.line_col(comment.start())),
                    );
                }
                tracing::debug!(
                    module = %template.module_name,
                    line = template.line + 1,
                    rules = template.rules.len(),
                    "collected AUTO_TEMPLATE"
                );
                templates.push(template);
            }
        }
        Self { templates }
    }

    pub fn from_templates(templates: Vec<AutoTemplate>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[AutoTemplate] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The closest template for `module` above `line`, if any.
    pub fn for_instance(&self, module: &str, line: u32) -> Option<&AutoTemplate> {
        self.templates
            .iter()
            .filter(|t| t.module_name == module && t.line < line)
            .max_by_key(|t| t.line)
    }
}

/// Parse the inside of one block comment; `None` if it is not a template.
pub fn parse_template(body: &str, line: u32, range: TextRange) -> Option<AutoTemplate> {
    let header = HEADER.as_ref().ok()?;
    let caps = header.captures(body)?;

    let module_name = SmolStr::new(caps.get(1)?.as_str());
    let instance_pattern = caps
        .get(2)
        .map(|m| m.as_str().replace("\\\"", "\""))
        .unwrap_or_default();
    let rest = caps.get(3).map_or("", |m| m.as_str());

    let rules = rest
        .lines()
        .filter_map(|raw| {
            let code = raw.find("//").map_or(raw, |idx| &raw[..idx]);
            let (port, signal) = code.split_once("=>")?;
            let (port, signal) = (port.trim(), signal.trim());
            if port.is_empty() {
                tracing::debug!(line = raw, "skipping template rule without port pattern");
                return None;
            }
            Some(TemplateRule {
                port_pattern: port.to_string(),
                signal: signal.to_string(),
            })
        })
        .collect();

    Some(AutoTemplate {
        module_name,
        instance_pattern,
        rules,
        line,
        range,
    })
}
