//! AUTO marker collection for one module.
//!
//! Markers are recognised only inside block comments and only as exact
//! matches. Everything the later stages need (byte offsets of the regions
//! they will rewrite, manually connected ports, hand-written declarations)
//! is gathered here in one pass over the module.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::render::END_OF_AUTOMATICS;
use crate::hir::{ParamEnv, eval_packed};
use crate::parser::{Comment, CommentKind, ModuleDecl};

const BEGIN_PREFIX: &str = "// Beginning of automatic";

/// Which declaration marker introduced an AUTOLOGIC block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicFlavor {
    /// `/*AUTOLOGIC*/`
    Logic,
    /// `/*AUTOWIRE*/`
    Wire,
    /// `/*AUTOREG*/`
    Reg,
}

impl LogicFlavor {
    pub fn marker(&self) -> &'static str {
        match self {
            LogicFlavor::Logic => "/*AUTOLOGIC*/",
            LogicFlavor::Wire => "/*AUTOWIRE*/",
            LogicFlavor::Reg => "/*AUTOREG*/",
        }
    }

    /// Declaration keyword for generated lines.
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicFlavor::Logic => "logic",
            LogicFlavor::Wire => "wire",
            LogicFlavor::Reg => "reg",
        }
    }

    pub fn begin_sentinel(&self) -> String {
        let word = match self {
            LogicFlavor::Logic => "logic",
            LogicFlavor::Wire => "wires",
            LogicFlavor::Reg => "regs",
        };
        format!("{} {}", BEGIN_PREFIX, word)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    Inst(Option<String>),
    Logic(LogicFlavor),
    Ports,
}

fn parse_marker(comment: &Comment) -> Option<Marker> {
    if comment.kind != CommentKind::Block {
        return None;
    }
    match comment.text.as_str() {
        "/*AUTOINST*/" => return Some(Marker::Inst(None)),
        "/*AUTOLOGIC*/" => return Some(Marker::Logic(LogicFlavor::Logic)),
        "/*AUTOWIRE*/" => return Some(Marker::Logic(LogicFlavor::Wire)),
        "/*AUTOREG*/" => return Some(Marker::Logic(LogicFlavor::Reg)),
        "/*AUTOPORTS*/" => return Some(Marker::Ports),
        _ => {}
    }
    let inner = comment
        .text
        .strip_prefix("/*AUTOINST(")?
        .strip_suffix(")*/")?
        .trim();
    let filter = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(inner)
        .replace("\\\"", "\"");
    Some(Marker::Inst(Some(filter)))
}

/// An AUTOINST marker paired with its instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoInstSite {
    /// Index into [`ModuleDecl::instances`].
    pub instance: usize,
    pub module_name: SmolStr,
    pub instance_name: SmolStr,
    pub marker: TextRange,
    pub close_paren: TextSize,
    /// Regex from `/*AUTOINST("...")*/`.
    pub filter: Option<String>,
    /// Ports connected by hand before the marker.
    pub manual_ports: FxHashSet<SmolStr>,
    /// End of the last manual connection when no comma follows it.
    pub comma_at: Option<TextSize>,
    /// The comma between the last manual connection and the marker.
    pub comma: Option<TextRange>,
}

impl AutoInstSite {
    /// Bytes owned by the generator: marker end up to the closing paren.
    pub fn region(&self) -> TextRange {
        TextRange::new(self.marker.end(), self.close_paren)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoLogicSite {
    pub flavor: LogicFlavor,
    pub marker: TextRange,
    /// Previously generated block, from the marker end to the end sentinel.
    pub existing: Option<TextRange>,
}

impl AutoLogicSite {
    pub fn region(&self) -> TextRange {
        self.existing
            .unwrap_or_else(|| TextRange::empty(self.marker.end()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoPortsSite {
    pub marker: TextRange,
    pub close_paren: TextSize,
    pub declared_ports: FxHashSet<SmolStr>,
    pub comma_at: Option<TextSize>,
    pub comma: Option<TextRange>,
}

impl AutoPortsSite {
    pub fn region(&self) -> TextRange {
        TextRange::new(self.marker.end(), self.close_paren)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanReason {
    /// Not inside any construct the marker can expand.
    Unpaired,
    /// A second marker of the same kind in one construct.
    Duplicate,
    /// The instantiation connects its ports by position.
    Positional,
    /// The instantiation uses `.*`.
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanMarker {
    pub marker: TextRange,
    pub text: String,
    pub reason: OrphanReason,
}

/// Everything the expander needs to know about one module.
#[derive(Debug, Clone, Default)]
pub struct CollectedInfo {
    pub module_name: SmolStr,
    pub instances: Vec<AutoInstSite>,
    pub logic: Vec<AutoLogicSite>,
    pub ports: Vec<AutoPortsSite>,
    /// Hand-written ports and signals, outside generated regions.
    pub declared_signals: FxHashSet<SmolStr>,
    /// Widths of hand-written declarations whose range evaluates.
    pub declared_widths: FxHashMap<SmolStr, u32>,
    pub orphans: Vec<OrphanMarker>,
}

impl CollectedInfo {
    pub fn has_markers(&self) -> bool {
        !(self.instances.is_empty() && self.logic.is_empty() && self.ports.is_empty())
    }

    /// Every region a marker owns, in source order.
    pub fn generated_regions(&self) -> Vec<TextRange> {
        let mut regions: Vec<TextRange> = self
            .instances
            .iter()
            .map(AutoInstSite::region)
            .chain(self.logic.iter().map(AutoLogicSite::region))
            .chain(self.ports.iter().map(AutoPortsSite::region))
            .filter(|r| !r.is_empty())
            .collect();
        regions.sort_by_key(|r| r.start());
        regions
    }
}

fn inside(range: TextRange, regions: &[TextRange]) -> bool {
    regions.iter().any(|r| r.contains_range(range))
}

/// Offset after `end` of the last item, unless a comma already separates it
/// from `marker`.
fn missing_comma(text: &str, last_end: Option<TextSize>, marker: TextRange) -> Option<TextSize> {
    let last_end = last_end?;
    let between = text.get(usize::from(last_end)..usize::from(marker.start()))?;
    (!between.contains(',')).then_some(last_end)
}

fn separator_comma(text: &str, last_end: Option<TextSize>, marker: TextRange) -> Option<TextRange> {
    let last_end = last_end?;
    let between = text.get(usize::from(last_end)..usize::from(marker.start()))?;
    let offset = between.find(',')?;
    let lead = &between[..offset];
    lead.trim()
        .is_empty()
        .then(|| TextRange::at(last_end + TextSize::of(lead), TextSize::of(",")))
}

/// Locate the generated block that directly follows an AUTOLOGIC marker.
fn existing_logic_block(comments: &[Comment], idx: usize, text: &str) -> Option<TextRange> {
    let marker = &comments[idx];
    let begin = comments.get(idx + 1)?;
    if begin.kind != CommentKind::Line || !begin.text.starts_with(BEGIN_PREFIX) {
        return None;
    }
    let gap = text.get(usize::from(marker.end())..usize::from(begin.start()))?;
    if !gap.trim().is_empty() {
        return None;
    }
    let end = comments[idx + 2..]
        .iter()
        .find(|c| c.kind == CommentKind::Line && c.text.trim_end() == END_OF_AUTOMATICS)?;
    Some(TextRange::new(marker.end(), end.end()))
}

/// Gather marker sites and hand-written declarations for one module.
pub fn collect(module: &ModuleDecl, text: &str) -> CollectedInfo {
    let mut info = CollectedInfo {
        module_name: module.name.clone(),
        ..CollectedInfo::default()
    };

    for (idx, comment) in module.comments.iter().enumerate() {
        let Some(marker) = parse_marker(comment) else {
            continue;
        };
        let orphan = |reason| OrphanMarker {
            marker: comment.range,
            text: comment.text.clone(),
            reason,
        };

        match marker {
            Marker::Inst(filter) => {
                let owner = module.instances.iter().enumerate().find(|(_, inst)| {
                    inst.open_paren < comment.start() && comment.end() <= inst.close_paren
                });
                let Some((instance, decl)) = owner else {
                    info.orphans.push(orphan(OrphanReason::Unpaired));
                    continue;
                };
                if info.instances.iter().any(|s| s.instance == instance) {
                    info.orphans.push(orphan(OrphanReason::Duplicate));
                    continue;
                }
                if decl.has_positional {
                    info.orphans.push(orphan(OrphanReason::Positional));
                    continue;
                }
                if decl.has_wildcard {
                    info.orphans.push(orphan(OrphanReason::Wildcard));
                    continue;
                }

                let manual: Vec<_> = decl
                    .connections
                    .iter()
                    .filter(|c| c.range.end() <= comment.start())
                    .collect();
                info.instances.push(AutoInstSite {
                    instance,
                    module_name: decl.module_name.clone(),
                    instance_name: decl.instance_name.clone(),
                    marker: comment.range,
                    close_paren: decl.close_paren,
                    filter,
                    manual_ports: manual.iter().map(|c| c.port.clone()).collect(),
                    comma_at: missing_comma(text, manual.last().map(|c| c.range.end()), comment.range),
                    comma: separator_comma(text, manual.last().map(|c| c.range.end()), comment.range),
                });
            }
            Marker::Logic(flavor) => {
                let in_parens = module.instances.iter().any(|inst| {
                    inst.open_paren < comment.start() && comment.end() <= inst.close_paren
                }) || module.port_list.is_some_and(|pl| {
                    pl.open_paren < comment.start() && comment.end() <= pl.close_paren
                });
                if in_parens {
                    info.orphans.push(orphan(OrphanReason::Unpaired));
                    continue;
                }
                info.logic.push(AutoLogicSite {
                    flavor,
                    marker: comment.range,
                    existing: existing_logic_block(&module.comments, idx, text),
                });
            }
            Marker::Ports => {
                let Some(list) = module.port_list.filter(|pl| {
                    pl.open_paren < comment.start() && comment.end() <= pl.close_paren
                }) else {
                    info.orphans.push(orphan(OrphanReason::Unpaired));
                    continue;
                };
                if !info.ports.is_empty() {
                    info.orphans.push(orphan(OrphanReason::Duplicate));
                    continue;
                }
                let before: Vec<_> = module
                    .ports
                    .iter()
                    .filter(|p| p.in_header && p.range.end() <= comment.start())
                    .collect();
                info.ports.push(AutoPortsSite {
                    marker: comment.range,
                    close_paren: list.close_paren,
                    declared_ports: before.iter().map(|p| p.name.clone()).collect(),
                    comma_at: missing_comma(text, before.last().map(|p| p.range.end()), comment.range),
                    comma: separator_comma(text, before.last().map(|p| p.range.end()), comment.range),
                });
            }
        }
    }

    let regions = info.generated_regions();
    let env = ParamEnv::from_module(module);
    let mut declare = |name: &SmolStr, data_type: &Option<SmolStr>, packed: &str| {
        info.declared_signals.insert(name.clone());
        if data_type.is_none() {
            if let Some(range) = eval_packed(packed, &env) {
                info.declared_widths.insert(name.clone(), range.width);
            }
        }
    };

    for port in module.ports.iter().filter(|p| !inside(p.range, &regions)) {
        if !port.name.is_empty() {
            declare(&port.name, &port.data_type, &port.packed);
        }
    }
    for net in module.nets.iter().filter(|n| !inside(n.range, &regions)) {
        for name in &net.names {
            declare(&name.name, &net.data_type, &net.packed);
        }
    }

    tracing::debug!(
        module = %info.module_name,
        instances = info.instances.len(),
        logic = info.logic.len(),
        ports = info.ports.len(),
        declared = info.declared_signals.len(),
        "collected markers"
    );
    info
}
