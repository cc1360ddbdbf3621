//! The expansion entry point.
//!
//! `expand` is a pure function of the port facts, the configuration and one
//! parsed file. It never touches the file system; writing the result back
//! is the caller's job.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::aggregator::{NetInfo, SignalAggregator};
use super::collector::{AutoInstSite, CollectedInfo, OrphanReason, collect};
use super::matcher::{RegexCache, SignalValue, TemplateMatcher};
use super::render::{
    Declaration, InstEntry, PortEntry, render_autoinst, render_autologic, render_autoports,
};
use super::replace::{Replacement, apply_replacements};
use super::template::TemplateSet;
use super::width::{Adaptation, UnusedSignal, adapt};
use crate::base::LineIndex;
use crate::base::text::{is_identifier, line_indent};
use crate::error::ApplyError;
use crate::hir::{Diagnostic, ParsedFile, PortFacts, PortInfo, PortLookup, codes};
use crate::parser::{InstanceDecl, ModuleDecl, PortDirection, SourceFile};
use crate::project::MergedConfig;

/// Counters reported after an expansion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandStats {
    pub instances_expanded: usize,
    pub logic_blocks: usize,
    pub port_lists: usize,
    pub replacements: usize,
}

/// Diagnostics are returned rather than logged; a
/// [`DiagnosticCollector`](crate::hir::DiagnosticCollector) logs them.
#[derive(Debug, Clone)]
pub struct ExpandResult {
    pub text: String,
    pub replacements: Vec<Replacement>,
    pub stats: ExpandStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExpandResult {
    pub fn is_changed(&self) -> bool {
        !self.replacements.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// A port waiting for its connection text until aggregation is complete.
struct PendingPort<'p> {
    port: &'p PortInfo,
    signal: SignalValue,
    from_rule: bool,
}

/// Expands and deletes AUTO regions. One expander may serve many files of
/// one run; it only caches compiled patterns.
pub struct AutoExpander<'a, F: PortFacts + ?Sized> {
    facts: &'a F,
    config: &'a MergedConfig,
    regexes: RegexCache,
}

/// Per-file state threaded through the module passes.
struct FileContext<'t> {
    text: &'t str,
    line_index: &'t LineIndex,
    file: Option<Arc<str>>,
    templates: TemplateSet,
    diagnostics: Vec<Diagnostic>,
    replacements: Vec<Replacement>,
    stats: ExpandStats,
}

impl FileContext<'_> {
    fn report(&mut self, diagnostic: Diagnostic, offset: TextSize) {
        let mut diagnostic = diagnostic.at(self.line_index.line_col(offset));
        if let Some(file) = &self.file {
            diagnostic = diagnostic.with_file(file.clone());
        }
        self.diagnostics.push(diagnostic);
    }

    /// Queue an edit for `region` unless it would not change anything.
    fn propose(&mut self, region: TextRange, candidate: String, description: String) -> bool {
        let current = &self.text[region];
        if current == candidate || (candidate.is_empty() && current.trim().is_empty()) {
            return false;
        }
        tracing::debug!(start = u32::from(region.start()), %description, "replacement");
        self.replacements.push(Replacement::new(
            usize::from(region.start())..usize::from(region.end()),
            candidate,
            description,
        ));
        true
    }

    /// Keep the separator before a marker consistent with what follows it:
    /// a comma is inserted when entries follow and dropped when none do.
    fn settle_comma(
        &mut self,
        has_entries: bool,
        missing: Option<TextSize>,
        present: Option<TextRange>,
        description: String,
    ) {
        match (has_entries, missing, present) {
            (true, Some(offset), _) => {
                self.replacements
                    .push(Replacement::insert(usize::from(offset), ",", description));
            }
            (false, _, Some(comma)) => {
                self.replacements.push(Replacement::new(
                    usize::from(comma.start())..usize::from(comma.end()),
                    "",
                    description,
                ));
            }
            _ => {}
        }
    }
}

impl<'a, F: PortFacts + ?Sized> AutoExpander<'a, F> {
    pub fn new(facts: &'a F, config: &'a MergedConfig) -> Self {
        Self {
            facts,
            config,
            regexes: RegexCache::new(),
        }
    }

    /// Expand every AUTO marker of a loaded file.
    pub fn expand_file(&mut self, file: &ParsedFile) -> Result<ExpandResult, ApplyError> {
        self.expand_with(
            &file.text,
            &file.syntax,
            &file.line_index,
            Some(file.display_path()),
        )
    }

    /// Expand every AUTO marker of `text`, given its parse.
    pub fn expand(&mut self, text: &str, syntax: &SourceFile) -> Result<ExpandResult, ApplyError> {
        self.expand_with(text, syntax, &LineIndex::new(text), None)
    }

    fn expand_with(
        &mut self,
        text: &str,
        syntax: &SourceFile,
        line_index: &LineIndex,
        file: Option<Arc<str>>,
    ) -> Result<ExpandResult, ApplyError> {
        let mut template_diags = Vec::new();
        let templates = TemplateSet::collect(&syntax.comments, line_index, &mut template_diags);
        let mut cx = FileContext {
            text,
            line_index,
            file,
            templates,
            diagnostics: Vec::new(),
            replacements: Vec::new(),
            stats: ExpandStats::default(),
        };
        for diag in template_diags {
            let diag = match &cx.file {
                Some(file) => diag.with_file(file.clone()),
                None => diag,
            };
            cx.diagnostics.push(diag);
        }

        for module in &syntax.modules {
            let info = collect(module, text);
            report_orphans(&mut cx, &info);
            if !info.has_markers() {
                continue;
            }
            tracing::debug!(module = %module.name, "expanding module");
            self.expand_module(&mut cx, module, &info);
        }

        finish(cx)
    }

    fn expand_module(&mut self, cx: &mut FileContext<'_>, module: &ModuleDecl, info: &CollectedInfo) {
        let mut aggregator = SignalAggregator::new();
        let mut pending: Vec<(&AutoInstSite, Vec<PendingPort<'_>>)> = Vec::new();
        let lookups: Vec<PortLookup> = module
            .instances
            .iter()
            .map(|inst| self.facts.module_ports(&inst.module_name))
            .collect();

        for (idx, inst) in module.instances.iter().enumerate() {
            let site = info.instances.iter().find(|s| s.instance == idx);
            let Some(ports) = lookups[idx].ports() else {
                if site.is_some() {
                    self.unresolved_module(cx, inst);
                } else {
                    tracing::debug!(module = %inst.module_name, instance = %inst.instance_name, "module not found");
                }
                continue;
            };

            self.aggregate_manual(cx, &mut aggregator, inst, ports, site);
            if let Some(site) = site {
                let resolved = self.resolve_ports(cx, &mut aggregator, inst, ports, site);
                pending.push((site, resolved));
            }
        }

        let mut unused: Vec<UnusedSignal> = Vec::new();
        for (site, ports) in &pending {
            let entries = self.adapt_ports(cx, &aggregator, info, site, ports, &mut unused);
            let inst = &module.instances[site.instance];
            let indent = line_indent(cx.text, usize::from(inst.range.start()));
            let candidate = render_autoinst(&entries, self.config, indent);
            let has_entries = !candidate.is_empty();
            if cx.propose(
                site.region(),
                candidate,
                format!("AUTOINST {} {}", site.module_name, site.instance_name),
            ) {
                cx.stats.instances_expanded += 1;
            }
            cx.settle_comma(
                has_entries,
                site.comma_at,
                site.comma,
                format!("comma before AUTOINST {}", site.instance_name),
            );
        }

        let module_indent = line_indent(cx.text, usize::from(module.range.start()));
        self.expand_logic(cx, &aggregator, info, &unused, module_indent);
        self.expand_ports(cx, &aggregator, info, module_indent);
    }

    fn unresolved_module(&self, cx: &mut FileContext<'_>, inst: &InstanceDecl) {
        let message = format!(
            "cannot resolve module '{}' instantiated as '{}'",
            inst.module_name, inst.instance_name
        );
        let diag = if self.config.is_strict() {
            Diagnostic::error(message).with_code(codes::UNRESOLVED_MODULE)
        } else {
            Diagnostic::warning(message).with_code(codes::MODULE_NOT_FOUND)
        };
        cx.report(diag, inst.range.start());
    }

    /// Fold hand-written identifier connections into the aggregator.
    fn aggregate_manual(
        &self,
        cx: &mut FileContext<'_>,
        aggregator: &mut SignalAggregator,
        inst: &InstanceDecl,
        ports: &[PortInfo],
        site: Option<&AutoInstSite>,
    ) {
        let manual = inst
            .connections
            .iter()
            .filter(|c| site.is_none_or(|s| c.range.end() <= s.marker.start()));
        for conn in manual {
            let Some(port) = ports.iter().find(|p| p.name == conn.port) else {
                if site.is_some() {
                    let message = format!(
                        "module '{}' has no port '{}' (instance '{}')",
                        inst.module_name, conn.port, inst.instance_name
                    );
                    let diag = if self.config.is_strict() {
                        Diagnostic::error(message).with_code(codes::UNKNOWN_PORT)
                    } else {
                        Diagnostic::warning(message).with_code(codes::UNKNOWN_PORT_WARNING)
                    };
                    cx.report(diag, conn.range.start());
                }
                continue;
            };
            if let Some(expr) = conn.expr.as_deref().filter(|e| is_identifier(e)) {
                aggregator.add_connection(&inst.instance_name, port, expr);
            }
        }

        if inst.has_wildcard {
            for port in ports.iter().filter(|p| inst.connection(&p.name).is_none()) {
                aggregator.add_connection(&inst.instance_name, port, &port.name);
            }
        }
    }

    /// Run the template matcher over the ports AUTOINST will connect.
    fn resolve_ports<'p>(
        &mut self,
        cx: &mut FileContext<'_>,
        aggregator: &mut SignalAggregator,
        inst: &InstanceDecl,
        ports: &'p [PortInfo],
        site: &AutoInstSite,
    ) -> Vec<PendingPort<'p>> {
        let line = cx.line_index.line(inst.range.start());
        let template = cx.templates.for_instance(&inst.module_name, line).cloned();
        let mut diags = Vec::new();
        let mut matcher = TemplateMatcher::new(
            template.as_ref(),
            &inst.instance_name,
            &mut self.regexes,
            &mut diags,
        );

        let filter = match site.filter.as_deref() {
            None => None,
            Some(pattern) => match self.regexes.search(pattern) {
                Ok(re) => Some(re.clone()),
                Err(err) => {
                    diags.push(
                        Diagnostic::warning(format!(
                            "invalid AUTOINST filter \"{}\": {}; connecting every port",
                            pattern, err
                        ))
                        .with_code(codes::INVALID_PATTERN),
                    );
                    None
                }
            },
        };

        let mut pending = Vec::new();
        for port in ports {
            if site.manual_ports.contains(&port.name) {
                continue;
            }
            if filter.as_ref().is_some_and(|re| !re.is_match(&port.name)) {
                continue;
            }
            let resolved = matcher.match_port(port, &mut self.regexes, &mut diags);
            if let Some(net) = resolved.signal.expr().filter(|e| is_identifier(e)) {
                aggregator.add_connection(&inst.instance_name, port, net);
            }
            pending.push(PendingPort {
                port,
                signal: resolved.signal,
                from_rule: resolved.from_rule,
            });
        }

        for diag in diags {
            cx.report(diag, inst.range.start());
        }
        pending
    }

    fn adapt_ports(
        &self,
        cx: &mut FileContext<'_>,
        aggregator: &SignalAggregator,
        info: &CollectedInfo,
        site: &AutoInstSite,
        ports: &[PendingPort<'_>],
        unused: &mut Vec<UnusedSignal>,
    ) -> Vec<InstEntry> {
        let mut entries = Vec::with_capacity(ports.len());
        for pending in ports {
            let connection = match &pending.signal {
                SignalValue::Expr(expr) => {
                    let net_width = info
                        .declared_widths
                        .get(expr.as_str())
                        .copied()
                        .or_else(|| aggregator.get(expr).and_then(|n| n.width));
                    let adapted = adapt(
                        pending.port,
                        expr,
                        net_width,
                        &site.instance_name,
                        pending.from_rule,
                    );
                    match adapted.adaptation {
                        Adaptation::Pad(signal) => {
                            if !unused.iter().any(|u| u.name == signal.name) {
                                unused.push(signal);
                            }
                        }
                        Adaptation::InoutMismatch {
                            port_width,
                            net_width,
                        } => {
                            cx.report(
                                Diagnostic::warning(format!(
                                    "inout port '{}' of '{}' is {} bits wide but '{}' is {}; left unadapted",
                                    pending.port.name, site.instance_name, port_width, expr, net_width
                                ))
                                .with_code(codes::INOUT_WIDTH_MISMATCH),
                                site.marker.start(),
                            );
                        }
                        Adaptation::Unchanged | Adaptation::Slice | Adaptation::ZeroExtend => {}
                    }
                    adapted.text
                }
                special => special.render(),
            };
            entries.push(InstEntry {
                port: pending.port.name.clone(),
                direction: pending.port.direction,
                connection,
            });
        }
        entries
    }

    fn expand_logic(
        &self,
        cx: &mut FileContext<'_>,
        aggregator: &SignalAggregator,
        info: &CollectedInfo,
        unused: &[UnusedSignal],
        module_indent: &str,
    ) {
        let indent = format!("{}{}", module_indent, self.config.indent);
        let mut emitted: FxHashSet<SmolStr> = FxHashSet::default();
        let mut decls: Vec<Declaration> = aggregator
            .internals()
            .filter(|net| !info.declared_signals.contains(&net.name))
            .inspect(|net| {
                emitted.insert(net.name.clone());
            })
            .map(net_declaration)
            .collect();
        decls.extend(
            unused
                .iter()
                .filter(|u| !info.declared_signals.contains(&u.name) && !emitted.contains(&u.name))
                .map(|u| Declaration {
                    name: u.name.clone(),
                    data_type: None,
                    range: u.range(),
                    unpacked: String::new(),
                }),
        );

        // Only the first block declares; later markers lose their blocks.
        for (idx, site) in info.logic.iter().enumerate() {
            let candidate = if idx == 0 {
                render_autologic(site.flavor, &decls, &indent)
            } else {
                String::new()
            };
            if cx.propose(
                site.region(),
                candidate,
                format!("{} in {}", site.flavor.marker(), info.module_name),
            ) {
                cx.stats.logic_blocks += 1;
            }
        }
    }

    fn expand_ports(
        &self,
        cx: &mut FileContext<'_>,
        aggregator: &SignalAggregator,
        info: &CollectedInfo,
        module_indent: &str,
    ) {
        let Some(site) = info.ports.first() else {
            return;
        };
        let undeclared = |net: &&NetInfo| {
            !info.declared_signals.contains(&net.name) && !site.declared_ports.contains(&net.name)
        };
        let entries: Vec<PortEntry> = aggregator
            .external_outputs()
            .filter(undeclared)
            .map(|net| (PortDirection::Output, net))
            .chain(aggregator.inouts().filter(undeclared).map(|net| (PortDirection::Inout, net)))
            .chain(
                aggregator
                    .external_inputs()
                    .filter(undeclared)
                    .map(|net| (PortDirection::Input, net)),
            )
            .map(|(direction, net)| PortEntry {
                direction,
                decl: net_declaration(net),
            })
            .collect();

        let candidate = render_autoports(&entries, self.config, module_indent);
        let has_entries = !candidate.is_empty();
        if cx.propose(
            site.region(),
            candidate,
            format!("AUTOPORTS in {}", info.module_name),
        ) {
            cx.stats.port_lists += 1;
        }
        cx.settle_comma(
            has_entries,
            site.comma_at,
            site.comma,
            format!("comma before AUTOPORTS in {}", info.module_name),
        );
    }

    /// Remove every generated region, leaving the markers in place.
    pub fn delete(&mut self, text: &str, syntax: &SourceFile) -> Result<ExpandResult, ApplyError> {
        let line_index = LineIndex::new(text);
        let mut cx = FileContext {
            text,
            line_index: &line_index,
            file: None,
            templates: TemplateSet::default(),
            diagnostics: Vec::new(),
            replacements: Vec::new(),
            stats: ExpandStats::default(),
        };

        for module in &syntax.modules {
            let info = collect(module, text);
            for site in &info.instances {
                if cx.propose(site.region(), String::new(), format!("delete AUTOINST {}", site.instance_name)) {
                    cx.stats.instances_expanded += 1;
                }
                cx.settle_comma(false, None, site.comma, format!("delete comma before AUTOINST {}", site.instance_name));
            }
            for site in &info.logic {
                if cx.propose(site.region(), String::new(), format!("delete {}", site.flavor.marker())) {
                    cx.stats.logic_blocks += 1;
                }
            }
            for site in &info.ports {
                let closing = closing_line(&text[site.region()]);
                if cx.propose(site.region(), closing, "delete AUTOPORTS".to_string()) {
                    cx.stats.port_lists += 1;
                }
                cx.settle_comma(false, None, site.comma, "delete comma before AUTOPORTS".to_string());
            }
        }

        finish(cx)
    }
}

/// What stays of a port list region once its entries are removed: the
/// line break and indentation before the closing parenthesis, if any.
fn closing_line(current: &str) -> String {
    match current.rfind('\n') {
        Some(idx) if current[idx + 1..].trim().is_empty() => current[idx..].to_string(),
        _ => String::new(),
    }
}

fn net_declaration(net: &NetInfo) -> Declaration {
    let range = match net.data_type {
        Some(_) => net.original_range.clone(),
        None => net.declared_range().to_string(),
    };
    Declaration {
        name: net.name.clone(),
        data_type: net.data_type.clone(),
        range,
        unpacked: net.unpacked.clone(),
    }
}

fn report_orphans(cx: &mut FileContext<'_>, info: &CollectedInfo) {
    for orphan in &info.orphans {
        let diag = match orphan.reason {
            OrphanReason::Positional => Diagnostic::warning(format!(
                "{} ignored: instantiation uses positional connections",
                orphan.text
            ))
            .with_code(codes::POSITIONAL_CONNECTIONS),
            OrphanReason::Wildcard => Diagnostic::warning(format!(
                "{} ignored: instantiation already connects '.*'",
                orphan.text
            ))
            .with_code(codes::ORPHAN_MARKER),
            OrphanReason::Duplicate => Diagnostic::warning(format!(
                "duplicate {} ignored",
                orphan.text
            ))
            .with_code(codes::ORPHAN_MARKER),
            OrphanReason::Unpaired => Diagnostic::warning(format!(
                "{} is not inside a construct it can expand",
                orphan.text
            ))
            .with_code(codes::ORPHAN_MARKER),
        };
        cx.report(diag, orphan.marker.start());
    }
}

fn finish(cx: FileContext<'_>) -> Result<ExpandResult, ApplyError> {
    let text = apply_replacements(cx.text, &cx.replacements)?;
    let stats = ExpandStats {
        replacements: cx.replacements.len(),
        ..cx.stats
    };
    tracing::debug!(
        replacements = stats.replacements,
        instances = stats.instances_expanded,
        "expansion finished"
    );
    Ok(ExpandResult {
        text,
        replacements: cx.replacements,
        stats,
        diagnostics: cx.diagnostics,
    })
}
