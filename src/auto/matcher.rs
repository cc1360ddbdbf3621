//! Template matching and the substitution language.
//!
//! Substitution runs in a fixed order on the first rule whose port pattern
//! matches the port name:
//!
//! 1. port captures `$1`, `${1}`, whole match `$0`
//! 2. instance captures `%1`, `%{1}`, whole match `%0`, `@` for `%1`
//! 3. built-ins `port.name`, `port.width`, `port.range`, `port.direction`, `inst.name`
//! 4. ternaries `c ? a : b` once `c` is a literal `0` or `1`
//! 5. integer functions `add sub mul div mod`, innermost first
//!
//! Steps 4 and 5 repeat until neither changes the text, so a ternary may
//! select on the result of a function and vice versa.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::template::AutoTemplate;
use crate::hir::{Diagnostic, PortInfo, codes};

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($pattern).ok());
    };
}

static_regex!(PORT_CAPTURE, r"\$\{(\d+)\}|\$(\d+)");
static_regex!(INST_CAPTURE, r"%\{(\d+)\}|%(\d+)");
static_regex!(
    BUILTIN,
    r"\b(port\.name|port\.width|port\.range|port\.direction|inst\.name)\b"
);
static_regex!(
    PAREN_TERNARY,
    r"\(\s*([01])\s*\?\s*([^()?:]*?)\s*:\s*([^()?:]*?)\s*\)"
);
static_regex!(WHOLE_TERNARY, r"^\s*([01])\s*\?\s*([^?:]*?)\s*:\s*([^?:]*?)\s*$");
static_regex!(
    FUNCTION,
    r"(add|sub|mul|div|mod)\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)"
);
static_regex!(
    LEFTOVER,
    r"\$\{?\d+\}?|%\{?\d+\}?|@|\b(?:port|inst)\.[A-Za-z_]+|(?:add|sub|mul|div|mod)\("
);
static_regex!(DIGITS, r"\d+");

/// Compiled patterns keyed by pattern text, for one run.
#[derive(Debug, Default)]
pub struct RegexCache {
    anchored: FxHashMap<String, Result<Regex, String>>,
    unanchored: FxHashMap<String, Result<Regex, String>>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern that must match the whole input.
    pub fn anchored(&mut self, pattern: &str) -> Result<&Regex, String> {
        self.anchored
            .entry(pattern.to_string())
            .or_insert_with(|| {
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Pattern that may match anywhere in the input.
    pub fn search(&mut self, pattern: &str) -> Result<&Regex, String> {
        self.unanchored
            .entry(pattern.to_string())
            .or_insert_with(|| Regex::new(pattern).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn len(&self) -> usize {
        self.anchored.len() + self.unanchored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What a port connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalValue {
    /// `_`: rendered as `.port()`.
    Unconnected,
    /// `'0`, `'1`, `'z`: rendered as `1'b0`, `1'b1`, `1'bz`.
    Constant(char),
    Expr(String),
}

impl SignalValue {
    /// Recognise the special values; anything else is an expression.
    pub fn from_text(text: &str) -> Self {
        match text.trim() {
            "_" => SignalValue::Unconnected,
            "'0" => SignalValue::Constant('0'),
            "'1" => SignalValue::Constant('1'),
            "'z" | "'Z" => SignalValue::Constant('z'),
            other => SignalValue::Expr(other.to_string()),
        }
    }

    /// Text between the connection's parentheses.
    pub fn render(&self) -> String {
        match self {
            SignalValue::Unconnected => String::new(),
            SignalValue::Constant(c) => format!("1'b{}", c),
            SignalValue::Expr(expr) => expr.clone(),
        }
    }

    pub fn is_special(&self) -> bool {
        !matches!(self, SignalValue::Expr(_))
    }

    pub fn expr(&self) -> Option<&str> {
        match self {
            SignalValue::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}

/// Result of matching one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub signal: SignalValue,
    /// Set when a template rule produced the signal.
    pub from_rule: bool,
}

/// Resolves port connections for one instance.
pub struct TemplateMatcher<'t> {
    template: Option<&'t AutoTemplate>,
    instance_name: SmolStr,
    /// `%0`, `%1`, ...; empty when the instance pattern did not match.
    inst_captures: Vec<String>,
    warned: FxHashSet<(SmolStr, String)>,
}

impl<'t> TemplateMatcher<'t> {
    pub fn new(
        template: Option<&'t AutoTemplate>,
        instance_name: &str,
        regexes: &mut RegexCache,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let inst_captures = match template {
            None => Vec::new(),
            Some(t) if t.instance_pattern.is_empty() => DIGITS
                .as_ref()
                .and_then(|re| re.find(instance_name))
                .map(|m| vec![instance_name.to_string(), m.as_str().to_string()])
                .unwrap_or_default(),
            Some(t) => match regexes.anchored(&t.instance_pattern) {
                Ok(re) => re
                    .captures(instance_name)
                    .map(|caps| capture_list(&caps))
                    .unwrap_or_default(),
                Err(err) => {
                    diagnostics.push(
                        Diagnostic::warning(format!(
                            "invalid instance pattern \"{}\" in AUTO_TEMPLATE for '{}': {}",
                            t.instance_pattern, t.module_name, err
                        ))
                        .with_code(codes::INVALID_PATTERN),
                    );
                    Vec::new()
                }
            },
        };

        Self {
            template,
            instance_name: SmolStr::new(instance_name),
            inst_captures,
            warned: FxHashSet::default(),
        }
    }

    /// Resolve the signal for one port. The first matching rule wins.
    pub fn match_port(
        &mut self,
        port: &PortInfo,
        regexes: &mut RegexCache,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Resolved {
        let Some(template) = self.template else {
            return Resolved {
                signal: SignalValue::Expr(port.name.to_string()),
                from_rule: false,
            };
        };

        for rule in &template.rules {
            let port_captures = match regexes.anchored(&rule.port_pattern) {
                Ok(re) => match re.captures(&port.name) {
                    Some(caps) => capture_list(&caps),
                    None => continue,
                },
                Err(err) => {
                    self.warn_once(
                        port,
                        format!("pattern:{}", rule.port_pattern),
                        diagnostics,
                        || {
                            Diagnostic::warning(format!(
                                "invalid port pattern \"{}\": {}; comparing literally",
                                rule.port_pattern, err
                            ))
                            .with_code(codes::INVALID_PATTERN)
                        },
                    );
                    if rule.port_pattern.as_str() != port.name.as_str() {
                        continue;
                    }
                    vec![port.name.to_string()]
                }
            };

            let raw = SignalValue::from_text(&rule.signal);
            if raw.is_special() {
                return Resolved {
                    signal: raw,
                    from_rule: true,
                };
            }

            let text = self.substitute(&rule.signal, &port_captures, port);
            self.report_leftovers(&text, port, diagnostics);
            return Resolved {
                signal: SignalValue::from_text(&text),
                from_rule: true,
            };
        }

        Resolved {
            signal: SignalValue::Expr(port.name.to_string()),
            from_rule: false,
        }
    }

    /// Run the substitution pipeline on one signal expression.
    pub fn substitute(&self, expr: &str, port_captures: &[String], port: &PortInfo) -> String {
        let mut text = replace_captures(&PORT_CAPTURE, expr, port_captures);
        tracing::trace!(port = %port.name, %text, "after port captures");

        text = replace_captures(&INST_CAPTURE, &text, &self.inst_captures);
        if let Some(first) = self.inst_captures.get(1) {
            text = text.replace('@', first);
        }
        tracing::trace!(port = %port.name, %text, "after instance captures");

        if let Some(re) = BUILTIN.as_ref() {
            text = re
                .replace_all(&text, |caps: &Captures<'_>| match &caps[1] {
                    "port.name" => port.name.to_string(),
                    "port.width" => port
                        .width
                        .map(|w| w.to_string())
                        .unwrap_or_else(|| caps[0].to_string()),
                    "port.range" => port.declared_range().to_string(),
                    "port.direction" => port.direction.as_str().to_string(),
                    "inst.name" => self.instance_name.to_string(),
                    other => other.to_string(),
                })
                .into_owned();
        }
        tracing::trace!(port = %port.name, %text, "after built-ins");

        loop {
            let before = text.clone();
            text = reduce_ternaries(&text);
            text = reduce_functions(&text);
            if text == before {
                break;
            }
        }
        tracing::trace!(port = %port.name, %text, "after expressions");
        text
    }

    fn report_leftovers(&mut self, text: &str, port: &PortInfo, diagnostics: &mut Vec<Diagnostic>) {
        let Some(re) = LEFTOVER.as_ref() else {
            return;
        };
        let leftovers: Vec<String> = re.find_iter(text).map(|m| m.as_str().to_string()).collect();
        for placeholder in leftovers {
            let instance = self.instance_name.clone();
            self.warn_once(port, placeholder.clone(), diagnostics, || {
                Diagnostic::warning(format!(
                    "unresolved placeholder '{}' for port '{}' of instance '{}'",
                    placeholder, port.name, instance
                ))
                .with_code(codes::UNRESOLVED_PLACEHOLDER)
            });
        }
    }

    fn warn_once(
        &mut self,
        port: &PortInfo,
        key: String,
        diagnostics: &mut Vec<Diagnostic>,
        make: impl FnOnce() -> Diagnostic,
    ) {
        if self.warned.insert((port.name.clone(), key)) {
            diagnostics.push(make());
        }
    }
}

fn capture_list(caps: &Captures<'_>) -> Vec<String> {
    caps.iter()
        .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect()
}

/// Replace `$N`/`${N}` style references; unknown indices stay as written.
fn replace_captures(re: &LazyLock<Option<Regex>>, text: &str, captures: &[String]) -> String {
    let Some(re) = re.as_ref() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        let index = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<usize>().ok());
        match index.and_then(|i| captures.get(i)) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

fn reduce_ternaries(text: &str) -> String {
    let mut text = text.to_string();
    if let Some(re) = PAREN_TERNARY.as_ref() {
        loop {
            let next = re
                .replace_all(&text, |caps: &Captures<'_>| select(caps))
                .into_owned();
            if next == text {
                break;
            }
            text = next;
        }
    }
    if let Some(re) = WHOLE_TERNARY.as_ref() {
        if let Some(caps) = re.captures(&text) {
            return select(&caps);
        }
    }
    text
}

fn select(caps: &Captures<'_>) -> String {
    if &caps[1] == "1" {
        caps[2].to_string()
    } else {
        caps[3].to_string()
    }
}

fn reduce_functions(text: &str) -> String {
    let Some(re) = FUNCTION.as_ref() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        let (Ok(x), Ok(y)) = (caps[2].parse::<i64>(), caps[3].parse::<i64>()) else {
            return caps[0].to_string();
        };
        let value = match &caps[1] {
            "add" => x.checked_add(y),
            "sub" => x.checked_sub(y),
            "mul" => x.checked_mul(y),
            "div" => x.checked_div(y),
            "mod" => x.checked_rem(y),
            _ => None,
        };
        value
            .map(|v| v.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
