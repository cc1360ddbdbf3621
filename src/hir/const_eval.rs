//! Constant evaluation of packed ranges.
//!
//! Only the integer subset that shows up in port declarations is supported:
//! literals, parameters, `+ - * / % ** << >>`, parentheses, unary minus and
//! `$clog2`. Anything else evaluates to `None` and the width stays unknown.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::parser::{ModuleDecl, SyntaxKind, Token, tokenize};

/// Parameter values visible to a module's declarations.
#[derive(Debug, Clone, Default)]
pub struct ParamEnv {
    values: FxHashMap<SmolStr, i64>,
}

impl ParamEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every parameter default in declaration order.
    ///
    /// Each default may refer to the parameters declared before it.
    pub fn from_module(module: &ModuleDecl) -> Self {
        let mut env = Self::new();
        for param in &module.parameters {
            let value = param.default.as_deref().and_then(|text| env.eval(text));
            if let Some(value) = value {
                env.values.insert(param.name.clone(), value);
            }
        }
        env
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, value: i64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Evaluate an integer expression.
    pub fn eval(&self, text: &str) -> Option<i64> {
        let tokens: Vec<Token<'_>> = tokenize(text)
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .collect();
        let mut eval = Evaluator {
            tokens: &tokens,
            pos: 0,
            env: self,
        };
        let value = eval.expr(0)?;
        (eval.pos == tokens.len()).then_some(value)
    }
}

/// A packed range reduced to numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatedRange {
    pub width: u32,
    pub msb: i64,
    pub lsb: i64,
}

/// Evaluate packed dimensions such as `[WIDTH-1:0]` or `[3:0][7:0]`.
///
/// An empty string is a scalar of width 1. Multiple dimensions multiply and
/// report a flattened `[width-1:0]`.
pub fn eval_packed(packed: &str, env: &ParamEnv) -> Option<EvaluatedRange> {
    let packed = packed.trim();
    if packed.is_empty() {
        return Some(EvaluatedRange {
            width: 1,
            msb: 0,
            lsb: 0,
        });
    }

    let mut dims = Vec::new();
    for group in bracket_groups(packed)? {
        let (msb, lsb) = match split_top_level_colon(group) {
            Some((msb, lsb)) => (env.eval(msb)?, env.eval(lsb)?),
            None => (env.eval(group)? - 1, 0),
        };
        dims.push((msb, lsb));
    }

    let mut width: u64 = 1;
    for (msb, lsb) in &dims {
        width = width.checked_mul(msb.abs_diff(*lsb) + 1)?;
    }
    let width = u32::try_from(width).ok()?;

    match dims.as_slice() {
        [(msb, lsb)] => Some(EvaluatedRange {
            width,
            msb: *msb,
            lsb: *lsb,
        }),
        _ => Some(EvaluatedRange {
            width,
            msb: i64::from(width) - 1,
            lsb: 0,
        }),
    }
}

/// Contents of each top-level `[...]` group.
fn bracket_groups(text: &str) -> Option<Vec<&str>> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => {
                if depth == 0 {
                    start = idx + 1;
                }
                depth += 1;
            }
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    groups.push(&text[start..idx]);
                }
            }
            c if depth == 0 && !c.is_whitespace() => return None,
            _ => {}
        }
    }
    (depth == 0).then_some(groups)
}

fn split_top_level_colon(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some((&text[..idx], &text[idx + 1..])),
            _ => {}
        }
    }
    None
}

/// Ceiling log2 as defined for `$clog2`.
pub fn clog2(value: i64) -> i64 {
    if value <= 1 {
        return 0;
    }
    i64::from(64 - (value - 1).leading_zeros())
}

/// Value of a based literal such as `8'hFF` or `'d10`.
pub fn parse_based_literal(text: &str) -> Option<i64> {
    let (_, rest) = text.split_once('\'')?;
    let rest = rest.trim_start_matches(['s', 'S']);
    let mut chars = rest.chars();
    let radix = match chars.next()?.to_ascii_lowercase() {
        'b' => 2,
        'o' => 8,
        'd' => 10,
        'h' => 16,
        _ => return None,
    };
    let digits: String = chars.filter(|c| *c != '_').collect();
    i64::from_str_radix(&digits, radix).ok()
}

struct Evaluator<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    env: &'t ParamEnv,
}

impl<'t, 'a> Evaluator<'t, 'a> {
    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    /// Binary operator at the cursor: (symbol, precedence, token count)
    fn binary_op(&self) -> Option<(&'static str, u8, usize)> {
        let token = self.peek()?;
        let op = match token.kind {
            SyntaxKind::STAR if self.peek_kind(1) == Some(SyntaxKind::STAR) => ("**", 4, 2),
            SyntaxKind::STAR => ("*", 3, 1),
            SyntaxKind::SLASH => ("/", 3, 1),
            SyntaxKind::OPERATOR => match token.text {
                "%" => ("%", 3, 1),
                "+" => ("+", 2, 1),
                "-" => ("-", 2, 1),
                "<<" | "<<<" => ("<<", 1, 1),
                ">>" | ">>>" => (">>", 1, 1),
                _ => return None,
            },
            _ => return None,
        };
        Some(op)
    }

    fn expr(&mut self, min_prec: u8) -> Option<i64> {
        let mut lhs = self.unary()?;
        while let Some((op, prec, len)) = self.binary_op() {
            if prec < min_prec {
                break;
            }
            self.pos += len;
            // `**` is right-associative
            let next_min = if op == "**" { prec } else { prec + 1 };
            let rhs = self.expr(next_min)?;
            lhs = apply(op, lhs, rhs)?;
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<i64> {
        let token = self.peek()?;
        if token.kind == SyntaxKind::OPERATOR && matches!(token.text, "-" | "+") {
            let negate = token.text == "-";
            self.pos += 1;
            let value = self.unary()?;
            return Some(if negate { value.checked_neg()? } else { value });
        }
        self.atom()
    }

    fn atom(&mut self) -> Option<i64> {
        let token = self.peek()?;
        self.pos += 1;
        match token.kind {
            SyntaxKind::INTEGER => token.text.replace('_', "").parse().ok(),
            SyntaxKind::BASED_NUMBER => parse_based_literal(token.text),
            SyntaxKind::IDENT => self.env.get(token.text),
            SyntaxKind::L_PAREN => {
                let value = self.expr(0)?;
                self.expect(SyntaxKind::R_PAREN)?;
                Some(value)
            }
            SyntaxKind::SYSTEM_IDENT if token.text == "$clog2" => {
                self.expect(SyntaxKind::L_PAREN)?;
                let value = self.expr(0)?;
                self.expect(SyntaxKind::R_PAREN)?;
                Some(clog2(value))
            }
            _ => None,
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> Option<()> {
        if self.peek_kind(0) == Some(kind) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }
}

fn apply(op: &str, lhs: i64, rhs: i64) -> Option<i64> {
    match op {
        "+" => lhs.checked_add(rhs),
        "-" => lhs.checked_sub(rhs),
        "*" => lhs.checked_mul(rhs),
        "/" => lhs.checked_div(rhs),
        "%" => lhs.checked_rem(rhs),
        "**" => lhs.checked_pow(u32::try_from(rhs).ok()?),
        "<<" => lhs.checked_shl(u32::try_from(rhs).ok()?),
        ">>" => lhs.checked_shr(u32::try_from(rhs).ok()?),
        _ => None,
    }
}
