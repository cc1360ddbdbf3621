//! Recursive descent parser for SystemVerilog module structure
//!
//! Works on the significant (non-trivia) tokens and builds the structural
//! tree in [`super::ast`]. Comments are collected in a separate pass so each
//! one keeps its byte range. Parsing never fails: problems are recorded as
//! [`SyntaxError`]s and the parser resynchronises at `;` or `endmodule`.

use std::ops::Range;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::ast::{
    Comment, CommentKind, Connection, DeclName, InstanceDecl, ModuleDecl, NetDecl, ParamDecl,
    PortDecl, PortDirection, PortList, SourceFile,
};
use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use crate::base::text::squash_whitespace;

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse SystemVerilog source text into its structural tree
pub fn parse(input: &str) -> SourceFile {
    let mut comments = Vec::new();
    let mut tokens = Vec::new();
    for token in Lexer::new(input) {
        match token.kind {
            SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT => comments.push(Comment {
                kind: if token.kind == SyntaxKind::LINE_COMMENT {
                    CommentKind::Line
                } else {
                    CommentKind::Block
                },
                text: token.text.to_string(),
                range: token.range(),
            }),
            SyntaxKind::WHITESPACE => {}
            _ => tokens.push(token),
        }
    }

    let mut parser = Parser::new(input, &tokens);
    parser.parse_source_file();
    let mut file = parser.finish();

    for module in &mut file.modules {
        module.comments = comments
            .iter()
            .filter(|c| module.range.contains_range(c.range))
            .cloned()
            .collect();
    }
    file.comments = comments;
    file
}

/// Token index ranges of a delimited, comma-separated list
struct Delimited {
    open: usize,
    close: usize,
    items: Vec<Range<usize>>,
}

/// Type portion of a declaration: everything between direction and name
#[derive(Default)]
struct TypeInfo {
    data_type: Option<SmolStr>,
    packed: String,
    explicit: bool,
}

/// The parser state
struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token<'a>],
    pos: usize,
    modules: Vec<ModuleDecl>,
    includes: Vec<SmolStr>,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: &'a [Token<'a>]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            modules: Vec::new(),
            includes: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> SourceFile {
        SourceFile {
            modules: self.modules,
            comments: Vec::new(),
            includes: self.includes,
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.kind_at(self.pos)
    }

    fn current_text(&self) -> &'a str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }

    fn kind_at(&self, idx: usize) -> SyntaxKind {
        self.tokens
            .get(idx)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::ERROR)
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.kind_at(self.pos + n)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        !self.at_eof() && self.current_kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Offset of the current token, or end of input
    fn offset(&self) -> TextSize {
        self.current()
            .map(|t| t.offset)
            .unwrap_or_else(|| TextSize::of(self.source))
    }

    /// End offset of the most recently consumed token
    fn prev_end(&self) -> TextSize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|t| t.end())
            .unwrap_or_default()
    }

    /// Source text covered by a token index range
    fn text(&self, range: Range<usize>) -> &'a str {
        if range.is_empty() {
            return "";
        }
        let start = u32::from(self.tokens[range.start].offset) as usize;
        let end = u32::from(self.tokens[range.end - 1].end()) as usize;
        &self.source[start..end]
    }

    fn text_range(&self, range: Range<usize>) -> TextRange {
        if range.is_empty() {
            return TextRange::empty(self.offset());
        }
        TextRange::new(self.tokens[range.start].offset, self.tokens[range.end - 1].end())
    }

    fn name_at(&self, idx: usize) -> SmolStr {
        match self.tokens.get(idx) {
            Some(t) if t.kind.is_name() => SmolStr::new(t.text),
            _ => SmolStr::default(),
        }
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_label(&mut self) {
        if self.eat(SyntaxKind::COLON) && self.current_kind().is_name() {
            self.bump();
        }
    }

    /// Skip a balanced delimiter group starting at the current opener
    fn skip_balanced(&mut self) {
        match self.matching_close(self.pos) {
            Some(close) => self.pos = close + 1,
            None => {
                self.error("unclosed delimiter");
                self.pos = self.tokens.len();
            }
        }
    }

    /// Index of the delimiter closing the opener at `open`
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for idx in open..self.tokens.len() {
            let kind = self.tokens[idx].kind;
            if kind.is_open_delim() {
                depth += 1;
            } else if kind.is_close_delim() {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
        }
        None
    }

    /// Index of the delimiter opening the closer at `close`
    fn matching_open(&self, close: usize, floor: usize) -> Option<usize> {
        let mut depth = 0usize;
        for idx in (floor..=close).rev() {
            let kind = self.tokens[idx].kind;
            if kind.is_close_delim() {
                depth += 1;
            } else if kind.is_open_delim() {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
        }
        None
    }

    fn find_at_depth0(&self, range: Range<usize>, kind: SyntaxKind) -> Option<usize> {
        let mut depth = 0usize;
        for idx in range {
            let k = self.tokens[idx].kind;
            if k.is_open_delim() {
                depth += 1;
            } else if k.is_close_delim() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && k == kind {
                return Some(idx);
            }
        }
        None
    }

    /// Split a delimited group into comma-separated items, consuming it
    fn split_items(&mut self) -> Option<Delimited> {
        let open = self.pos;
        self.bump();
        let mut depth = 0usize;
        let mut item_start = self.pos;
        let mut items = Vec::new();

        while !self.at_eof() {
            let kind = self.current_kind();
            if kind.is_open_delim() {
                depth += 1;
            } else if kind.is_close_delim() {
                if depth == 0 {
                    if item_start < self.pos {
                        items.push(item_start..self.pos);
                    }
                    let close = self.pos;
                    self.bump();
                    return Some(Delimited { open, close, items });
                }
                depth -= 1;
            } else if kind == SyntaxKind::COMMA && depth == 0 {
                if item_start < self.pos {
                    items.push(item_start..self.pos);
                }
                item_start = self.pos + 1;
            }
            self.bump();
        }

        self.errors.push(SyntaxError::new(
            "unclosed delimiter",
            self.tokens[open].range(),
        ));
        None
    }

    /// Comma-separated items up to the terminating `;`, consuming it
    fn statement_items(&mut self) -> Vec<Range<usize>> {
        let mut depth = 0usize;
        let mut item_start = self.pos;
        let mut items = Vec::new();

        while !self.at_eof() {
            let kind = self.current_kind();
            if depth == 0 && matches!(kind, SyntaxKind::ENDMODULE_KW | SyntaxKind::ENDINTERFACE_KW)
            {
                self.error("expected ';'");
                break;
            }
            if kind.is_open_delim() {
                depth += 1;
            } else if kind.is_close_delim() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && kind == SyntaxKind::COMMA {
                if item_start < self.pos {
                    items.push(item_start..self.pos);
                }
                item_start = self.pos + 1;
            } else if depth == 0 && kind == SyntaxKind::SEMICOLON {
                if item_start < self.pos {
                    items.push(item_start..self.pos);
                }
                self.bump();
                return items;
            }
            self.bump();
        }

        if item_start < self.pos {
            items.push(item_start..self.pos);
        }
        items
    }

    /// Skip to just past the next `;` at nesting depth zero
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while !self.at_eof() {
            let kind = self.current_kind();
            if depth == 0 && matches!(kind, SyntaxKind::ENDMODULE_KW | SyntaxKind::ENDINTERFACE_KW)
            {
                return;
            }
            if kind.is_open_delim() {
                depth += 1;
            } else if kind.is_close_delim() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && kind == SyntaxKind::SEMICOLON {
                self.bump();
                return;
            }
            self.bump();
        }
    }

    /// Skip up to and including `kind`, stopping early at `endmodule`
    fn skip_past(&mut self, kind: SyntaxKind) {
        self.bump();
        while !self.at_eof() && !self.at(kind) && !self.at(SyntaxKind::ENDMODULE_KW) {
            self.bump();
        }
        if self.eat(kind) {
            self.skip_label();
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&mut self, message: impl Into<String>) {
        let range = self
            .current()
            .map(|t| t.range())
            .unwrap_or_else(|| TextRange::empty(TextSize::of(self.source)));
        self.errors.push(SyntaxError::new(message, range));
    }

    fn recover_to(&mut self, kind: SyntaxKind) {
        while !self.at_eof() && !self.at(kind) {
            self.bump();
        }
        self.bump();
    }

    // =========================================================================
    // Grammar rules
    // =========================================================================

    /// SourceFile = (Module | Interface | Directive | <anything>)*
    fn parse_source_file(&mut self) {
        while !self.at_eof() {
            match self.current_kind() {
                SyntaxKind::MODULE_KW | SyntaxKind::MACROMODULE_KW => {
                    self.parse_module(SyntaxKind::ENDMODULE_KW)
                }
                SyntaxKind::INTERFACE_KW => self.parse_module(SyntaxKind::ENDINTERFACE_KW),
                SyntaxKind::DIRECTIVE => self.parse_directive(),
                _ => self.bump(),
            }
        }
    }

    /// Compiler directives: `` `include `` is recorded, line directives are skipped
    fn parse_directive(&mut self) {
        let Some(token) = self.current().cloned() else {
            return;
        };
        self.bump();

        match token.text {
            "`include" => {
                if self.at(SyntaxKind::STRING) {
                    let path = self.current_text().trim_matches('"');
                    self.includes.push(SmolStr::new(path));
                    self.bump();
                }
            }
            "`define" | "`undef" | "`timescale" | "`default_nettype" | "`line" | "`pragma" => {
                let line_end = self.directive_line_end(token.end());
                while !self.at_eof() && self.offset() < line_end {
                    self.bump();
                }
            }
            "`ifdef" | "`ifndef" | "`elsif" => {
                if self.current_kind().is_name() {
                    self.bump();
                }
            }
            _ => {
                // Macro call with arguments
                if self.at(SyntaxKind::L_PAREN) && self.offset() == token.end() {
                    self.skip_balanced();
                }
            }
        }
    }

    /// End of a directive's logical line, following `\` continuations
    fn directive_line_end(&self, from: TextSize) -> TextSize {
        let mut start = u32::from(from) as usize;
        loop {
            match self.source[start..].find('\n') {
                Some(rel) => {
                    let newline = start + rel;
                    if self.source[..newline].trim_end_matches('\r').ends_with('\\') {
                        start = newline + 1;
                    } else {
                        return TextSize::new(newline as u32);
                    }
                }
                None => return TextSize::of(self.source),
            }
        }
    }

    /// Module = 'module' lifetime? Name Imports* ParameterPorts? PortList? ';' Item* 'endmodule'
    fn parse_module(&mut self, end_kind: SyntaxKind) {
        let start = self.offset();
        self.bump();

        while self.at(SyntaxKind::IDENT) && matches!(self.current_text(), "automatic" | "static") {
            self.bump();
        }

        if !self.current_kind().is_name() {
            self.error("expected module name");
            self.recover_to(end_kind);
            return;
        }
        let name_idx = self.pos;
        self.bump();

        let mut module = ModuleDecl {
            name: self.name_at(name_idx),
            name_range: self.tokens[name_idx].range(),
            range: TextRange::empty(start),
            parameters: Vec::new(),
            port_list: None,
            ports: Vec::new(),
            nets: Vec::new(),
            instances: Vec::new(),
            comments: Vec::new(),
        };

        while self.at(SyntaxKind::IMPORT_KW) {
            self.skip_statement();
        }

        if self.eat(SyntaxKind::HASH) && self.at(SyntaxKind::L_PAREN) {
            self.parse_parameter_port_list(&mut module);
        }

        if self.at(SyntaxKind::L_PAREN) {
            self.parse_port_list(&mut module);
        }

        if !self.eat(SyntaxKind::SEMICOLON) {
            self.error("expected ';' after module header");
            self.skip_statement();
        }

        self.parse_module_items(&mut module, end_kind);

        let end = if self.at(end_kind) {
            self.bump();
            let end = self.prev_end();
            self.skip_label();
            end
        } else {
            self.error(format!("missing end of module '{}'", module.name));
            TextSize::of(self.source)
        };

        module.range = TextRange::new(start, end);
        self.modules.push(module);
    }

    /// ParameterPorts = '#' '(' ParamAssignment (',' ParamAssignment)* ')'
    fn parse_parameter_port_list(&mut self, module: &mut ModuleDecl) {
        let Some(list) = self.split_items() else {
            return;
        };
        for item in list.items {
            if let Some(param) = self.param_from_item(item) {
                module.parameters.push(param);
            }
        }
    }

    fn param_from_item(&self, item: Range<usize>) -> Option<ParamDecl> {
        let eq = self.find_at_depth0(item.clone(), SyntaxKind::EQ);
        let name_end = eq.unwrap_or(item.end);
        let name_idx = (item.start..name_end)
            .rev()
            .find(|&idx| self.tokens[idx].kind == SyntaxKind::IDENT)?;
        Some(ParamDecl {
            name: self.name_at(name_idx),
            default: eq.map(|eq| self.text(eq + 1..item.end).trim().to_string()),
        })
    }

    /// PortList = '(' (AnsiPort | Name) (',' (AnsiPort | Name))* ')'
    fn parse_port_list(&mut self, module: &mut ModuleDecl) {
        let Some(list) = self.split_items() else {
            return;
        };

        let is_ansi = list
            .items
            .first()
            .map(|item| !(item.len() == 1 && self.tokens[item.start].kind.is_name()))
            .unwrap_or(true);

        let mut previous: Option<PortDecl> = None;
        for item in list.items {
            if is_ansi {
                match self.port_from_item(item.clone(), true, previous.as_ref()) {
                    Some(decl) => {
                        previous = Some(decl.clone());
                        module.ports.push(decl);
                    }
                    None => self.errors.push(SyntaxError::new(
                        "malformed port declaration",
                        self.text_range(item),
                    )),
                }
            } else if item.len() == 1 && self.tokens[item.start].kind.is_name() {
                module.ports.push(PortDecl {
                    name: self.name_at(item.start),
                    direction: None,
                    data_type: None,
                    packed: String::new(),
                    unpacked: String::new(),
                    range: self.text_range(item),
                    in_header: true,
                });
            }
        }

        module.port_list = Some(PortList {
            open_paren: self.tokens[list.open].offset,
            close_paren: self.tokens[list.close].offset,
            is_ansi,
        });
    }

    /// Index of the declared name within an item and the unpacked dimensions after it.
    ///
    /// Returns `None` when no name can be found.
    fn decl_name(&self, item: Range<usize>, floor: usize) -> Option<(usize, String)> {
        let end = self
            .find_at_depth0(item.clone(), SyntaxKind::EQ)
            .unwrap_or(item.end);
        let mut name_end = end;
        while name_end > floor && self.tokens[name_end - 1].kind == SyntaxKind::R_BRACKET {
            name_end = self.matching_open(name_end - 1, floor)?;
        }
        if name_end <= floor {
            return None;
        }
        let name_idx = name_end - 1;
        match self.tokens[name_idx].kind {
            kind if kind.is_name() || kind == SyntaxKind::DIRECTIVE => {
                Some((name_idx, self.text(name_end..end).to_string()))
            }
            _ => None,
        }
    }

    /// Everything between direction and name: keywords, user type, packed dims
    fn type_region(&self, range: Range<usize>) -> TypeInfo {
        let mut info = TypeInfo::default();
        let mut user_type = String::new();
        let mut packed: Option<(TextSize, TextSize)> = None;

        let mut idx = range.start;
        while idx < range.end {
            let token = &self.tokens[idx];
            info.explicit = true;
            match token.kind {
                SyntaxKind::L_BRACKET => {
                    let close = self
                        .matching_close(idx)
                        .filter(|&c| c < range.end)
                        .unwrap_or(range.end - 1);
                    let end = self.tokens[close].end();
                    packed = Some(match packed {
                        Some((start, _)) => (start, end),
                        None => (token.offset, end),
                    });
                    idx = close + 1;
                    continue;
                }
                SyntaxKind::INT_KW | SyntaxKind::INTEGER_KW => {
                    info.data_type = Some(SmolStr::new(token.text));
                }
                kind if kind.is_data_keyword()
                    || matches!(kind, SyntaxKind::SIGNED_KW | SyntaxKind::UNSIGNED_KW) => {}
                SyntaxKind::IDENT
                | SyntaxKind::ESCAPED_IDENT
                | SyntaxKind::COLON_COLON
                | SyntaxKind::DOT => user_type.push_str(token.text),
                _ => {}
            }
            idx += 1;
        }

        if !user_type.is_empty() {
            info.data_type = Some(SmolStr::new(user_type));
        }
        if let Some((start, end)) = packed {
            info.packed = squash_whitespace(&self.source[u32::from(start) as usize..u32::from(end) as usize]);
        }
        info
    }

    /// One port declaration item, inheriting omitted parts from `previous`
    fn port_from_item(
        &self,
        item: Range<usize>,
        in_header: bool,
        previous: Option<&PortDecl>,
    ) -> Option<PortDecl> {
        let mut type_start = item.start;
        let direction = match self.kind_at(item.start) {
            SyntaxKind::INPUT_KW => Some(PortDirection::Input),
            SyntaxKind::OUTPUT_KW => Some(PortDirection::Output),
            SyntaxKind::INOUT_KW | SyntaxKind::REF_KW => Some(PortDirection::Inout),
            _ => None,
        };
        if direction.is_some() {
            type_start += 1;
        }

        let (name_idx, unpacked) = self.decl_name(item.clone(), type_start)?;
        let info = self.type_region(type_start..name_idx);

        let (direction, data_type, packed) = match (direction, info.explicit, previous) {
            (None, false, Some(prev)) => (prev.direction, prev.data_type.clone(), prev.packed.clone()),
            (None, true, Some(prev)) => (prev.direction, info.data_type, info.packed),
            (None, _, None) => (Some(PortDirection::Inout), info.data_type, info.packed),
            (Some(dir), _, _) => (Some(dir), info.data_type, info.packed),
        };

        Some(PortDecl {
            name: self.name_at(name_idx),
            direction,
            data_type,
            packed,
            unpacked,
            range: self.text_range(item),
            in_header,
        })
    }

    /// Module items until the closing keyword
    fn parse_module_items(&mut self, module: &mut ModuleDecl, end_kind: SyntaxKind) {
        while !self.at_eof() && !self.at(end_kind) {
            if matches!(
                self.current_kind(),
                SyntaxKind::MODULE_KW | SyntaxKind::ENDMODULE_KW | SyntaxKind::ENDINTERFACE_KW
            ) {
                self.error("unexpected end of module");
                return;
            }
            let pos_before = self.pos;
            self.parse_module_item(module);
            // Safety: if we didn't make progress, force-skip a token
            if self.pos == pos_before {
                self.bump();
            }
        }
    }

    fn parse_module_item(&mut self, module: &mut ModuleDecl) {
        match self.current_kind() {
            kind if kind.is_direction() => self.parse_body_port_decl(module),
            kind if kind.is_data_keyword() => self.parse_net_decl(module),
            SyntaxKind::PARAMETER_KW | SyntaxKind::LOCALPARAM_KW => {
                for item in self.statement_items() {
                    if let Some(param) = self.param_from_item(item) {
                        module.parameters.push(param);
                    }
                }
            }
            SyntaxKind::GENVAR_KW
            | SyntaxKind::TYPEDEF_KW
            | SyntaxKind::IMPORT_KW
            | SyntaxKind::ASSIGN_KW => self.skip_statement(),
            SyntaxKind::ALWAYS_KW
            | SyntaxKind::ALWAYS_FF_KW
            | SyntaxKind::ALWAYS_COMB_KW
            | SyntaxKind::ALWAYS_LATCH_KW
            | SyntaxKind::INITIAL_KW
            | SyntaxKind::FINAL_KW => {
                self.bump();
                self.skip_procedural();
            }
            SyntaxKind::FUNCTION_KW => self.skip_past(SyntaxKind::ENDFUNCTION_KW),
            SyntaxKind::TASK_KW => self.skip_past(SyntaxKind::ENDTASK_KW),
            SyntaxKind::CASE_KW => self.skip_past(SyntaxKind::ENDCASE_KW),
            // Generate structure is transparent so nested instances are still seen
            SyntaxKind::GENERATE_KW
            | SyntaxKind::ENDGENERATE_KW
            | SyntaxKind::BEGIN_KW
            | SyntaxKind::END_KW
            | SyntaxKind::ELSE_KW => {
                self.bump();
                self.skip_label();
            }
            SyntaxKind::IF_KW | SyntaxKind::FOR_KW => {
                self.bump();
                if self.at(SyntaxKind::L_PAREN) {
                    self.skip_balanced();
                }
            }
            SyntaxKind::DIRECTIVE => self.parse_directive(),
            SyntaxKind::SEMICOLON => self.bump(),
            kind if kind.is_name() => self.parse_name_led_item(module),
            _ => self.skip_statement(),
        }
    }

    /// Event/delay control followed by one procedural statement
    fn skip_procedural(&mut self) {
        loop {
            if self.eat(SyntaxKind::AT) {
                if self.at(SyntaxKind::L_PAREN) {
                    self.skip_balanced();
                } else {
                    self.bump();
                }
            } else if self.eat(SyntaxKind::HASH) {
                if self.at(SyntaxKind::L_PAREN) {
                    self.skip_balanced();
                } else {
                    self.bump();
                }
            } else {
                break;
            }
        }
        self.skip_procedural_statement();
    }

    fn skip_procedural_statement(&mut self) {
        match self.current_kind() {
            SyntaxKind::BEGIN_KW | SyntaxKind::FORK_KW => {
                self.bump();
                let mut depth = 1usize;
                while !self.at_eof() && depth > 0 {
                    match self.current_kind() {
                        SyntaxKind::BEGIN_KW | SyntaxKind::FORK_KW => depth += 1,
                        SyntaxKind::END_KW | SyntaxKind::JOIN_KW => depth -= 1,
                        SyntaxKind::ENDMODULE_KW => return,
                        _ => {}
                    }
                    self.bump();
                }
                self.skip_label();
            }
            SyntaxKind::CASE_KW => self.skip_past(SyntaxKind::ENDCASE_KW),
            SyntaxKind::IF_KW => {
                self.bump();
                if self.at(SyntaxKind::L_PAREN) {
                    self.skip_balanced();
                }
                self.skip_procedural_statement();
                if self.eat(SyntaxKind::ELSE_KW) {
                    self.skip_procedural_statement();
                }
            }
            SyntaxKind::FOR_KW => {
                self.bump();
                if self.at(SyntaxKind::L_PAREN) {
                    self.skip_balanced();
                }
                self.skip_procedural_statement();
            }
            SyntaxKind::AT | SyntaxKind::HASH => self.skip_procedural(),
            _ => self.skip_statement(),
        }
    }

    /// Non-ANSI body port declaration: `input [7:0] a, b;`
    fn parse_body_port_decl(&mut self, module: &mut ModuleDecl) {
        let items = self.statement_items();
        let mut previous: Option<PortDecl> = None;
        for item in items {
            match self.port_from_item(item.clone(), false, previous.as_ref()) {
                Some(decl) => {
                    previous = Some(decl.clone());
                    module.ports.push(decl);
                }
                None => self.errors.push(SyntaxError::new(
                    "malformed port declaration",
                    self.text_range(item),
                )),
            }
        }
    }

    /// Net or variable declaration: `logic [7:0] a, b = 0;`
    fn parse_net_decl(&mut self, module: &mut ModuleDecl) {
        let start = self.pos;
        let items = self.statement_items();
        let Some(first) = items.first().cloned() else {
            return;
        };

        let mut info = TypeInfo::default();
        let mut names = Vec::new();
        for (idx, item) in items.into_iter().enumerate() {
            let Some((name_idx, unpacked)) = self.decl_name(item.clone(), item.start) else {
                continue;
            };
            if idx == 0 {
                info = self.type_region(first.start..name_idx);
            }
            names.push(DeclName {
                name: self.name_at(name_idx),
                range: self.tokens[name_idx].range(),
                unpacked,
            });
        }

        if !names.is_empty() {
            module.nets.push(NetDecl {
                data_type: info.data_type,
                packed: info.packed,
                names,
                range: TextRange::new(self.tokens[start].offset, self.prev_end()),
            });
        }
    }

    /// An item starting with a name: instantiation or user-typed declaration
    fn parse_name_led_item(&mut self, module: &mut ModuleDecl) {
        match self.nth(1) {
            SyntaxKind::COLON_COLON | SyntaxKind::L_BRACKET => self.parse_net_decl(module),
            SyntaxKind::HASH => self.parse_instances(module),
            kind if kind.is_name() => {
                let mut idx = self.pos + 2;
                while self.kind_at(idx) == SyntaxKind::L_BRACKET {
                    match self.matching_close(idx) {
                        Some(close) => idx = close + 1,
                        None => break,
                    }
                }
                if self.kind_at(idx) == SyntaxKind::L_PAREN {
                    self.parse_instances(module);
                } else {
                    self.parse_net_decl(module);
                }
            }
            _ => self.skip_statement(),
        }
    }

    /// Instantiation = Name ParamOverrides? Instance (',' Instance)* ';'
    fn parse_instances(&mut self, module: &mut ModuleDecl) {
        let start = self.offset();
        let module_name = self.name_at(self.pos);
        self.bump();

        if self.eat(SyntaxKind::HASH) {
            if self.at(SyntaxKind::L_PAREN) {
                self.skip_balanced();
            } else {
                self.bump();
            }
        }

        loop {
            if !self.current_kind().is_name() {
                self.error("expected instance name");
                self.skip_statement();
                return;
            }
            let instance_name = self.name_at(self.pos);
            self.bump();

            while self.at(SyntaxKind::L_BRACKET) {
                self.skip_balanced();
            }

            if !self.at(SyntaxKind::L_PAREN) {
                self.error("expected '(' after instance name");
                self.skip_statement();
                return;
            }

            let Some(list) = self.split_items() else {
                return;
            };

            let mut instance = InstanceDecl {
                module_name: module_name.clone(),
                instance_name,
                range: TextRange::new(start, self.tokens[list.close].end()),
                open_paren: self.tokens[list.open].offset,
                close_paren: self.tokens[list.close].offset,
                connections: Vec::new(),
                has_wildcard: false,
                has_positional: false,
            };
            for item in list.items {
                self.connection_from_item(item, &mut instance);
            }
            module.instances.push(instance);

            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }

        if !self.eat(SyntaxKind::SEMICOLON) {
            self.error("expected ';' after instantiation");
        }
    }

    /// `.port(expr)`, `.port()`, `.port`, `.*`, or a positional expression.
    /// One item normally holds one connection; a missing comma leaves
    /// several named connections in a row.
    fn connection_from_item(&self, item: Range<usize>, instance: &mut InstanceDecl) {
        let mut start = item.start;
        while start < item.end {
            let first = self.kind_at(start);
            if first == SyntaxKind::DOT_STAR {
                instance.has_wildcard = true;
                start += 1;
                continue;
            }
            if first != SyntaxKind::DOT || start + 1 >= item.end || !self.kind_at(start + 1).is_name() {
                instance.has_positional = true;
                return;
            }

            let port = self.name_at(start + 1);
            let (expr, end) = if start + 2 < item.end && self.kind_at(start + 2) == SyntaxKind::L_PAREN {
                let close = self
                    .matching_close(start + 2)
                    .filter(|close| *close < item.end)
                    .unwrap_or(item.end - 1);
                let expr = (close > start + 3).then(|| self.text(start + 3..close).trim().to_string());
                (expr, close + 1)
            } else {
                (Some(port.to_string()), start + 2)
            };

            instance.connections.push(Connection {
                port,
                expr,
                range: self.text_range(start..end),
            });
            start = end;
        }
    }
}
