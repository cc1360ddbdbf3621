//! Logos-based lexer for SystemVerilog
//!
//! Fast, lossless tokenization using the logos crate: concatenating the text
//! of every token reproduces the input exactly.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    /// Byte range covered by this token
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, TextSize::of(self.text))
    }

    /// Byte offset just past this token
    pub fn end(&self) -> TextSize {
        self.offset + TextSize::of(self.text)
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Extends a `/*` match to the closing `*/`. An unterminated comment
/// swallows the rest of the input as an error token.
fn block_comment(lex: &mut logos::Lexer<LogosToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(idx) => {
            lex.bump(idx + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // =========================================================================
    // LITERALS AND NAMES
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*")]
    Ident,

    #[regex(r"\\[^ \t\r\n]+")]
    EscapedIdent,

    #[regex(r"\$[a-zA-Z0-9_$]+")]
    SystemIdent,

    #[regex(r"`[a-zA-Z_][a-zA-Z0-9_$]*")]
    Directive,

    #[regex(r"[0-9][0-9_]*")]
    Integer,

    #[regex(r"[0-9]*'[sS]?[bBoOdDhH][0-9a-fA-FxXzZ?_]+")]
    BasedNumber,

    #[regex(r"'[01xXzZ]")]
    UnbasedUnsized,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    Real,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(".*")]
    DotStar,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token("=", priority = 10)]
    Eq,
    #[token("#")]
    Hash,
    #[token("@")]
    At,
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("'")]
    Tick,
    #[regex(r"[+\-%&|^~!<>=]+")]
    Operator,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("module")]
    ModuleKw,
    #[token("macromodule")]
    MacromoduleKw,
    #[token("endmodule")]
    EndmoduleKw,
    #[token("interface")]
    InterfaceKw,
    #[token("endinterface")]
    EndinterfaceKw,
    #[token("input")]
    InputKw,
    #[token("output")]
    OutputKw,
    #[token("inout")]
    InoutKw,
    #[token("ref")]
    RefKw,
    #[token("logic")]
    LogicKw,
    #[token("wire")]
    WireKw,
    #[token("reg")]
    RegKw,
    #[token("bit")]
    BitKw,
    #[token("var")]
    VarKw,
    #[token("tri")]
    TriKw,
    #[token("int")]
    IntKw,
    #[token("integer")]
    IntegerKw,
    #[token("signed")]
    SignedKw,
    #[token("unsigned")]
    UnsignedKw,
    #[token("parameter")]
    ParameterKw,
    #[token("localparam")]
    LocalparamKw,
    #[token("assign")]
    AssignKw,
    #[token("always")]
    AlwaysKw,
    #[token("always_ff")]
    AlwaysFfKw,
    #[token("always_comb")]
    AlwaysCombKw,
    #[token("always_latch")]
    AlwaysLatchKw,
    #[token("initial")]
    InitialKw,
    #[token("final")]
    FinalKw,
    #[token("begin")]
    BeginKw,
    #[token("end")]
    EndKw,
    #[token("fork")]
    ForkKw,
    #[token("join")]
    #[token("join_any")]
    #[token("join_none")]
    JoinKw,
    #[token("generate")]
    GenerateKw,
    #[token("endgenerate")]
    EndgenerateKw,
    #[token("genvar")]
    GenvarKw,
    #[token("function")]
    FunctionKw,
    #[token("endfunction")]
    EndfunctionKw,
    #[token("task")]
    TaskKw,
    #[token("endtask")]
    EndtaskKw,
    #[token("case")]
    #[token("casex")]
    #[token("casez")]
    CaseKw,
    #[token("endcase")]
    EndcaseKw,
    #[token("if")]
    IfKw,
    #[token("else")]
    ElseKw,
    #[token("for")]
    ForKw,
    #[token("typedef")]
    TypedefKw,
    #[token("import")]
    ImportKw,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken::*;
        match token {
            Whitespace => SyntaxKind::WHITESPACE,
            LineComment => SyntaxKind::LINE_COMMENT,
            BlockComment => SyntaxKind::BLOCK_COMMENT,
            Ident => SyntaxKind::IDENT,
            EscapedIdent => SyntaxKind::ESCAPED_IDENT,
            SystemIdent => SyntaxKind::SYSTEM_IDENT,
            Directive => SyntaxKind::DIRECTIVE,
            Integer => SyntaxKind::INTEGER,
            BasedNumber => SyntaxKind::BASED_NUMBER,
            UnbasedUnsized => SyntaxKind::UNBASED_UNSIZED,
            Real => SyntaxKind::REAL,
            String => SyntaxKind::STRING,
            LParen => SyntaxKind::L_PAREN,
            RParen => SyntaxKind::R_PAREN,
            LBracket => SyntaxKind::L_BRACKET,
            RBracket => SyntaxKind::R_BRACKET,
            LBrace => SyntaxKind::L_BRACE,
            RBrace => SyntaxKind::R_BRACE,
            Semicolon => SyntaxKind::SEMICOLON,
            Comma => SyntaxKind::COMMA,
            Dot => SyntaxKind::DOT,
            DotStar => SyntaxKind::DOT_STAR,
            Colon => SyntaxKind::COLON,
            ColonColon => SyntaxKind::COLON_COLON,
            Eq => SyntaxKind::EQ,
            Hash => SyntaxKind::HASH,
            At => SyntaxKind::AT,
            Question => SyntaxKind::QUESTION,
            Star => SyntaxKind::STAR,
            Slash => SyntaxKind::SLASH,
            Tick => SyntaxKind::TICK,
            Operator => SyntaxKind::OPERATOR,
            ModuleKw => SyntaxKind::MODULE_KW,
            MacromoduleKw => SyntaxKind::MACROMODULE_KW,
            EndmoduleKw => SyntaxKind::ENDMODULE_KW,
            InterfaceKw => SyntaxKind::INTERFACE_KW,
            EndinterfaceKw => SyntaxKind::ENDINTERFACE_KW,
            InputKw => SyntaxKind::INPUT_KW,
            OutputKw => SyntaxKind::OUTPUT_KW,
            InoutKw => SyntaxKind::INOUT_KW,
            RefKw => SyntaxKind::REF_KW,
            LogicKw => SyntaxKind::LOGIC_KW,
            WireKw => SyntaxKind::WIRE_KW,
            RegKw => SyntaxKind::REG_KW,
            BitKw => SyntaxKind::BIT_KW,
            VarKw => SyntaxKind::VAR_KW,
            TriKw => SyntaxKind::TRI_KW,
            IntKw => SyntaxKind::INT_KW,
            IntegerKw => SyntaxKind::INTEGER_KW,
            SignedKw => SyntaxKind::SIGNED_KW,
            UnsignedKw => SyntaxKind::UNSIGNED_KW,
            ParameterKw => SyntaxKind::PARAMETER_KW,
            LocalparamKw => SyntaxKind::LOCALPARAM_KW,
            AssignKw => SyntaxKind::ASSIGN_KW,
            AlwaysKw => SyntaxKind::ALWAYS_KW,
            AlwaysFfKw => SyntaxKind::ALWAYS_FF_KW,
            AlwaysCombKw => SyntaxKind::ALWAYS_COMB_KW,
            AlwaysLatchKw => SyntaxKind::ALWAYS_LATCH_KW,
            InitialKw => SyntaxKind::INITIAL_KW,
            FinalKw => SyntaxKind::FINAL_KW,
            BeginKw => SyntaxKind::BEGIN_KW,
            EndKw => SyntaxKind::END_KW,
            ForkKw => SyntaxKind::FORK_KW,
            JoinKw => SyntaxKind::JOIN_KW,
            GenerateKw => SyntaxKind::GENERATE_KW,
            EndgenerateKw => SyntaxKind::ENDGENERATE_KW,
            GenvarKw => SyntaxKind::GENVAR_KW,
            FunctionKw => SyntaxKind::FUNCTION_KW,
            EndfunctionKw => SyntaxKind::ENDFUNCTION_KW,
            TaskKw => SyntaxKind::TASK_KW,
            EndtaskKw => SyntaxKind::ENDTASK_KW,
            CaseKw => SyntaxKind::CASE_KW,
            EndcaseKw => SyntaxKind::ENDCASE_KW,
            IfKw => SyntaxKind::IF_KW,
            ElseKw => SyntaxKind::ELSE_KW,
            ForKw => SyntaxKind::FOR_KW,
            TypedefKw => SyntaxKind::TYPEDEF_KW,
            ImportKw => SyntaxKind::IMPORT_KW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        Lexer::new(input)
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn test_lex_module_header() {
        let tokens: Vec<_> = Lexer::new("module top;").collect();
        assert_eq!(tokens.len(), 4); // module, whitespace, top, ;
        assert_eq!(tokens[0].kind, SyntaxKind::MODULE_KW);
        assert_eq!(tokens[1].kind, SyntaxKind::WHITESPACE);
        assert_eq!(tokens[2].kind, SyntaxKind::IDENT);
        assert_eq!(tokens[3].kind, SyntaxKind::SEMICOLON);
    }

    #[test]
    fn test_lex_is_lossless() {
        let input = "sub u_sub (.clk(clk), /*AUTOINST*/); // done\n`define W 8\n";
        let rebuilt: String = Lexer::new(input).map(|t| t.text).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_lex_marker_comment() {
        let tokens: Vec<_> = Lexer::new("(/*AUTOINST*/)").collect();
        assert_eq!(tokens[1].kind, SyntaxKind::BLOCK_COMMENT);
        assert_eq!(tokens[1].text, "/*AUTOINST*/");
        assert_eq!(tokens[1].offset, TextSize::new(1));
    }

    #[test]
    fn test_lex_block_comment_with_stars() {
        let tokens: Vec<_> = Lexer::new("/** doc **/x").collect();
        assert_eq!(tokens[0].kind, SyntaxKind::BLOCK_COMMENT);
        assert_eq!(tokens[0].text, "/** doc **/");
        assert_eq!(tokens[1].kind, SyntaxKind::IDENT);
    }

    #[test]
    fn test_lex_block_comment_edge_shapes() {
        let tokens: Vec<_> = Lexer::new("/**/ /* a * b / c */ /*/ x */=").collect();
        assert_eq!(tokens[0].text, "/**/");
        assert_eq!(tokens[2].text, "/* a * b / c */");
        assert_eq!(tokens[4].text, "/*/ x */");
        assert_eq!(tokens[4].kind, SyntaxKind::BLOCK_COMMENT);
        assert_eq!(tokens[5].kind, SyntaxKind::EQ);
    }

    #[test]
    fn test_lex_unterminated_block_comment() {
        let tokens: Vec<_> = Lexer::new("a /* open").collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].kind, SyntaxKind::ERROR);
        assert_eq!(tokens[2].text, "/* open");
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(
            kinds("8'hFF '0 'z 4'b10_01 42 1.5"),
            vec![
                SyntaxKind::BASED_NUMBER,
                SyntaxKind::UNBASED_UNSIZED,
                SyntaxKind::UNBASED_UNSIZED,
                SyntaxKind::BASED_NUMBER,
                SyntaxKind::INTEGER,
                SyntaxKind::REAL,
            ]
        );
    }

    #[test]
    fn test_lex_keyword_prefix_is_ident() {
        assert_eq!(
            kinds("end endmodule end_sig"),
            vec![SyntaxKind::END_KW, SyntaxKind::ENDMODULE_KW, SyntaxKind::IDENT]
        );
    }

    #[test]
    fn test_lex_wildcard_connection() {
        assert_eq!(
            kinds("(.*)"),
            vec![SyntaxKind::L_PAREN, SyntaxKind::DOT_STAR, SyntaxKind::R_PAREN]
        );
    }

    #[test]
    fn test_lex_directive_and_system_names() {
        assert_eq!(
            kinds("`WIDTH $clog2 \\bus[0] "),
            vec![
                SyntaxKind::DIRECTIVE,
                SyntaxKind::SYSTEM_IDENT,
                SyntaxKind::ESCAPED_IDENT,
            ]
        );
    }

    #[test]
    fn test_lex_operators() {
        assert_eq!(
            kinds("a <= b == c"),
            vec![
                SyntaxKind::IDENT,
                SyntaxKind::OPERATOR,
                SyntaxKind::IDENT,
                SyntaxKind::OPERATOR,
                SyntaxKind::IDENT,
            ]
        );
        assert_eq!(kinds("="), vec![SyntaxKind::EQ]);
    }
}
