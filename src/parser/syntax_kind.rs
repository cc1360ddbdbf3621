//! Syntax kinds for SystemVerilog tokens
//!
//! Only the token kinds the structural parser cares about are distinguished;
//! every other operator collapses into `OPERATOR`.

/// All token kinds produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (whitespace and comments - preserved but not semantically meaningful)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // =========================================================================
    // LITERALS AND NAMES
    // =========================================================================
    IDENT,           // data_in
    ESCAPED_IDENT,   // \bus[0]
    SYSTEM_IDENT,    // $clog2
    DIRECTIVE,       // `define, `WIDTH
    INTEGER,         // 42
    BASED_NUMBER,    // 8'hFF
    UNBASED_UNSIZED, // '0 '1 'z 'x
    REAL,            // 1.5
    STRING,          // "file.svh"

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_PAREN,     // (
    R_PAREN,     // )
    L_BRACKET,   // [
    R_BRACKET,   // ]
    L_BRACE,     // {
    R_BRACE,     // }
    SEMICOLON,   // ;
    COMMA,       // ,
    DOT,         // .
    DOT_STAR,    // .*
    COLON,       // :
    COLON_COLON, // ::
    EQ,          // =
    HASH,        // #
    AT,          // @
    QUESTION,    // ?
    STAR,        // *
    SLASH,       // /
    TICK,        // '
    OPERATOR,    // any other operator run: + - == <= && ...

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    MODULE_KW,
    MACROMODULE_KW,
    ENDMODULE_KW,
    INTERFACE_KW,
    ENDINTERFACE_KW,
    INPUT_KW,
    OUTPUT_KW,
    INOUT_KW,
    REF_KW,
    LOGIC_KW,
    WIRE_KW,
    REG_KW,
    BIT_KW,
    VAR_KW,
    TRI_KW,
    INT_KW,
    INTEGER_KW,
    SIGNED_KW,
    UNSIGNED_KW,
    PARAMETER_KW,
    LOCALPARAM_KW,
    ASSIGN_KW,
    ALWAYS_KW,
    ALWAYS_FF_KW,
    ALWAYS_COMB_KW,
    ALWAYS_LATCH_KW,
    INITIAL_KW,
    FINAL_KW,
    BEGIN_KW,
    END_KW,
    FORK_KW,
    JOIN_KW,
    GENERATE_KW,
    ENDGENERATE_KW,
    GENVAR_KW,
    FUNCTION_KW,
    ENDFUNCTION_KW,
    TASK_KW,
    ENDTASK_KW,
    CASE_KW,
    ENDCASE_KW,
    IF_KW,
    ELSE_KW,
    FOR_KW,
    TYPEDEF_KW,
    IMPORT_KW,

    ERROR,
}

impl SyntaxKind {
    /// Check if this is trivia (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT)
    }

    /// Port direction keywords
    pub fn is_direction(self) -> bool {
        matches!(
            self,
            Self::INPUT_KW | Self::OUTPUT_KW | Self::INOUT_KW | Self::REF_KW
        )
    }

    /// Keywords that start a net or variable declaration
    pub fn is_data_keyword(self) -> bool {
        matches!(
            self,
            Self::LOGIC_KW
                | Self::WIRE_KW
                | Self::REG_KW
                | Self::BIT_KW
                | Self::VAR_KW
                | Self::TRI_KW
                | Self::INT_KW
                | Self::INTEGER_KW
        )
    }

    /// Names usable as identifiers (module, port, instance or signal names)
    pub fn is_name(self) -> bool {
        matches!(self, Self::IDENT | Self::ESCAPED_IDENT)
    }

    /// Opening delimiters tracked for nesting
    pub fn is_open_delim(self) -> bool {
        matches!(self, Self::L_PAREN | Self::L_BRACKET | Self::L_BRACE)
    }

    /// Closing delimiters tracked for nesting
    pub fn is_close_delim(self) -> bool {
        matches!(self, Self::R_PAREN | Self::R_BRACKET | Self::R_BRACE)
    }
}
