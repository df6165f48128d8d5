//! Token kinds for the Verilog subset.
//!
//! The keyword set is wider than the accepted grammar: constructs such as
//! `if`, `case` or `initial` must lex as keywords so the parser can reject
//! them by name instead of mistaking them for signals.

use hdlgrade_source::Span;
use serde::{Deserialize, Serialize};

/// A token kind. Literal and identifier text is recovered from the span.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    // Keywords
    /// `always`
    Always,
    /// `and`
    And,
    /// `assign`
    Assign,
    /// `begin`
    Begin,
    /// `buf`
    Buf,
    /// `case`
    Case,
    /// `casex`
    Casex,
    /// `casez`
    Casez,
    /// `default`
    Default,
    /// `else`
    Else,
    /// `end`
    End,
    /// `endcase`
    Endcase,
    /// `endfunction`
    Endfunction,
    /// `endgenerate`
    Endgenerate,
    /// `endmodule`
    Endmodule,
    /// `endtask`
    Endtask,
    /// `for`
    For,
    /// `forever`
    Forever,
    /// `function`
    Function,
    /// `generate`
    Generate,
    /// `genvar`
    Genvar,
    /// `if`
    If,
    /// `initial`
    Initial,
    /// `inout`
    Inout,
    /// `input`
    Input,
    /// `integer`
    Integer,
    /// `localparam`
    Localparam,
    /// `module`
    Module,
    /// `nand`
    Nand,
    /// `negedge`
    Negedge,
    /// `nor`
    Nor,
    /// `not`
    Not,
    /// `or`
    Or,
    /// `output`
    Output,
    /// `parameter`
    Parameter,
    /// `posedge`
    Posedge,
    /// `real`
    Real,
    /// `reg`
    Reg,
    /// `repeat`
    Repeat,
    /// `signed`
    Signed,
    /// `task`
    Task,
    /// `wait`
    Wait,
    /// `while`
    While,
    /// `wire`
    Wire,
    /// `xnor`
    Xnor,
    /// `xor`
    Xor,

    // Literals
    /// Unsized decimal, e.g. `42`.
    IntLiteral,
    /// Based literal, sized or not, e.g. `4'b1010`, `'hFF`.
    BasedLiteral,
    /// `1.5`, `2e3`.
    RealLiteral,
    /// `"text"`.
    StringLiteral,

    // Punctuation and operators
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `#`
    Hash,
    /// `@`
    At,
    /// `?`
    Question,
    /// `=`
    Equals,
    /// `==`
    DoubleEquals,
    /// `!=`
    BangEquals,
    /// `===`
    TripleEquals,
    /// `!==`
    BangDoubleEquals,
    /// `<`
    LessThan,
    /// `<=`, both less-or-equal and nonblocking assignment.
    LessEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEquals,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&`
    Ampersand,
    /// `&&`
    DoubleAmpersand,
    /// `|`
    Pipe,
    /// `||`
    DoublePipe,
    /// `^`
    Caret,
    /// `~^` or `^~`
    TildeCaret,
    /// `~`
    Tilde,
    /// `~&`
    TildeAmpersand,
    /// `~|`
    TildePipe,
    /// `!`
    Bang,
    /// `<<`
    DoubleLess,
    /// `>>`
    DoubleGreater,
    /// `<<<`
    TripleLess,
    /// `>>>`
    TripleGreater,

    // Names and markers
    /// A plain identifier.
    Identifier,
    /// `$display`, `$time`, ...
    SystemIdentifier,
    /// End of input.
    Eof,
    /// Malformed input, already reported by the lexer.
    Error,
}

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("always", TokenKind::Always),
    ("and", TokenKind::And),
    ("assign", TokenKind::Assign),
    ("begin", TokenKind::Begin),
    ("buf", TokenKind::Buf),
    ("case", TokenKind::Case),
    ("casex", TokenKind::Casex),
    ("casez", TokenKind::Casez),
    ("default", TokenKind::Default),
    ("else", TokenKind::Else),
    ("end", TokenKind::End),
    ("endcase", TokenKind::Endcase),
    ("endfunction", TokenKind::Endfunction),
    ("endgenerate", TokenKind::Endgenerate),
    ("endmodule", TokenKind::Endmodule),
    ("endtask", TokenKind::Endtask),
    ("for", TokenKind::For),
    ("forever", TokenKind::Forever),
    ("function", TokenKind::Function),
    ("generate", TokenKind::Generate),
    ("genvar", TokenKind::Genvar),
    ("if", TokenKind::If),
    ("initial", TokenKind::Initial),
    ("inout", TokenKind::Inout),
    ("input", TokenKind::Input),
    ("integer", TokenKind::Integer),
    ("localparam", TokenKind::Localparam),
    ("module", TokenKind::Module),
    ("nand", TokenKind::Nand),
    ("negedge", TokenKind::Negedge),
    ("nor", TokenKind::Nor),
    ("not", TokenKind::Not),
    ("or", TokenKind::Or),
    ("output", TokenKind::Output),
    ("parameter", TokenKind::Parameter),
    ("posedge", TokenKind::Posedge),
    ("real", TokenKind::Real),
    ("reg", TokenKind::Reg),
    ("repeat", TokenKind::Repeat),
    ("signed", TokenKind::Signed),
    ("task", TokenKind::Task),
    ("wait", TokenKind::Wait),
    ("while", TokenKind::While),
    ("wire", TokenKind::Wire),
    ("xnor", TokenKind::Xnor),
    ("xor", TokenKind::Xor),
];

/// Maps identifier text to a keyword. Keywords are lowercase only.
pub fn lookup_keyword(s: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(text, _)| *text == s)
        .map(|(_, kind)| *kind)
}

impl TokenKind {
    /// Returns the keyword text, or `None` for non-keywords.
    pub fn keyword_text(self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(text, _)| *text)
    }

    /// Returns `true` for keywords.
    pub fn is_keyword(self) -> bool {
        self.keyword_text().is_some()
    }

    /// Returns `true` for `input`, `output` and `inout`.
    pub fn is_direction(self) -> bool {
        matches!(self, TokenKind::Input | TokenKind::Output | TokenKind::Inout)
    }

    /// Returns `true` for built-in gate primitives.
    pub fn is_gate(self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Or
                | TokenKind::Nand
                | TokenKind::Nor
                | TokenKind::Xor
                | TokenKind::Xnor
                | TokenKind::Not
                | TokenKind::Buf
        )
    }

    /// Returns `true` for keywords that begin a module item or close a
    /// block. Seeing one of these at parenthesis depth zero means the
    /// previous statement has ended.
    pub fn starts_item(self) -> bool {
        matches!(
            self,
            TokenKind::Module
                | TokenKind::Endmodule
                | TokenKind::Assign
                | TokenKind::Always
                | TokenKind::Initial
                | TokenKind::Input
                | TokenKind::Output
                | TokenKind::Inout
                | TokenKind::Wire
                | TokenKind::Reg
                | TokenKind::Integer
                | TokenKind::Real
                | TokenKind::Parameter
                | TokenKind::Localparam
                | TokenKind::Genvar
                | TokenKind::Begin
                | TokenKind::End
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::Case
                | TokenKind::Casex
                | TokenKind::Casez
                | TokenKind::Endcase
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Repeat
                | TokenKind::Forever
                | TokenKind::Function
                | TokenKind::Endfunction
                | TokenKind::Task
                | TokenKind::Endtask
                | TokenKind::Generate
                | TokenKind::Endgenerate
        )
    }

    /// Returns a short description for "expected X, found Y" messages.
    pub fn describe(self) -> String {
        if let Some(text) = self.keyword_text() {
            return format!("'{text}'");
        }
        let text = match self {
            TokenKind::IntLiteral | TokenKind::BasedLiteral => "a number",
            TokenKind::RealLiteral => "a real number",
            TokenKind::StringLiteral => "a string",
            TokenKind::Identifier => "an identifier",
            TokenKind::SystemIdentifier => "a system task",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "an invalid token",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::Hash => "'#'",
            TokenKind::At => "'@'",
            TokenKind::Question => "'?'",
            TokenKind::Equals => "'='",
            TokenKind::DoubleEquals => "'=='",
            TokenKind::BangEquals => "'!='",
            TokenKind::TripleEquals => "'==='",
            TokenKind::BangDoubleEquals => "'!=='",
            TokenKind::LessThan => "'<'",
            TokenKind::LessEquals => "'<='",
            TokenKind::GreaterThan => "'>'",
            TokenKind::GreaterEquals => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::DoubleStar => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Ampersand => "'&'",
            TokenKind::DoubleAmpersand => "'&&'",
            TokenKind::Pipe => "'|'",
            TokenKind::DoublePipe => "'||'",
            TokenKind::Caret => "'^'",
            TokenKind::TildeCaret => "'~^'",
            TokenKind::Tilde => "'~'",
            TokenKind::TildeAmpersand => "'~&'",
            TokenKind::TildePipe => "'~|'",
            TokenKind::Bang => "'!'",
            TokenKind::DoubleLess => "'<<'",
            TokenKind::DoubleGreater => "'>>'",
            TokenKind::TripleLess => "'<<<'",
            TokenKind::TripleGreater => "'>>>'",
            _ => "a keyword",
        };
        text.to_string()
    }
}

/// A lexed token.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// The kind.
    pub kind: TokenKind,
    /// The source text it covers.
    pub span: Span,
}
