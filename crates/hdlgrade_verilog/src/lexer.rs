//! Lexer for the Verilog subset.
//!
//! Produces spanned [`Token`]s and skips whitespace, `//` and `/* */`
//! comments. Malformed input is reported to the [`DiagnosticSink`] as a
//! `SyntaxError` and yields a [`TokenKind::Error`] token, so lexing always
//! reaches the end of the text.

use crate::token::{lookup_keyword, Token, TokenKind};
use hdlgrade_diagnostics::{Diagnostic, DiagnosticSink, ErrorKind};
use hdlgrade_source::{FileId, Span};

/// Operators, longest spelling first so the scan is a longest match.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::TripleEquals),
    ("!==", TokenKind::BangDoubleEquals),
    ("<<<", TokenKind::TripleLess),
    (">>>", TokenKind::TripleGreater),
    ("==", TokenKind::DoubleEquals),
    ("!=", TokenKind::BangEquals),
    ("<=", TokenKind::LessEquals),
    (">=", TokenKind::GreaterEquals),
    ("<<", TokenKind::DoubleLess),
    (">>", TokenKind::DoubleGreater),
    ("&&", TokenKind::DoubleAmpersand),
    ("||", TokenKind::DoublePipe),
    ("**", TokenKind::DoubleStar),
    ("~^", TokenKind::TildeCaret),
    ("^~", TokenKind::TildeCaret),
    ("~&", TokenKind::TildeAmpersand),
    ("~|", TokenKind::TildePipe),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
    (".", TokenKind::Dot),
    ("#", TokenKind::Hash),
    ("@", TokenKind::At),
    ("?", TokenKind::Question),
    ("=", TokenKind::Equals),
    ("<", TokenKind::LessThan),
    (">", TokenKind::GreaterThan),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Bang),
];

/// Directives with no effect on a single-pass combinational evaluation.
const IGNORED_DIRECTIVES: &[&str] = &["timescale", "default_nettype", "resetall", "celldefine", "endcelldefine"];

/// Lexes `source` into tokens ending with [`TokenKind::Eof`].
pub fn lex(source: &str, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
        sink,
    };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_trivia();
        if lexer.at_end() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: lexer.span_from(lexer.pos),
            });
            return tokens;
        }
        tokens.push(lexer.next_token());
    }
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn rest(&self) -> &[u8] {
        &self.source[self.pos..]
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.at_end() && pred(self.source[self.pos]) {
            self.pos += 1;
        }
    }

    fn report(&self, kind: ErrorKind, msg: String, span: Span) {
        self.sink.emit(Diagnostic::of_kind(kind, msg, span));
    }

    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(|b| b.is_ascii_whitespace());
            if self.rest().starts_with(b"//") {
                self.eat_while(|b| b != b'\n');
            } else if self.rest().starts_with(b"/*") {
                let start = self.pos;
                match self.rest()[2..].windows(2).position(|w| w == b"*/") {
                    Some(offset) => self.pos += offset + 4,
                    None => {
                        self.pos = self.source.len();
                        self.report(
                            ErrorKind::SyntaxError,
                            "unterminated block comment".to_string(),
                            self.span_from(start),
                        );
                    }
                }
            } else if self.peek() == b'`' {
                self.skip_directive();
            } else {
                return;
            }
        }
    }

    fn skip_directive(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let name_start = self.pos;
        self.eat_while(is_ident_char);
        let name = String::from_utf8_lossy(&self.source[name_start..self.pos]).into_owned();
        let name_span = self.span_from(start);
        self.eat_while(|b| b != b'\n');
        if !IGNORED_DIRECTIVES.contains(&name.as_str()) {
            self.report(
                ErrorKind::UnsupportedConstructError,
                format!("compiler directive '`{name}' is not supported"),
                name_span,
            );
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();
        let kind = if is_ident_start(b) {
            self.eat_while(is_ident_char);
            let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default();
            lookup_keyword(text).unwrap_or(TokenKind::Identifier)
        } else if b == b'$' && is_ident_start(self.peek_at(1)) {
            self.pos += 1;
            self.eat_while(is_ident_char);
            TokenKind::SystemIdentifier
        } else if b.is_ascii_digit() {
            self.lex_number()
        } else if b == b'\'' {
            self.lex_based_tail(start)
        } else if b == b'"' {
            self.lex_string(start)
        } else {
            self.lex_operator(start)
        };
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        self.eat_while(|b| b.is_ascii_digit() || b == b'_');

        // `4 'b1010` is legal; look past blanks for a tick.
        let digits_end = self.pos;
        self.eat_while(|b| b == b' ' || b == b'\t');
        if self.peek() == b'\'' {
            return self.lex_based_tail(start);
        }
        self.pos = digits_end;

        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit() || b == b'_');
            self.eat_exponent();
            return TokenKind::RealLiteral;
        }
        if matches!(self.peek(), b'e' | b'E') {
            self.eat_exponent();
            return TokenKind::RealLiteral;
        }
        TokenKind::IntLiteral
    }

    /// Lexes `'<s><base><digits>` with `pos` at the tick. `start` is the
    /// start of the whole literal, including any size prefix.
    fn lex_based_tail(&mut self, start: usize) -> TokenKind {
        self.pos += 1;
        if matches!(self.peek(), b's' | b'S') {
            self.pos += 1;
        }
        let base = self.peek().to_ascii_lowercase();
        if !matches!(base, b'b' | b'o' | b'd' | b'h') {
            self.report(
                ErrorKind::SyntaxError,
                "expected a base letter (b, o, d or h) after '".to_string(),
                self.span_from(start),
            );
            return TokenKind::Error;
        }
        self.pos += 1;
        self.eat_while(|b| b == b' ' || b == b'\t');
        // Digit validity is checked when the value is parsed; taking every
        // alphanumeric keeps `4'b12` in one token for a precise message.
        let digits_start = self.pos;
        self.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'?');
        if self.pos == digits_start {
            self.report(
                ErrorKind::SyntaxError,
                "based literal has no digits".to_string(),
                self.span_from(start),
            );
            return TokenKind::Error;
        }
        TokenKind::BasedLiteral
    }

    fn eat_exponent(&mut self) {
        if matches!(self.peek(), b'e' | b'E') {
            self.pos += 1;
            if matches!(self.peek(), b'+' | b'-') {
                self.pos += 1;
            }
            self.eat_while(|b| b.is_ascii_digit() || b == b'_');
        }
    }

    fn lex_string(&mut self, start: usize) -> TokenKind {
        self.pos += 1;
        loop {
            if self.at_end() || self.peek() == b'\n' {
                self.report(
                    ErrorKind::SyntaxError,
                    "unterminated string literal".to_string(),
                    self.span_from(start),
                );
                return TokenKind::Error;
            }
            match self.peek() {
                b'\\' => self.pos = (self.pos + 2).min(self.source.len()),
                b'"' => {
                    self.pos += 1;
                    return TokenKind::StringLiteral;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn lex_operator(&mut self, start: usize) -> TokenKind {
        if let Some((text, kind)) = OPERATORS
            .iter()
            .find(|(text, _)| self.rest().starts_with(text.as_bytes()))
        {
            self.pos += text.len();
            return *kind;
        }

        // Consume a whole UTF-8 character so spans stay on char boundaries.
        self.pos += 1;
        self.eat_while(|b| b & 0xC0 == 0x80);
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        self.report(
            ErrorKind::SyntaxError,
            format!("unrecognized character '{text}'"),
            self.span_from(start),
        );
        TokenKind::Error
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_with_sink(source: &str) -> (Vec<Token>, DiagnosticSink) {
        let sink = DiagnosticSink::new();
        let tokens = lex(source, FileId::from_raw(0), &sink);
        (tokens, sink)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, sink) = lex_with_sink(source);
        assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.diagnostics());
        tokens.into_iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        let (tokens, _) = lex_with_sink(source);
        tokens
            .iter()
            .map(|t| source[t.span.start as usize..t.span.end as usize].to_string())
            .collect()
    }

    #[test]
    fn module_header() {
        assert_eq!(
            kinds("module and_gate(input a, output y);"),
            vec![
                TokenKind::Module,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Input,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Output,
                TokenKind::Identifier,
                TokenKind::RightParen,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("  // nothing\n /* here */ "), vec![TokenKind::Eof]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("assign y = a; // and\n/* multi\nline */ endmodule"),
            vec![
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Endmodule,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("<= << <<< == === != !== ~^ ^~ ~& ~| && || **"),
            vec![
                TokenKind::LessEquals,
                TokenKind::DoubleLess,
                TokenKind::TripleLess,
                TokenKind::DoubleEquals,
                TokenKind::TripleEquals,
                TokenKind::BangEquals,
                TokenKind::BangDoubleEquals,
                TokenKind::TildeCaret,
                TokenKind::TildeCaret,
                TokenKind::TildeAmpersand,
                TokenKind::TildePipe,
                TokenKind::DoubleAmpersand,
                TokenKind::DoublePipe,
                TokenKind::DoubleStar,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 4'b1010 8'hFF 'b1 4'sb0101 3 'o7 1.5 2e3"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::BasedLiteral,
                TokenKind::BasedLiteral,
                TokenKind::BasedLiteral,
                TokenKind::BasedLiteral,
                TokenKind::BasedLiteral,
                TokenKind::RealLiteral,
                TokenKind::RealLiteral,
                TokenKind::Eof,
            ]
        );
        assert_eq!(texts("3 'o7;")[0], "3 'o7");
    }

    #[test]
    fn based_literal_keeps_bad_digits_together() {
        assert_eq!(texts("4'b12;")[0], "4'b12");
        assert_eq!(texts("4'b1x0z;")[0], "4'b1x0z");
    }

    #[test]
    fn keywords_and_system_names() {
        assert_eq!(
            kinds("always @(posedge clk) $display"),
            vec![
                TokenKind::Always,
                TokenKind::At,
                TokenKind::LeftParen,
                TokenKind::Posedge,
                TokenKind::Identifier,
                TokenKind::RightParen,
                TokenKind::SystemIdentifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn timescale_is_ignored() {
        assert_eq!(kinds("`timescale 1ns/1ps\nmodule"), vec![TokenKind::Module, TokenKind::Eof]);
    }

    #[test]
    fn define_is_unsupported() {
        let (_, sink) = lex_with_sink("`define WIDTH 4\n");
        let err = sink.first_error().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedConstructError));
        assert!(err.message.contains("`define"));
    }

    #[test]
    fn unterminated_comment() {
        let (tokens, sink) = lex_with_sink("assign /* never closed");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        let err = sink.first_error().unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
        assert!(err.message.contains("unterminated block comment"));
    }

    #[test]
    fn unrecognized_character() {
        let (tokens, sink) = lex_with_sink("assign y = a \u{00a7} b;");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
        assert_eq!(sink.error_count(), 1);
        assert!(sink.first_error().unwrap().message.contains('\u{00a7}'));
    }

    #[test]
    fn unterminated_string() {
        let (_, sink) = lex_with_sink("\"abc\nmodule");
        assert!(sink.first_error().unwrap().message.contains("unterminated string"));
    }

    #[test]
    fn tick_without_base() {
        let (_, sink) = lex_with_sink("4'q1");
        assert!(sink.first_error().unwrap().message.contains("base letter"));
    }

    #[test]
    fn spans_cover_token_text() {
        assert_eq!(
            texts("assign sum = a ^ b;"),
            vec!["assign", "sum", "=", "a", "^", "b", ";", ""]
        );
    }
}
