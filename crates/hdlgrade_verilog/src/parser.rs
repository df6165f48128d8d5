//! Parser infrastructure and module-level rules.
//!
//! [`Parser`] holds the token cursor and the primitive operations (advance,
//! eat, expect, recovery) shared by the expression and statement rules in
//! `expr.rs` and `stmt.rs`. This file parses module headers, port and net
//! declarations, continuous assignments, and rejects module items outside
//! the supported subset.

use crate::ast::*;
use crate::token::{Token, TokenKind};
use hdlgrade_common::Interner;
use hdlgrade_diagnostics::{Diagnostic, DiagnosticSink, ErrorKind};
use hdlgrade_ir::{AssignKind, NetKind};
use hdlgrade_source::Span;

/// A recursive descent parser over a token stream.
///
/// Errors go to the sink and the affected nodes become `Error` variants or
/// are skipped, so one call reports as many problems as it can find.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    pub(crate) interner: &'src Interner,
    sink: &'src DiagnosticSink,
    pub(crate) max_depth: usize,
    pub(crate) depth: usize,
    /// Set after the depth limit trips, to avoid one error per unwound level.
    pub(crate) quiet: bool,
}

impl<'src> Parser<'src> {
    /// Creates a parser. `tokens` must come from lexing `source`.
    pub fn new(
        tokens: Vec<Token>,
        source: &'src str,
        interner: &'src Interner,
        sink: &'src DiagnosticSink,
        max_depth: usize,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            interner,
            sink,
            max_depth,
            depth: 0,
            quiet: false,
        }
    }

    // Cursor

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn current(&self) -> TokenKind {
        self.tokens.get(self.pos).map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or(Span::DUMMY, |t| t.span)
    }

    pub(crate) fn current_text(&self) -> &'src str {
        let span = self.current_span();
        &self.source[span.start as usize..span.end as usize]
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev].span,
            None => self.current_span(),
        }
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `kind` or reports "expected ..." and returns `false`.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.expected(&kind.describe());
            false
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Option<DeclName> {
        if self.at(TokenKind::Identifier) {
            let name = DeclName {
                name: self.interner.get_or_intern(self.current_text()),
                span: self.current_span(),
            };
            self.advance();
            Some(name)
        } else {
            self.expected("an identifier");
            None
        }
    }

    // Diagnostics and recovery

    pub(crate) fn report(&self, kind: ErrorKind, message: impl Into<String>, span: Span) {
        if !self.quiet {
            self.sink.emit(Diagnostic::of_kind(kind, message, span));
        }
    }

    pub(crate) fn expected(&self, what: &str) {
        let found = self.current().describe();
        self.report(
            ErrorKind::SyntaxError,
            format!("expected {what}, found {found}"),
            self.current_span(),
        );
    }

    pub(crate) fn unsupported(&self, what: &str, span: Span) {
        self.report(
            ErrorKind::UnsupportedConstructError,
            format!("{what} is not supported"),
            span,
        );
    }

    /// Skips to just past the next `;`.
    pub(crate) fn recover_to_semicolon(&mut self) {
        while !self.at_eof() && !self.at(TokenKind::Semicolon) && !self.at(TokenKind::Endmodule) {
            self.advance();
        }
        self.eat(TokenKind::Semicolon);
    }

    /// Skips a bracketed group starting at `open`, including nested groups.
    pub(crate) fn skip_group(&mut self, open: TokenKind, close: TokenKind) {
        if !self.eat(open) {
            return;
        }
        let mut depth = 1usize;
        while depth > 0 && !self.at_eof() {
            if self.at(open) {
                depth += 1;
            } else if self.at(close) {
                depth -= 1;
            }
            self.advance();
        }
    }

    /// Skips tokens until just past `close`.
    pub(crate) fn skip_past(&mut self, close: TokenKind) {
        while !self.at_eof() && !self.at(close) {
            self.advance();
        }
        self.eat(close);
    }

    // Top level

    /// Parses every module in the token stream.
    pub fn parse_source_text(&mut self) -> SourceText {
        let start = self.current_span();
        let mut modules = Vec::new();
        while !self.at_eof() {
            if self.at(TokenKind::Module) {
                modules.push(self.parse_module());
            } else {
                self.expected("'module'");
                while !self.at_eof() && !self.at(TokenKind::Module) {
                    self.advance();
                }
            }
        }
        SourceText {
            modules,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_module(&mut self) -> ModuleDecl {
        let start = self.current_span();
        self.expect(TokenKind::Module);
        let name = self.expect_ident().unwrap_or(DeclName {
            name: self.interner.get_or_intern("<missing>"),
            span: self.current_span(),
        });

        if self.at(TokenKind::Hash) {
            let span = self.current_span();
            self.unsupported("a parameter port list", span);
            self.advance();
            self.skip_group(TokenKind::LeftParen, TokenKind::RightParen);
        }

        let (port_style, header_names, ansi_ports) = self.parse_port_header();
        self.expect(TokenKind::Semicolon);

        let mut items = Vec::new();
        while !self.at(TokenKind::Endmodule) && !self.at(TokenKind::Module) && !self.at_eof() {
            self.quiet = false;
            let before = self.pos;
            if let Some(item) = self.parse_module_item() {
                items.push(item);
            }
            if self.pos == before {
                self.advance();
            }
        }
        self.quiet = false;
        self.expect(TokenKind::Endmodule);

        ModuleDecl {
            name,
            port_style,
            header_names,
            ansi_ports,
            items,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_port_header(&mut self) -> (PortStyle, Vec<DeclName>, Vec<PortDecl>) {
        if !self.eat(TokenKind::LeftParen) {
            return (PortStyle::Empty, Vec::new(), Vec::new());
        }
        if self.eat(TokenKind::RightParen) {
            return (PortStyle::Empty, Vec::new(), Vec::new());
        }

        if !self.current().is_direction() {
            let mut names = Vec::new();
            loop {
                match self.expect_ident() {
                    Some(name) => names.push(name),
                    None => self.skip_to_port_boundary(),
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen);
            return (PortStyle::NonAnsi, names, Vec::new());
        }

        let mut decls: Vec<PortDecl> = Vec::new();
        loop {
            if self.current().is_direction() {
                if let Some(decl) = self.parse_port_decl_head() {
                    decls.push(decl);
                } else {
                    self.skip_to_port_boundary();
                }
            } else if self.at(TokenKind::Identifier) && !decls.is_empty() {
                if let (Some(name), Some(last)) = (self.expect_ident(), decls.last_mut()) {
                    last.span = last.span.merge(name.span);
                    last.names.push(name);
                }
            } else {
                self.expected("a port declaration");
                self.skip_to_port_boundary();
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen);
        let names = decls.iter().flat_map(|d| d.names.iter().copied()).collect();
        (PortStyle::Ansi, names, decls)
    }

    fn skip_to_port_boundary(&mut self) {
        while !self.at_eof()
            && !self.at(TokenKind::Comma)
            && !self.at(TokenKind::RightParen)
            && !self.at(TokenKind::Semicolon)
        {
            self.advance();
        }
    }

    /// Parses `input [wire|reg] [range] name` up to and including the first
    /// name.
    fn parse_port_decl_head(&mut self) -> Option<PortDecl> {
        let start = self.current_span();
        let direction = match self.current() {
            TokenKind::Input => PortDirection::Input,
            TokenKind::Output => PortDirection::Output,
            _ => PortDirection::Inout,
        };
        self.advance();

        let net_kind = match self.current() {
            TokenKind::Wire => {
                self.advance();
                Some(NetKind::Wire)
            }
            TokenKind::Reg => {
                self.advance();
                Some(NetKind::Reg)
            }
            TokenKind::Integer | TokenKind::Real => {
                let span = self.current_span();
                self.unsupported(&format!("{} ports", self.current().describe()), span);
                self.advance();
                None
            }
            _ => None,
        };
        self.reject_signed();
        let range = self.parse_range();
        let name = self.expect_ident()?;
        Some(PortDecl {
            direction,
            net_kind,
            range,
            names: vec![name],
            span: start.merge(name.span),
        })
    }

    fn reject_signed(&mut self) {
        if self.at(TokenKind::Signed) {
            let span = self.current_span();
            self.unsupported("signed arithmetic", span);
            self.advance();
        }
    }

    /// Parses an optional `[msb:lsb]`.
    pub(crate) fn parse_range(&mut self) -> Option<Range> {
        if !self.at(TokenKind::LeftBracket) {
            return None;
        }
        let start = self.current_span();
        self.advance();
        let msb = self.parse_expr();
        self.expect(TokenKind::Colon);
        let lsb = self.parse_expr();
        self.expect(TokenKind::RightBracket);
        Some(Range {
            msb,
            lsb,
            span: start.merge(self.prev_span()),
        })
    }

    // Module items

    fn parse_module_item(&mut self) -> Option<ModuleItem> {
        let start = self.current_span();
        let kind = self.current();
        match kind {
            TokenKind::Input | TokenKind::Output | TokenKind::Inout => {
                let item = self.parse_port_decl_head().map(|mut decl| {
                    while self.eat(TokenKind::Comma) {
                        if let Some(name) = self.expect_ident() {
                            decl.span = decl.span.merge(name.span);
                            decl.names.push(name);
                        }
                    }
                    ModuleItem::PortDecl(decl)
                });
                self.finish_item(item)
            }
            TokenKind::Wire | TokenKind::Reg => {
                let item = self.parse_net_decl();
                self.finish_item(Some(item))
            }
            TokenKind::Assign => {
                self.advance();
                if self.at(TokenKind::Hash) {
                    let span = self.current_span();
                    self.unsupported("a delay on a continuous assignment", span);
                    self.advance();
                    self.advance();
                }
                let mut assigns = vec![self.parse_assignment(AssignKind::Continuous)];
                while self.eat(TokenKind::Comma) {
                    assigns.push(self.parse_assignment(AssignKind::Continuous));
                }
                self.finish_item(Some(ModuleItem::ContinuousAssign(assigns)))
            }
            TokenKind::Always => Some(self.parse_always()),
            TokenKind::Initial => {
                self.unsupported("an 'initial' block", start);
                self.advance();
                self.skip_statement();
                Some(ModuleItem::Unsupported(start.merge(self.prev_span())))
            }
            TokenKind::Function | TokenKind::Task | TokenKind::Generate => {
                let (what, close) = match kind {
                    TokenKind::Function => ("a function declaration", TokenKind::Endfunction),
                    TokenKind::Task => ("a task declaration", TokenKind::Endtask),
                    _ => ("a generate block", TokenKind::Endgenerate),
                };
                self.unsupported(what, start);
                self.skip_past(close);
                Some(ModuleItem::Unsupported(start.merge(self.prev_span())))
            }
            TokenKind::Parameter | TokenKind::Localparam => {
                self.unsupported("a parameter", start);
                self.recover_to_semicolon();
                Some(ModuleItem::Unsupported(start.merge(self.prev_span())))
            }
            TokenKind::Integer | TokenKind::Real | TokenKind::Genvar => {
                self.unsupported(&format!("a {} declaration", kind.describe()), start);
                self.recover_to_semicolon();
                Some(ModuleItem::Unsupported(start.merge(self.prev_span())))
            }
            k if k.is_gate() => {
                self.unsupported(
                    &format!("the gate primitive {}", k.describe()),
                    start,
                );
                self.recover_to_semicolon();
                Some(ModuleItem::Unsupported(start.merge(self.prev_span())))
            }
            TokenKind::Identifier => {
                if matches!(self.peek_kind(1), TokenKind::Equals | TokenKind::LeftBracket) {
                    self.report(
                        ErrorKind::SyntaxError,
                        "an assignment outside an 'always' block needs 'assign'",
                        start,
                    );
                } else {
                    self.unsupported(
                        &format!("instantiating module '{}'", self.current_text()),
                        start,
                    );
                }
                self.recover_to_semicolon();
                Some(ModuleItem::Unsupported(start.merge(self.prev_span())))
            }
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            _ => {
                self.expected("a module item");
                self.recover_to_semicolon();
                None
            }
        }
    }

    fn finish_item(&mut self, item: Option<ModuleItem>) -> Option<ModuleItem> {
        if !self.expect(TokenKind::Semicolon) {
            self.recover_to_semicolon();
        }
        item
    }

    fn parse_net_decl(&mut self) -> ModuleItem {
        let start = self.current_span();
        let kind = if self.at(TokenKind::Reg) {
            NetKind::Reg
        } else {
            NetKind::Wire
        };
        self.advance();
        self.reject_signed();
        let range = self.parse_range();

        let mut names = Vec::new();
        loop {
            let Some(decl) = self.expect_ident() else {
                break;
            };
            if self.at(TokenKind::LeftBracket) {
                let span = self.current_span();
                self.unsupported("a memory array", span);
                self.skip_group(TokenKind::LeftBracket, TokenKind::RightBracket);
            }
            let init = if self.eat(TokenKind::Equals) {
                Some(self.parse_expr())
            } else {
                None
            };
            names.push(NetDeclName { decl, init });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        ModuleItem::NetDecl(NetDecl {
            kind,
            range,
            names,
            span: start.merge(self.prev_span()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use hdlgrade_source::FileId;

    pub(crate) fn parse(source: &str) -> (SourceText, Vec<Diagnostic>, Interner) {
        let sink = DiagnosticSink::new();
        let interner = Interner::new();
        let tokens = lex(source, FileId::from_raw(0), &sink);
        let ast = Parser::new(tokens, source, &interner, &sink, 256).parse_source_text();
        (ast, sink.take_all(), interner)
    }

    fn parse_ok(source: &str) -> (ModuleDecl, Interner) {
        let (mut ast, errors, interner) = parse(source);
        assert!(
            errors.is_empty(),
            "unexpected errors: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
        assert_eq!(ast.modules.len(), 1);
        (ast.modules.remove(0), interner)
    }

    fn first_error(source: &str) -> Diagnostic {
        let (_, errors, _) = parse(source);
        errors.into_iter().next().expect("expected an error")
    }

    #[test]
    fn ansi_header_with_shared_declarations() {
        let (m, interner) = parse_ok(
            "module adder(input [3:0] a, b, input cin, output reg [3:0] sum, output cout); endmodule",
        );
        assert_eq!(interner.resolve(m.name.name), "adder");
        assert_eq!(m.port_style, PortStyle::Ansi);
        assert_eq!(m.ansi_ports.len(), 4);
        assert_eq!(m.ansi_ports[0].names.len(), 2);
        assert!(m.ansi_ports[0].range.is_some());
        assert_eq!(m.ansi_ports[2].net_kind, Some(NetKind::Reg));
        let names: Vec<_> = m.header_names.iter().map(|n| interner.resolve(n.name)).collect();
        assert_eq!(names, ["a", "b", "cin", "sum", "cout"]);
    }

    #[test]
    fn non_ansi_header_and_body_declarations() {
        let (m, interner) = parse_ok(
            "module mux(a, b, sel, y);\n input a, b, sel;\n output y;\n assign y = sel ? b : a;\nendmodule",
        );
        assert_eq!(m.port_style, PortStyle::NonAnsi);
        assert_eq!(m.header_names.len(), 4);
        assert_eq!(m.items.len(), 3);
        match &m.items[0] {
            ModuleItem::PortDecl(d) => {
                assert_eq!(d.direction, PortDirection::Input);
                let names: Vec<_> = d.names.iter().map(|n| interner.resolve(n.name)).collect();
                assert_eq!(names, ["a", "b", "sel"]);
            }
            other => panic!("expected port declaration, got {other:?}"),
        }
    }

    #[test]
    fn empty_port_list() {
        let (m, _) = parse_ok("module top(); endmodule");
        assert_eq!(m.port_style, PortStyle::Empty);
        let (m, _) = parse_ok("module top; endmodule");
        assert_eq!(m.port_style, PortStyle::Empty);
    }

    #[test]
    fn net_declarations_with_initializers() {
        let (m, _) = parse_ok(
            "module m(input a, input b, output y);\n wire [1:0] t, u = {a, b};\n reg r;\n assign y = a;\nendmodule",
        );
        match &m.items[0] {
            ModuleItem::NetDecl(d) => {
                assert_eq!(d.kind, NetKind::Wire);
                assert_eq!(d.names.len(), 2);
                assert!(d.names[0].init.is_none());
                assert!(d.names[1].init.is_some());
            }
            other => panic!("expected net declaration, got {other:?}"),
        }
        assert!(matches!(&m.items[1], ModuleItem::NetDecl(d) if d.kind == NetKind::Reg));
    }

    #[test]
    fn multiple_continuous_assignments() {
        let (m, _) = parse_ok("module m(input a, output x, output y); assign x = a, y = ~a; endmodule");
        match &m.items[0] {
            ModuleItem::ContinuousAssign(list) => assert_eq!(list.len(), 2),
            other => panic!("expected assign, got {other:?}"),
        }
    }

    #[test]
    fn initial_block_is_unsupported() {
        let err = first_error("module m(output reg y); initial begin y = 0; end endmodule");
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedConstructError));
        assert_eq!(err.message, "an 'initial' block is not supported");
    }

    #[test]
    fn parameters_and_gates_are_unsupported() {
        let err = first_error("module m(input a, output y); parameter W = 4; assign y = a; endmodule");
        assert_eq!(err.message, "a parameter is not supported");
        let err = first_error("module m(input a, input b, output y); and g1(y, a, b); endmodule");
        assert_eq!(err.message, "the gate primitive 'and' is not supported");
        let err = first_error("module m #(parameter W = 2)(input a, output y); endmodule");
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedConstructError));
    }

    #[test]
    fn instantiation_is_unsupported() {
        let err = first_error("module top(input a, output y); inv u1(.a(a), .y(y)); endmodule");
        assert_eq!(err.message, "instantiating module 'inv' is not supported");
    }

    #[test]
    fn bare_assignment_needs_assign() {
        let err = first_error("module m(input a, output y); y = a; endmodule");
        assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
        assert!(err.message.contains("needs 'assign'"));
    }

    #[test]
    fn function_is_skipped_whole() {
        let (ast, errors, _) = parse(
            "module m(input a, output y);\n function f; input x; f = x; endfunction\n assign y = a;\nendmodule",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(ast.modules[0].items.len(), 2);
    }

    #[test]
    fn inout_parses_for_the_port_extractor() {
        let (m, _) = parse_ok("module m(inout a); endmodule");
        assert_eq!(m.ansi_ports[0].direction, PortDirection::Inout);
    }

    #[test]
    fn two_modules_are_both_parsed() {
        let (ast, errors, _) = parse("module a; endmodule\nmodule b; endmodule");
        assert!(errors.is_empty());
        assert_eq!(ast.modules.len(), 2);
    }

    #[test]
    fn garbage_before_module() {
        let err = first_error("wire x; module m; endmodule");
        assert_eq!(err.message, "expected 'module', found 'wire'");
    }
}
