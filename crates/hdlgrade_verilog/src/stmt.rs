//! `always` blocks and assignments.
//!
//! A block body is a flat list of blocking or nonblocking assignments.
//! Procedural control flow is reported as unsupported and skipped as a
//! whole statement so that parsing resumes at the next assignment.

use crate::ast::{AlwaysBlock, Assign, DeclName, Expr, ModuleItem, SensitivityEntry, SensitivityList};
use crate::parser::Parser;
use crate::token::TokenKind;
use hdlgrade_ir::{AssignKind, Edge};

impl Parser<'_> {
    /// Parses `always @(...) body`.
    pub(crate) fn parse_always(&mut self) -> ModuleItem {
        let start = self.current_span();
        self.advance();

        if !self.at(TokenKind::At) {
            self.unsupported("an 'always' block without an event control", start);
            self.skip_statement();
            return ModuleItem::Unsupported(start.merge(self.prev_span()));
        }
        let Some(sensitivity) = self.parse_sensitivity() else {
            self.skip_statement();
            return ModuleItem::Unsupported(start.merge(self.prev_span()));
        };

        let body = self.parse_block_body();
        ModuleItem::Always(AlwaysBlock {
            sensitivity,
            body,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_sensitivity(&mut self) -> Option<SensitivityList> {
        let start = self.current_span();
        self.advance();

        if self.eat(TokenKind::Star) {
            return Some(SensitivityList::Star(start.merge(self.prev_span())));
        }
        if self.at(TokenKind::Identifier) {
            let entry = self.parse_sensitivity_entry()?;
            return Some(SensitivityList::List(vec![entry]));
        }
        if !self.eat(TokenKind::LeftParen) {
            self.expected("'(' or '*' after '@'");
            return None;
        }
        if self.eat(TokenKind::Star) {
            self.expect(TokenKind::RightParen);
            return Some(SensitivityList::Star(start.merge(self.prev_span())));
        }

        let mut entries = Vec::new();
        loop {
            entries.push(self.parse_sensitivity_entry()?);
            if !self.eat(TokenKind::Or) && !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if !self.expect(TokenKind::RightParen) {
            return None;
        }
        Some(SensitivityList::List(entries))
    }

    fn parse_sensitivity_entry(&mut self) -> Option<SensitivityEntry> {
        let start = self.current_span();
        let edge = match self.current() {
            TokenKind::Posedge => Edge::Posedge,
            TokenKind::Negedge => Edge::Negedge,
            _ => Edge::Any,
        };
        if edge != Edge::Any {
            self.advance();
        }
        let name = self.expect_ident()?;
        if self.at(TokenKind::LeftBracket) {
            let span = self.current_span();
            self.unsupported("a bit select in a sensitivity list", span);
            self.skip_group(TokenKind::LeftBracket, TokenKind::RightBracket);
        }
        Some(SensitivityEntry {
            edge,
            name: name.name,
            span: start.merge(name.span),
        })
    }

    fn parse_block_body(&mut self) -> Vec<Assign> {
        if !self.eat(TokenKind::Begin) {
            return self.parse_block_statement().into_iter().collect();
        }
        if self.eat(TokenKind::Colon) {
            self.expect_ident();
        }
        let mut body = Vec::new();
        while !self.at(TokenKind::End) && !self.at(TokenKind::Endmodule) && !self.at_eof() {
            let before = self.pos();
            if let Some(assign) = self.parse_block_statement() {
                body.push(assign);
            }
            if self.pos() == before {
                self.advance();
            }
        }
        self.expect(TokenKind::End);
        body
    }

    fn parse_block_statement(&mut self) -> Option<Assign> {
        let start = self.current_span();
        let what = match self.current() {
            TokenKind::Identifier | TokenKind::LeftBrace => {
                let assign = self.parse_assignment(AssignKind::Blocking);
                if !self.expect(TokenKind::Semicolon) {
                    self.recover_to_semicolon();
                }
                return Some(assign);
            }
            TokenKind::Semicolon => {
                self.advance();
                return None;
            }
            TokenKind::If => "an 'if' statement inside an 'always' block".to_string(),
            TokenKind::Case | TokenKind::Casex | TokenKind::Casez => format!(
                "a {} statement inside an 'always' block",
                self.current().describe()
            ),
            TokenKind::For | TokenKind::While | TokenKind::Repeat | TokenKind::Forever => {
                format!("a {} loop", self.current().describe())
            }
            TokenKind::Begin => "a nested 'begin' block".to_string(),
            TokenKind::Wait => "a 'wait' statement".to_string(),
            TokenKind::Hash => "a delay control".to_string(),
            TokenKind::At => "an event control inside a block".to_string(),
            TokenKind::Assign => "a procedural 'assign'".to_string(),
            TokenKind::SystemIdentifier => format!("the system task '{}'", self.current_text()),
            _ => {
                self.expected("an assignment");
                self.recover_to_semicolon();
                return None;
            }
        };
        self.unsupported(&what, start);
        self.skip_statement();
        None
    }

    /// Parses `target = value` (or `<=` outside continuous assignments),
    /// without the terminating `;`.
    pub(crate) fn parse_assignment(&mut self, kind: AssignKind) -> Assign {
        let target = self.parse_lvalue();
        let kind = match (self.current(), kind) {
            (TokenKind::Equals, _) => kind,
            (TokenKind::LessEquals, AssignKind::Blocking | AssignKind::NonBlocking) => {
                AssignKind::NonBlocking
            }
            _ => {
                self.expected("'='");
                let span = target.span();
                return Assign {
                    target,
                    value: Expr::Error(span),
                    kind,
                    span,
                };
            }
        };
        self.advance();

        if self.at(TokenKind::Hash) {
            let span = self.current_span();
            self.unsupported("an intra-assignment delay", span);
            self.advance();
            if self.at(TokenKind::LeftParen) {
                self.skip_group(TokenKind::LeftParen, TokenKind::RightParen);
            } else {
                self.advance();
            }
        }

        let value = self.parse_expr();
        Assign {
            span: target.span().merge(value.span()),
            target,
            value,
            kind,
        }
    }

    fn parse_lvalue(&mut self) -> Expr {
        let start = self.current_span();
        match self.current() {
            TokenKind::Identifier => {
                let base = DeclName {
                    name: self.interner.get_or_intern(self.current_text()),
                    span: start,
                };
                self.advance();
                if self.at(TokenKind::LeftBracket) {
                    self.parse_select(base)
                } else {
                    Expr::Identifier {
                        name: base.name,
                        span: start,
                    }
                }
            }
            TokenKind::LeftBrace => {
                self.depth += 1;
                let target = if self.depth > self.max_depth {
                    self.nesting_limit()
                } else {
                    self.advance();
                    let mut elements = vec![self.parse_lvalue()];
                    while self.eat(TokenKind::Comma) {
                        elements.push(self.parse_lvalue());
                    }
                    self.expect(TokenKind::RightBrace);
                    Expr::Concat {
                        elements,
                        span: start.merge(self.prev_span()),
                    }
                };
                self.depth -= 1;
                target
            }
            _ => {
                self.expected("an assignment target");
                Expr::Error(start)
            }
        }
    }

    /// Skips one procedural statement, including nested blocks and
    /// branches.
    ///
    /// Prefixes such as `if (...)` or `@(...)` are stepped over and `open`
    /// counts the `begin` blocks not yet closed; nesting never recurses.
    pub(crate) fn skip_statement(&mut self) {
        let mut open = 0usize;
        loop {
            match self.current() {
                TokenKind::Endmodule | TokenKind::Eof => return,
                TokenKind::Begin => {
                    self.advance();
                    open += 1;
                    continue;
                }
                TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Repeat
                | TokenKind::Wait => {
                    self.advance();
                    self.skip_group(TokenKind::LeftParen, TokenKind::RightParen);
                    continue;
                }
                TokenKind::Forever => {
                    self.advance();
                    continue;
                }
                TokenKind::Hash | TokenKind::At => {
                    self.advance();
                    if self.at(TokenKind::LeftParen) {
                        self.skip_group(TokenKind::LeftParen, TokenKind::RightParen);
                    } else {
                        self.advance();
                    }
                    continue;
                }
                TokenKind::Case | TokenKind::Casex | TokenKind::Casez => {
                    self.advance();
                    let mut depth = 1usize;
                    while depth > 0 && !self.at(TokenKind::Endmodule) && !self.at_eof() {
                        match self.current() {
                            TokenKind::Case | TokenKind::Casex | TokenKind::Casez => depth += 1,
                            TokenKind::Endcase => depth -= 1,
                            _ => {}
                        }
                        self.advance();
                    }
                }
                TokenKind::End if open > 0 => {
                    self.advance();
                    open -= 1;
                }
                _ => self.recover_to_semicolon(),
            }
            // One statement is complete; an `else` continues the enclosing
            // `if` with another statement.
            if self.eat(TokenKind::Else) {
                continue;
            }
            if open == 0 {
                return;
            }
        }
    }
}
