//! Expression parsing with binding powers.
//!
//! Operators bind, loosest first: `?:`, `||`, `&&`, `|`, `^`/`~^`, `&`,
//! equality, relational, shifts, `+`/`-`, `*`/`/`/`%`, then prefix
//! operators and postfix selects. Binary operators are left associative.
//! The conditional is right associative through its false branch only.

use crate::ast::{DeclName, Expr, PartSelect};
use crate::parser::Parser;
use crate::token::TokenKind;
use hdlgrade_common::{Radix, Value, ValueError};
use hdlgrade_diagnostics::ErrorKind;
use hdlgrade_ir::{BinaryOp, UnaryOp};

const PREFIX_BP: u8 = 23;

/// Left and right binding power of an infix operator.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8, BinaryOp)> {
    let (l, r, op) = match kind {
        TokenKind::DoublePipe => (1, 2, BinaryOp::LogicalOr),
        TokenKind::DoubleAmpersand => (3, 4, BinaryOp::LogicalAnd),
        TokenKind::Pipe => (5, 6, BinaryOp::Or),
        TokenKind::Caret => (7, 8, BinaryOp::Xor),
        TokenKind::TildeCaret => (7, 8, BinaryOp::Xnor),
        TokenKind::Ampersand => (9, 10, BinaryOp::And),
        TokenKind::DoubleEquals | TokenKind::TripleEquals => (11, 12, BinaryOp::Eq),
        TokenKind::BangEquals | TokenKind::BangDoubleEquals => (11, 12, BinaryOp::Ne),
        TokenKind::LessThan => (13, 14, BinaryOp::Lt),
        TokenKind::LessEquals => (13, 14, BinaryOp::Le),
        TokenKind::GreaterThan => (13, 14, BinaryOp::Gt),
        TokenKind::GreaterEquals => (13, 14, BinaryOp::Ge),
        TokenKind::DoubleLess | TokenKind::TripleLess => (15, 16, BinaryOp::Shl),
        TokenKind::DoubleGreater | TokenKind::TripleGreater => (15, 16, BinaryOp::Shr),
        TokenKind::Plus => (17, 18, BinaryOp::Add),
        TokenKind::Minus => (17, 18, BinaryOp::Sub),
        TokenKind::Star => (19, 20, BinaryOp::Mul),
        TokenKind::Slash => (19, 20, BinaryOp::Div),
        TokenKind::Percent => (19, 20, BinaryOp::Mod),
        _ => return None,
    };
    Some((l, r, op))
}

fn prefix_op(kind: TokenKind) -> Option<UnaryOp> {
    Some(match kind {
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Minus => UnaryOp::Neg,
        TokenKind::Ampersand => UnaryOp::ReduceAnd,
        TokenKind::Pipe => UnaryOp::ReduceOr,
        TokenKind::Caret => UnaryOp::ReduceXor,
        TokenKind::TildeAmpersand => UnaryOp::ReduceNand,
        TokenKind::TildePipe => UnaryOp::ReduceNor,
        TokenKind::TildeCaret => UnaryOp::ReduceXnor,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Parses a full expression, including a top-level conditional.
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        self.depth += 1;
        let result = if self.depth > self.max_depth {
            self.nesting_limit()
        } else {
            let lhs = self.parse_prefix();
            self.parse_infix(lhs, min_bp)
        };
        self.depth -= 1;
        result
    }

    /// Reports nesting past `max_depth`. Later errors in the same module
    /// item are suppressed, so the report appears once.
    pub(crate) fn nesting_limit(&mut self) -> Expr {
        let span = self.current_span();
        self.report(
            ErrorKind::SyntaxError,
            format!(
                "expression nesting exceeds the limit of {} levels",
                self.max_depth
            ),
            span,
        );
        self.quiet = true;
        Expr::Error(span)
    }

    fn parse_infix(&mut self, mut lhs: Expr, min_bp: u8) -> Expr {
        loop {
            let kind = self.current();

            if kind == TokenKind::Question {
                if min_bp > 0 {
                    break;
                }
                return self.parse_conditional(lhs);
            }

            // `+:` and `-:` belong to an indexed part select.
            if matches!(kind, TokenKind::Plus | TokenKind::Minus)
                && self.peek_kind(1) == TokenKind::Colon
            {
                break;
            }

            if kind == TokenKind::DoubleStar {
                if min_bp > 20 {
                    break;
                }
                let op_span = self.current_span();
                self.unsupported("the power operator '**'", op_span);
                self.advance();
                let rhs = self.parse_expr_bp(21);
                lhs = Expr::Error(lhs.span().merge(rhs.span()));
                continue;
            }

            let Some((l_bp, r_bp, op)) = infix_binding_power(kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr_bp(r_bp);
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            };
        }
        lhs
    }

    /// Parses `? a : b` after `condition`. A bare conditional in the true
    /// branch is parsed for recovery but rejected.
    fn parse_conditional(&mut self, condition: Expr) -> Expr {
        self.advance();
        let mut then_expr = self.parse_expr_bp(1);
        let mut rejected = false;
        if self.at(TokenKind::Question) {
            self.report(
                ErrorKind::SyntaxError,
                "a conditional inside the true branch of '?:' must be parenthesized",
                then_expr.span().merge(self.current_span()),
            );
            then_expr = self.parse_conditional(then_expr);
            rejected = true;
        }
        if !self.expect(TokenKind::Colon) {
            return Expr::Error(condition.span().merge(self.prev_span()));
        }
        let else_expr = self.parse_expr_bp(0);
        let span = condition.span().merge(else_expr.span());
        if rejected {
            return Expr::Error(span);
        }
        Expr::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            span,
        }
    }

    fn parse_prefix(&mut self) -> Expr {
        let start = self.current_span();
        let kind = self.current();
        if kind == TokenKind::Plus {
            self.advance();
            return self.parse_expr_bp(PREFIX_BP);
        }
        if let Some(op) = prefix_op(kind) {
            self.advance();
            let operand = self.parse_expr_bp(PREFIX_BP);
            let span = start.merge(operand.span());
            return Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            };
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Expr {
        let start = self.current_span();
        match self.current() {
            TokenKind::Identifier => {
                let base = DeclName {
                    name: self.interner.get_or_intern(self.current_text()),
                    span: start,
                };
                self.advance();
                match self.current() {
                    TokenKind::LeftBracket => self.parse_select(base),
                    TokenKind::LeftParen => {
                        let name = self.interner.resolve(base.name).to_string();
                        self.unsupported(&format!("calling function '{name}'"), start);
                        self.skip_group(TokenKind::LeftParen, TokenKind::RightParen);
                        Expr::Error(start.merge(self.prev_span()))
                    }
                    _ => Expr::Identifier {
                        name: base.name,
                        span: start,
                    },
                }
            }
            TokenKind::IntLiteral | TokenKind::BasedLiteral => self.parse_number(),
            TokenKind::RealLiteral => {
                self.unsupported("a real number", start);
                self.advance();
                Expr::Error(start)
            }
            TokenKind::StringLiteral => {
                self.unsupported("a string literal", start);
                self.advance();
                Expr::Error(start)
            }
            TokenKind::SystemIdentifier => {
                let name = self.current_text();
                self.unsupported(&format!("the system function '{name}'"), start);
                self.advance();
                self.skip_group(TokenKind::LeftParen, TokenKind::RightParen);
                Expr::Error(start.merge(self.prev_span()))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(TokenKind::RightParen);
                inner
            }
            TokenKind::LeftBrace => self.parse_concat(),
            _ => {
                self.expected("an expression");
                Expr::Error(start)
            }
        }
    }

    fn parse_number(&mut self) -> Expr {
        let span = self.current_span();
        let text = self.current_text();
        self.advance();
        match Value::parse_literal(text, Radix::Decimal) {
            Ok(value) => Expr::Number { value, span },
            Err(err @ ValueError::FourState { .. }) => {
                self.report(ErrorKind::UnsupportedConstructError, err.to_string(), span);
                Expr::Error(span)
            }
            Err(err) => {
                self.report(ErrorKind::SyntaxError, format!("invalid number: {err}"), span);
                Expr::Error(span)
            }
        }
    }

    /// Parses `{a, b}` or `{n{a, b}}`.
    fn parse_concat(&mut self) -> Expr {
        let start = self.current_span();
        self.advance();
        if self.at(TokenKind::RightBrace) {
            self.advance();
            let span = start.merge(self.prev_span());
            self.report(ErrorKind::SyntaxError, "empty concatenation '{}'", span);
            return Expr::Error(span);
        }

        let first = self.parse_expr();
        if self.eat(TokenKind::LeftBrace) {
            let elements = self.parse_expr_list();
            self.expect(TokenKind::RightBrace);
            self.expect(TokenKind::RightBrace);
            return Expr::Repeat {
                count: Box::new(first),
                elements,
                span: start.merge(self.prev_span()),
            };
        }

        let mut elements = vec![first];
        while self.eat(TokenKind::Comma) {
            elements.push(self.parse_expr());
        }
        self.expect(TokenKind::RightBrace);
        Expr::Concat {
            elements,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_expr_list(&mut self) -> Vec<Expr> {
        let mut elements = vec![self.parse_expr()];
        while self.eat(TokenKind::Comma) {
            elements.push(self.parse_expr());
        }
        elements
    }

    /// Parses `[i]`, `[m:l]`, `[b+:w]` or `[b-:w]` after `base`.
    pub(crate) fn parse_select(&mut self, base: DeclName) -> Expr {
        self.advance();
        let first = self.parse_expr();
        let expr = match self.current() {
            TokenKind::RightBracket => {
                self.advance();
                Expr::Index {
                    base,
                    index: Box::new(first),
                    span: base.span.merge(self.prev_span()),
                }
            }
            TokenKind::Colon => {
                self.advance();
                let lsb = self.parse_expr();
                self.expect(TokenKind::RightBracket);
                Expr::PartSelect {
                    base,
                    select: PartSelect::Range {
                        msb: Box::new(first),
                        lsb: Box::new(lsb),
                    },
                    span: base.span.merge(self.prev_span()),
                }
            }
            TokenKind::Plus | TokenKind::Minus if self.peek_kind(1) == TokenKind::Colon => {
                let ascending = self.at(TokenKind::Plus);
                self.advance();
                self.advance();
                let width = self.parse_expr();
                self.expect(TokenKind::RightBracket);
                Expr::PartSelect {
                    base,
                    select: PartSelect::Indexed {
                        base: Box::new(first),
                        width: Box::new(width),
                        ascending,
                    },
                    span: base.span.merge(self.prev_span()),
                }
            }
            _ => {
                self.expected("']'");
                return Expr::Error(base.span.merge(first.span()));
            }
        };

        if self.at(TokenKind::LeftBracket) {
            let span = self.current_span();
            self.unsupported("selecting from a select (multi-dimensional arrays)", span);
            self.skip_group(TokenKind::LeftBracket, TokenKind::RightBracket);
            return Expr::Error(expr.span().merge(self.prev_span()));
        }
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use hdlgrade_common::Interner;
    use hdlgrade_diagnostics::{Diagnostic, DiagnosticSink};
    use hdlgrade_source::FileId;

    fn parse_with_depth(text: &str, max_depth: usize) -> (Expr, Vec<Diagnostic>, Interner) {
        let sink = DiagnosticSink::new();
        let interner = Interner::new();
        let tokens = lex(text, FileId::from_raw(0), &sink);
        let mut parser = Parser::new(tokens, text, &interner, &sink, max_depth);
        let expr = parser.parse_expr();
        if !parser.at_eof() {
            parser.expected("end of expression");
        }
        (expr, sink.take_all(), interner)
    }

    fn parse(text: &str) -> (Expr, Vec<Diagnostic>, Interner) {
        parse_with_depth(text, 256)
    }

    /// Renders the tree as an s-expression to check its shape.
    fn sexp(expr: &Expr, interner: &Interner) -> String {
        match expr {
            Expr::Identifier { name, .. } => interner.resolve(*name).to_string(),
            Expr::Number { value, .. } => value.to_string(),
            Expr::Unary { op, operand, .. } => {
                format!("({} {})", op.symbol(), sexp(operand, interner))
            }
            Expr::Binary {
                op, left, right, ..
            } => format!(
                "({} {} {})",
                op.symbol(),
                sexp(left, interner),
                sexp(right, interner)
            ),
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => format!(
                "(? {} {} {})",
                sexp(condition, interner),
                sexp(then_expr, interner),
                sexp(else_expr, interner)
            ),
            Expr::Concat { elements, .. } => format!(
                "{{{}}}",
                elements
                    .iter()
                    .map(|e| sexp(e, interner))
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            Expr::Repeat {
                count, elements, ..
            } => format!(
                "{{{} {{{}}}}}",
                sexp(count, interner),
                elements
                    .iter()
                    .map(|e| sexp(e, interner))
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            Expr::Index { base, index, .. } => {
                format!("{}[{}]", interner.resolve(base.name), sexp(index, interner))
            }
            Expr::PartSelect { base, select, .. } => match select {
                PartSelect::Range { msb, lsb } => format!(
                    "{}[{}:{}]",
                    interner.resolve(base.name),
                    sexp(msb, interner),
                    sexp(lsb, interner)
                ),
                PartSelect::Indexed {
                    base: anchor,
                    width,
                    ascending,
                } => format!(
                    "{}[{}{}:{}]",
                    interner.resolve(base.name),
                    sexp(anchor, interner),
                    if *ascending { "+" } else { "-" },
                    sexp(width, interner)
                ),
            },
            Expr::Error(_) => "<error>".to_string(),
        }
    }

    fn shape(text: &str) -> String {
        let (expr, errors, interner) = parse(text);
        assert!(
            errors.is_empty(),
            "unexpected errors for {text:?}: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
        sexp(&expr, &interner)
    }

    fn first_error(text: &str) -> Diagnostic {
        let (_, errors, _) = parse(text);
        errors.into_iter().next().expect("expected an error")
    }

    #[test]
    fn precedence_climbs() {
        assert_eq!(shape("a | b & c"), "(| a (& b c))");
        assert_eq!(shape("a || b && c"), "(|| a (&& b c))");
        assert_eq!(shape("a ^ b | c"), "(| (^ a b) c)");
        assert_eq!(shape("a + b * c"), "(+ a (* b c))");
        assert_eq!(shape("a == b < c"), "(== a (< b c))");
        assert_eq!(shape("a << 1 + b"), "(<< a (+ 1'b1 b))");
        assert_eq!(shape("a & b == c"), "(& a (== b c))");
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(shape("a - b - c"), "(- (- a b) c)");
        assert_eq!(shape("a ^ b ^ c"), "(^ (^ a b) c)");
    }

    #[test]
    fn parentheses_restart_precedence() {
        assert_eq!(shape("(a | b) & c"), "(& (| a b) c)");
        assert_eq!(shape("~(a & b)"), "(~ (& a b))");
    }

    #[test]
    fn prefix_operators_bind_tightest() {
        assert_eq!(shape("~a & b"), "(& (~ a) b)");
        assert_eq!(shape("!a || b"), "(|| (! a) b)");
        assert_eq!(shape("-a + b"), "(+ (- a) b)");
        assert_eq!(shape("&v | ^w"), "(| (& v) (^ w))");
        assert_eq!(shape("~&v"), "(~& v)");
        assert_eq!(shape("+a"), "a");
    }

    #[test]
    fn conditional_nests_in_false_branch() {
        assert_eq!(shape("s ? a : b"), "(? s a b)");
        assert_eq!(shape("s1 ? a : s0 ? b : c"), "(? s1 a (? s0 b c))");
        assert_eq!(shape("s1 ? (s0 ? a : b) : c"), "(? s1 (? s0 a b) c)");
        assert_eq!(shape("a & b ? x | y : z"), "(? (& a b) (| x y) z)");
    }

    #[test]
    fn unparenthesized_conditional_in_true_branch_is_rejected() {
        let (expr, errors, _) = parse("s1 ? s0 ? a : b : c");
        assert!(matches!(expr, Expr::Error(_)));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), Some(ErrorKind::SyntaxError));
        assert!(errors[0].message.contains("must be parenthesized"));
    }

    #[test]
    fn missing_colon() {
        let err = first_error("s ? a b");
        assert_eq!(err.message, "expected ':', found an identifier");
    }

    #[test]
    fn literals() {
        assert_eq!(shape("0"), "1'b0");
        assert_eq!(shape("1"), "1'b1");
        assert_eq!(shape("5"), "3'b101");
        assert_eq!(shape("4'b1010"), "4'b1010");
        assert_eq!(shape("8'hA5"), "8'b10100101");
        assert_eq!(shape("'b11"), "2'b11");
        assert_eq!(shape("3 'o7"), "3'b111");
    }

    #[test]
    fn bad_literals() {
        let err = first_error("4'b1x01");
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedConstructError));
        let err = first_error("2'b111");
        assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
        assert!(err.message.starts_with("invalid number"));
        let err = first_error("4'b1021");
        assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn concatenation_and_replication() {
        assert_eq!(shape("{a, b, 1'b0}"), "{a b 1'b0}");
        assert_eq!(shape("{2{a, b}}"), "{2'b10 {a b}}");
        assert_eq!(shape("{a, {b, c}}"), "{a {b c}}");
        let err = first_error("{}");
        assert_eq!(err.message, "empty concatenation '{}'");
    }

    #[test]
    fn selects() {
        assert_eq!(shape("a[0]"), "a[1'b0]");
        assert_eq!(shape("a[3:0]"), "a[2'b11:1'b0]");
        assert_eq!(shape("a[i+1]"), "a[(+ i 1'b1)]");
        assert_eq!(shape("a[0 +: 2]"), "a[1'b0+:2'b10]");
        assert_eq!(shape("a[3 -: 2]"), "a[2'b11-:2'b10]");
        assert_eq!(shape("~a[1] & b[0]"), "(& (~ a[1'b1]) b[1'b0])");
        let err = first_error("m[1][0]");
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedConstructError));
    }

    #[test]
    fn equality_variants() {
        assert_eq!(shape("a === b"), "(== a b)");
        assert_eq!(shape("a !== b"), "(!= a b)");
        assert_eq!(shape("a ~^ b"), "(~^ a b)");
        assert_eq!(shape("a >>> 1"), "(>> a 1'b1)");
    }

    #[test]
    fn unsupported_operands() {
        assert_eq!(
            first_error("a ** 2").kind(),
            Some(ErrorKind::UnsupportedConstructError)
        );
        assert_eq!(
            first_error("f(a)").message,
            "calling function 'f' is not supported"
        );
        assert_eq!(
            first_error("$random").message,
            "the system function '$random' is not supported"
        );
        assert_eq!(
            first_error("1.5").kind(),
            Some(ErrorKind::UnsupportedConstructError)
        );
    }

    #[test]
    fn incomplete_input_is_an_error() {
        assert_eq!(first_error("a &").message, "expected an expression, found end of file");
        assert_eq!(first_error("(a | b").message, "expected ')', found end of file");
    }

    #[test]
    fn depth_limit_reports_once() {
        let deep = format!("{}a{}", "(".repeat(50), ")".repeat(50));
        let (_, errors, _) = parse_with_depth(&deep, 10);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("limit of 10 levels"));

        let (_, errors, _) = parse_with_depth(&deep, 256);
        assert!(errors.is_empty());
    }

    #[test]
    fn long_flat_chains_do_not_count_as_depth() {
        let chain = vec!["a"; 500].join(" + ");
        let (_, errors, _) = parse_with_depth(&chain, 8);
        assert!(errors.is_empty());
    }
}
