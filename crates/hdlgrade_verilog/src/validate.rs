//! Structural checks on the token stream, run before parsing.
//!
//! These checks catch the mistakes beginners make most often (a missing
//! `endmodule`, an unclosed `begin`, a forgotten `;`) and report them with a
//! precise location, instead of letting the parser stumble into a cascade
//! of confusing errors further down.

use crate::token::{Token, TokenKind};
use hdlgrade_diagnostics::{Diagnostic, ErrorKind, Label, SuggestedFix};
use hdlgrade_source::Span;

/// Runs every structural check and returns the problems found, in the order
/// delimiter balance, then terminators.
pub fn validate_structure(tokens: &[Token], source: &str) -> Vec<Diagnostic> {
    let mut problems = Vec::new();
    check_modules(tokens, source, &mut problems);
    check_blocks(tokens, &mut problems);
    check_terminators(tokens, &mut problems);
    tracing::debug!(
        tokens = tokens.len(),
        problems = problems.len(),
        "validated token structure"
    );
    problems
}

fn structural(message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::of_kind(ErrorKind::StructuralError, message, span)
}

fn eof_span(tokens: &[Token]) -> Span {
    tokens.last().map_or(Span::DUMMY, |t| t.span)
}

fn check_modules(tokens: &[Token], source: &str, out: &mut Vec<Diagnostic>) {
    let mut open: Vec<usize> = Vec::new();
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::Module => open.push(i),
            TokenKind::Endmodule => {
                if open.pop().is_none() {
                    out.push(
                        structural("'endmodule' without a matching 'module'", tok.span)
                            .with_label(Label::primary(tok.span, "nothing to close here")),
                    );
                }
            }
            _ => {}
        }
    }

    let module_count = tokens.iter().filter(|t| t.kind == TokenKind::Module).count();
    if module_count == 0 {
        let first = tokens.first().map_or(Span::DUMMY, |t| t.span);
        out.push(
            structural("no module declaration found", first)
                .with_help("a submission must contain 'module <name>(...); ... endmodule'"),
        );
        return;
    }

    for index in open {
        let keyword = tokens[index].span;
        let name = tokens
            .get(index + 1)
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| &source[t.span.start as usize..t.span.end as usize]);
        let message = match name {
            Some(name) => format!("module '{name}' is missing 'endmodule'"),
            None => "module is missing 'endmodule'".to_string(),
        };
        out.push(
            structural(message, keyword)
                .with_label(Label::primary(keyword, "module opened here"))
                .with_fix(SuggestedFix::insert(
                    "add 'endmodule' at the end of the file",
                    eof_span(tokens),
                    "\nendmodule\n",
                )),
        );
    }
}

fn check_blocks(tokens: &[Token], out: &mut Vec<Diagnostic>) {
    let mut open: Vec<Span> = Vec::new();
    for tok in tokens {
        match tok.kind {
            TokenKind::Begin => open.push(tok.span),
            TokenKind::End => {
                if open.pop().is_none() {
                    out.push(
                        structural("'end' without a matching 'begin'", tok.span)
                            .with_label(Label::primary(tok.span, "nothing to close here")),
                    );
                }
            }
            _ => {}
        }
    }
    for span in open {
        out.push(
            structural("'begin' is never closed by 'end'", span)
                .with_label(Label::primary(span, "block opened here")),
        );
    }
}

/// What kind of fragment is waiting for its `;`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    ModuleHeader,
    Declaration,
    ContinuousAssign,
    Statement,
}

struct Fragment {
    kind: FragmentKind,
    last: usize,
    seen_equals: bool,
}

impl Fragment {
    fn new(kind: FragmentKind, at: usize) -> Self {
        Self {
            kind,
            last: at,
            seen_equals: false,
        }
    }

    fn describe(&self) -> &'static str {
        match self.kind {
            FragmentKind::ModuleHeader => "the module header",
            FragmentKind::Declaration => "this declaration",
            FragmentKind::ContinuousAssign => "this continuous assignment",
            FragmentKind::Statement if self.seen_equals => "this assignment",
            FragmentKind::Statement => "this statement",
        }
    }
}

fn fragment_for(kind: TokenKind) -> Option<FragmentKind> {
    match kind {
        TokenKind::Module => Some(FragmentKind::ModuleHeader),
        TokenKind::Assign => Some(FragmentKind::ContinuousAssign),
        TokenKind::Input
        | TokenKind::Output
        | TokenKind::Inout
        | TokenKind::Wire
        | TokenKind::Reg
        | TokenKind::Integer
        | TokenKind::Real
        | TokenKind::Parameter
        | TokenKind::Localparam
        | TokenKind::Genvar => Some(FragmentKind::Declaration),
        _ => None,
    }
}

fn missing_terminator(tokens: &[Token], fragment: &Fragment, next: Option<usize>) -> Diagnostic {
    let last = tokens[fragment.last].span;
    let mut diag = structural(format!("missing ';' after {}", fragment.describe()), last)
        .with_label(Label::primary(last, "expected ';' after this"))
        .with_fix(SuggestedFix::insert("insert ';'", last.end_point(), ";"));
    if let Some(next) = next {
        let next = &tokens[next];
        let found = if next.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            "the next statement".to_string()
        };
        diag = diag.with_label(Label::secondary(next.span, format!("{found} starts here")));
    }
    diag
}

fn ends_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::BasedLiteral
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightBrace
    )
}

fn check_terminators(tokens: &[Token], out: &mut Vec<Diagnostic>) {
    let mut open: Option<Fragment> = None;
    let mut depth: usize = 0;

    for (i, tok) in tokens.iter().enumerate() {
        let kind = tok.kind;
        let next_kind = tokens.get(i + 1).map(|t| t.kind);

        match kind {
            TokenKind::Eof => {
                if let Some(fragment) = open.take() {
                    out.push(missing_terminator(tokens, &fragment, Some(i)));
                }
                break;
            }
            TokenKind::Semicolon => {
                if open.take().is_some() {
                    depth = 0;
                }
                continue;
            }
            _ => {}
        }

        if depth == 0 && kind.starts_item() {
            if let Some(fragment) = open.take() {
                out.push(missing_terminator(tokens, &fragment, Some(i)));
            }
            open = fragment_for(kind).map(|k| Fragment::new(k, i));
            continue;
        }

        if depth == 0
            && kind == TokenKind::Identifier
            && matches!(next_kind, Some(TokenKind::Equals | TokenKind::LessEquals))
        {
            let prev_kind = i.checked_sub(1).map(|p| tokens[p].kind);
            // `a <= b` is also a comparison, so `<=` only starts a new
            // assignment right after a complete operand.
            let starts_assignment = next_kind == Some(TokenKind::Equals)
                || prev_kind.is_some_and(ends_operand);
            let restarts = match &open {
                Some(f) => {
                    f.seen_equals && starts_assignment && prev_kind != Some(TokenKind::Comma)
                }
                None => false,
            };
            if restarts {
                if let Some(fragment) = open.take() {
                    out.push(missing_terminator(tokens, &fragment, Some(i)));
                }
            }
        }

        if open.is_none()
            && depth == 0
            && matches!(
                kind,
                TokenKind::Identifier | TokenKind::LeftBrace | TokenKind::SystemIdentifier
            )
        {
            open = Some(Fragment::new(FragmentKind::Statement, i));
        }

        match kind {
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                depth = depth.saturating_sub(1)
            }
            _ => {}
        }

        if let Some(fragment) = open.as_mut() {
            fragment.last = i;
            if depth == 0 && matches!(kind, TokenKind::Equals | TokenKind::LessEquals) {
                fragment.seen_equals = true;
            }
        }
    }
}
