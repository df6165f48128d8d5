//! Port extraction.
//!
//! Turns the header and the direction declarations of a module into an
//! ordered list of [`Port`]s, for both ANSI headers
//! (`module m(input [3:0] a, output y)`) and non-ANSI headers
//! (`module m(a, y); input [3:0] a; output y;`).

use crate::ast::{Expr, ModuleDecl, ModuleItem, PortDecl, PortDirection, PortStyle, Range};
use hdlgrade_common::{Ident, Interner, Value};
use hdlgrade_diagnostics::{Diagnostic, DiagnosticSink, ErrorKind};
use hdlgrade_ir::{BinaryOp, Direction, NetKind, Port};
use hdlgrade_source::Span;
use std::collections::{HashMap, HashSet};

/// Folds an expression made of numbers and arithmetic into an integer.
pub(crate) fn fold_constant(expr: &Expr) -> Option<u64> {
    match expr {
        Expr::Number { value, .. } => Some(value.bits()),
        Expr::Binary {
            op, left, right, ..
        } => {
            let l = fold_constant(left)?;
            let r = fold_constant(right)?;
            match op {
                BinaryOp::Add => l.checked_add(r),
                BinaryOp::Sub => l.checked_sub(r),
                BinaryOp::Mul => l.checked_mul(r),
                BinaryOp::Div => l.checked_div(r),
                BinaryOp::Mod => l.checked_rem(r),
                BinaryOp::Shl => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
                BinaryOp::Shr => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Why a declared range could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RangeError {
    NotConstant(Span),
    Inverted { msb: u64, lsb: u64 },
    TooWide(u64),
    BoundTooLarge(u64),
}

impl RangeError {
    pub(crate) fn message(&self, subject: &str) -> String {
        match self {
            RangeError::NotConstant(_) => {
                format!("the range of {subject} must have constant integer bounds")
            }
            RangeError::Inverted { msb, lsb } => format!(
                "the range [{msb}:{lsb}] of {subject} is inverted: the low bound is greater than the high bound"
            ),
            RangeError::TooWide(width) => format!(
                "{subject} is {width} bits wide; at most {} bits are supported",
                Value::MAX_WIDTH
            ),
            RangeError::BoundTooLarge(bound) => {
                format!("bound {bound} in the range of {subject} is too large")
            }
        }
    }
}

/// Resolves an optional `[msb:lsb]` to `(width, lsb)`. No range is one bit
/// at index 0.
pub(crate) fn range_shape(range: Option<&Range>) -> Result<(u32, u32), RangeError> {
    let Some(range) = range else {
        return Ok((1, 0));
    };
    let msb = fold_constant(&range.msb).ok_or(RangeError::NotConstant(range.msb.span()))?;
    let lsb = fold_constant(&range.lsb).ok_or(RangeError::NotConstant(range.lsb.span()))?;
    if lsb > msb {
        return Err(RangeError::Inverted { msb, lsb });
    }
    let width = (msb - lsb).saturating_add(1);
    if width > u64::from(Value::MAX_WIDTH) {
        return Err(RangeError::TooWide(width));
    }
    if u32::try_from(msb).is_err() {
        return Err(RangeError::BoundTooLarge(msb));
    }
    Ok((width as u32, lsb as u32))
}

/// Extracts the ports of `module` in header order.
///
/// Problems are reported as `PortDeclarationError`s; the returned list then
/// holds the ports that could be resolved.
pub fn extract_ports(module: &ModuleDecl, interner: &Interner, sink: &DiagnosticSink) -> Vec<Port> {
    let mut extractor = Extractor {
        interner,
        sink,
        module_name: interner.resolve(module.name.name),
        ports: Vec::new(),
        seen: HashSet::new(),
    };

    match module.port_style {
        PortStyle::Ansi => {
            for decl in &module.ansi_ports {
                let shape = extractor.decl_shape(decl);
                for name in &decl.names {
                    extractor.declare(decl, shape, name.name, name.span);
                }
            }
            extractor.reject_body_declarations(module, true);
        }
        PortStyle::NonAnsi => extractor.non_ansi(module),
        PortStyle::Empty => extractor.reject_body_declarations(module, false),
    }
    extractor.apply_net_declarations(&module.items);

    tracing::debug!(
        module = extractor.module_name,
        ports = extractor.ports.len(),
        "extracted ports"
    );
    extractor.ports
}

struct Extractor<'a> {
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    module_name: &'a str,
    ports: Vec<Port>,
    seen: HashSet<Ident>,
}

impl Extractor<'_> {
    fn error(&self, message: String, span: Span) {
        self.sink.emit(Diagnostic::of_kind(
            ErrorKind::PortDeclarationError,
            message,
            span,
        ));
    }

    fn name(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// Resolves the range of a declaration once for all of its names.
    fn decl_shape(&self, decl: &PortDecl) -> (u32, u32) {
        match range_shape(decl.range.as_ref()) {
            Ok(shape) => shape,
            Err(err) => {
                let subject = match decl.names.first() {
                    Some(first) => format!("port '{}'", self.name(first.name)),
                    None => "this port".to_string(),
                };
                let span = match err {
                    RangeError::NotConstant(span) => span,
                    _ => decl.range.as_ref().map_or(decl.span, |r| r.span),
                };
                self.error(err.message(&subject), span);
                (1, 0)
            }
        }
    }

    fn declare(&mut self, decl: &PortDecl, shape: (u32, u32), name: Ident, span: Span) {
        if !self.seen.insert(name) {
            self.error(format!("port '{}' is declared twice", self.name(name)), span);
            return;
        }
        let direction = match decl.direction {
            PortDirection::Input => Direction::Input,
            PortDirection::Output => Direction::Output,
            PortDirection::Inout => {
                self.error(
                    format!("'inout' port '{}' is not supported", self.name(name)),
                    span,
                );
                return;
            }
        };
        self.ports.push(Port {
            name,
            direction,
            width: shape.0,
            lsb: shape.1,
            net_kind: decl.net_kind.unwrap_or(NetKind::Wire),
            span,
        });
    }

    fn non_ansi(&mut self, module: &ModuleDecl) {
        let mut header = HashSet::new();
        for name in &module.header_names {
            if !header.insert(name.name) {
                self.error(
                    format!(
                        "port '{}' is listed twice in the header of module '{}'",
                        self.name(name.name),
                        self.module_name
                    ),
                    name.span,
                );
            }
        }

        let mut decls: Vec<(&PortDecl, (u32, u32))> = Vec::new();
        let mut declared: HashMap<Ident, usize> = HashMap::new();
        for item in &module.items {
            let ModuleItem::PortDecl(decl) = item else {
                continue;
            };
            let index = decls.len();
            decls.push((decl, self.decl_shape(decl)));
            for name in &decl.names {
                if !header.contains(&name.name) {
                    self.error(
                        format!(
                            "'{}' is declared as {} but is not in the port list of module '{}'",
                            self.name(name.name),
                            direction_noun(decl.direction),
                            self.module_name
                        ),
                        name.span,
                    );
                } else if declared.insert(name.name, index).is_some() {
                    self.error(
                        format!("port '{}' is declared twice", self.name(name.name)),
                        name.span,
                    );
                }
            }
        }

        for name in &module.header_names {
            if self.seen.contains(&name.name) {
                continue;
            }
            match declared.get(&name.name) {
                Some(&index) => {
                    let (decl, shape) = decls[index];
                    let span = decl
                        .names
                        .iter()
                        .find(|n| n.name == name.name)
                        .map_or(name.span, |n| n.span);
                    self.declare(decl, shape, name.name, span);
                }
                None => {
                    self.seen.insert(name.name);
                    self.sink.emit(
                        Diagnostic::of_kind(
                            ErrorKind::PortDeclarationError,
                            format!(
                                "port '{}' has no direction",
                                self.name(name.name)
                            ),
                            name.span,
                        )
                        .with_help(format!(
                            "declare it in the module body, e.g. 'input {};' or 'output {};'",
                            self.name(name.name),
                            self.name(name.name)
                        )),
                    );
                }
            }
        }
    }

    /// Body direction declarations are only valid with a non-ANSI header.
    fn reject_body_declarations(&self, module: &ModuleDecl, ansi: bool) {
        for item in &module.items {
            let ModuleItem::PortDecl(decl) = item else {
                continue;
            };
            for name in &decl.names {
                let message = if ansi && self.seen.contains(&name.name) {
                    format!(
                        "port '{}' is already declared in the module header",
                        self.name(name.name)
                    )
                } else {
                    format!(
                        "'{}' is declared as {} but is not in the port list of module '{}'",
                        self.name(name.name),
                        direction_noun(decl.direction),
                        self.module_name
                    )
                };
                self.error(message, name.span);
            }
        }
    }

    /// Applies `reg y;` style declarations that name an existing port.
    fn apply_net_declarations(&mut self, items: &[ModuleItem]) {
        for item in items {
            let ModuleItem::NetDecl(decl) = item else {
                continue;
            };
            let shape = decl.range.as_ref().map(|r| range_shape(Some(r)));
            for name in &decl.names {
                let Some(index) = self.ports.iter().position(|p| p.name == name.decl.name) else {
                    continue;
                };
                if let Some(Ok((width, lsb))) = shape {
                    let port = &self.ports[index];
                    if port.width != width || port.lsb != lsb {
                        self.error(
                            format!(
                                "the range of '{}' in its net declaration does not match its port declaration",
                                self.name(name.decl.name)
                            ),
                            name.decl.span,
                        );
                        continue;
                    }
                }
                self.ports[index].net_kind = decl.kind;
            }
        }
    }
}

fn direction_noun(direction: PortDirection) -> &'static str {
    match direction {
        PortDirection::Input => "an input",
        PortDirection::Output => "an output",
        PortDirection::Inout => "an inout",
    }
}
