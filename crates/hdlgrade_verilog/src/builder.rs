//! Module builder: lowers the parse tree into an immutable
//! [`hdlgrade_ir::Module`].
//!
//! Lowering resolves literal values and constant selects, expands
//! replications, and checks the module-level rules: one module per
//! submission, every name read is declared or assigned earlier, no
//! assignment to an input, and every output driven. Constructs that are
//! accepted but evaluated differently from real hardware produce warnings.

use crate::ast::{self, DeclName, ModuleDecl, ModuleItem, PartSelect, SensitivityList, SourceText};
use crate::ports::{extract_ports, fold_constant, range_shape, RangeError};
use crate::ParseLimits;
use hdlgrade_common::{Ident, Interner, Value};
use hdlgrade_diagnostics::code::{
    W_EDGE_SENSITIVITY, W_INCOMPLETE_SENSITIVITY, W_NONBLOCKING, W_UNUSED_INPUT,
};
use hdlgrade_diagnostics::{Diagnostic, DiagnosticSink, ErrorKind, Label};
use hdlgrade_ir::{
    AssignKind, Assignment, Direction, Expr, Module, Net, Port, Sensitivity, SensitivityItem,
    Statement, Target,
};
use hdlgrade_source::Span;
use std::collections::{HashMap, HashSet};

/// Builds the single module of `ast`.
///
/// Returns `None` when any error was reported while building; the errors
/// are in `sink`.
pub fn build_module(
    ast: &SourceText,
    interner: Interner,
    sink: &DiagnosticSink,
    limits: &ParseLimits,
) -> Option<Module> {
    let decl = ast.modules.first()?;
    let errors_before = sink.error_count();

    if let Some(extra) = ast.modules.get(1) {
        sink.emit(
            Diagnostic::of_kind(
                ErrorKind::UnsupportedConstructError,
                format!(
                    "a second module '{}' is not supported; submit a single module",
                    interner.resolve(extra.name.name)
                ),
                extra.name.span,
            )
            .with_label(Label::secondary(decl.name.span, "the first module is here")),
        );
    }

    let ports = extract_ports(decl, &interner, sink);
    let (nets, statements) = {
        let mut builder = Builder::new(&interner, sink, &ports);
        builder.declare_nets(decl);
        let statements = builder.lower_items(decl);
        builder.check_statement_limit(&statements, limits, decl);
        builder.check_outputs();
        builder.warn_unused_inputs();
        (builder.nets, statements)
    };

    if sink.error_count() > errors_before {
        return None;
    }
    tracing::debug!(
        module = interner.resolve(decl.name.name),
        ports = ports.len(),
        nets = nets.len(),
        statements = statements.len(),
        "built module"
    );
    Some(Module::new(
        decl.name.name,
        ports,
        nets,
        statements,
        decl.span,
        interner,
    ))
}

struct Builder<'a> {
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    ports: &'a [Port],
    port_index: HashMap<Ident, usize>,
    nets: Vec<Net>,
    /// Names written by an earlier statement, in source order.
    assigned: HashSet<Ident>,
    /// Every name read anywhere, for the unused input warning.
    read: HashSet<Ident>,
}

impl<'a> Builder<'a> {
    fn new(interner: &'a Interner, sink: &'a DiagnosticSink, ports: &'a [Port]) -> Self {
        Self {
            interner,
            sink,
            ports,
            port_index: ports.iter().enumerate().map(|(i, p)| (p.name, i)).collect(),
            nets: Vec::new(),
            assigned: HashSet::new(),
            read: HashSet::new(),
        }
    }

    fn name(&self, ident: Ident) -> &'a str {
        self.interner.resolve(ident)
    }

    fn error(&self, kind: ErrorKind, message: String, span: Span) {
        self.sink.emit(Diagnostic::of_kind(kind, message, span));
    }

    fn port(&self, ident: Ident) -> Option<&'a Port> {
        self.port_index.get(&ident).map(|i| &self.ports[*i])
    }

    /// `(width, lsb)` of a declared port or net.
    fn shape(&self, ident: Ident) -> Option<(u32, u32)> {
        self.port(ident)
            .map(|p| (p.width, p.lsb))
            .or_else(|| {
                self.nets
                    .iter()
                    .find(|n| n.name == ident)
                    .map(|n| (n.width, n.lsb))
            })
    }

    fn is_known(&self, ident: Ident) -> bool {
        self.shape(ident).is_some() || self.assigned.contains(&ident)
    }

    // Declarations

    fn declare_nets(&mut self, decl: &ModuleDecl) {
        for item in &decl.items {
            let ModuleItem::NetDecl(net) = item else {
                continue;
            };
            let shape = match range_shape(net.range.as_ref()) {
                Ok(shape) => shape,
                Err(err) => {
                    let subject = match net.names.first() {
                        Some(first) => format!("net '{}'", self.name(first.decl.name)),
                        None => "this net".to_string(),
                    };
                    let (kind, span) = match err {
                        RangeError::NotConstant(span) => (ErrorKind::SyntaxError, span),
                        RangeError::TooWide(_) => (
                            ErrorKind::UnsupportedConstructError,
                            net.range.as_ref().map_or(net.span, |r| r.span),
                        ),
                        _ => (
                            ErrorKind::SyntaxError,
                            net.range.as_ref().map_or(net.span, |r| r.span),
                        ),
                    };
                    self.error(kind, err.message(&subject), span);
                    (1, 0)
                }
            };
            for name in &net.names {
                let ident = name.decl.name;
                if self.port(ident).is_some() {
                    continue;
                }
                if self.nets.iter().any(|n| n.name == ident) {
                    self.error(
                        ErrorKind::SyntaxError,
                        format!("'{}' is declared twice", self.name(ident)),
                        name.decl.span,
                    );
                    continue;
                }
                self.nets.push(Net {
                    name: ident,
                    kind: net.kind,
                    width: shape.0,
                    lsb: shape.1,
                    span: name.decl.span,
                });
            }
        }
    }

    // Statements

    fn lower_items(&mut self, decl: &ModuleDecl) -> Vec<Statement> {
        let mut statements = Vec::new();
        for item in &decl.items {
            match item {
                ModuleItem::NetDecl(net) => {
                    for name in &net.names {
                        let Some(init) = &name.init else {
                            continue;
                        };
                        let value = self.lower_expr(init);
                        let target = self.lower_target(&ast::Expr::Identifier {
                            name: name.decl.name,
                            span: name.decl.span,
                        });
                        if let (Some(value), Some(target)) = (value, target) {
                            statements.push(Statement::ContinuousAssign(Assignment {
                                span: name.decl.span.merge(value.span()),
                                target,
                                value,
                                kind: AssignKind::Continuous,
                            }));
                        }
                    }
                }
                ModuleItem::ContinuousAssign(list) => {
                    for assign in list {
                        if let Some(lowered) = self.lower_assign(assign) {
                            statements.push(Statement::ContinuousAssign(lowered));
                        }
                    }
                }
                ModuleItem::Always(block) => {
                    if let Some(statement) = self.lower_always(block) {
                        statements.push(statement);
                    }
                }
                ModuleItem::PortDecl(_) | ModuleItem::Unsupported(_) => {}
            }
        }
        statements
    }

    fn lower_assign(&mut self, assign: &ast::Assign) -> Option<Assignment> {
        let value = self.lower_expr(&assign.value);
        let target = self.lower_target(&assign.target);
        Some(Assignment {
            target: target?,
            value: value?,
            kind: assign.kind,
            span: assign.span,
        })
    }

    fn lower_always(&mut self, block: &ast::AlwaysBlock) -> Option<Statement> {
        let sensitivity = match &block.sensitivity {
            SensitivityList::Star(_) => Sensitivity::All,
            SensitivityList::List(entries) => {
                let mut items = Vec::with_capacity(entries.len());
                for entry in entries {
                    if !self.is_known(entry.name) {
                        self.unknown(entry.name, entry.span);
                    }
                    self.read.insert(entry.name);
                    items.push(SensitivityItem {
                        edge: entry.edge,
                        signal: entry.name,
                        span: entry.span,
                    });
                }
                Sensitivity::List(items)
            }
        };

        if sensitivity.is_edge_triggered() {
            self.sink.emit(
                Diagnostic::warning(
                    W_EDGE_SENSITIVITY,
                    "edge-triggered block is evaluated as one combinational pass",
                    block.span,
                )
                .with_note("each test vector is a static snapshot; clock edges and stored state are not simulated"),
            );
        }
        if let Some(first) = block.body.iter().find(|a| a.kind == AssignKind::NonBlocking) {
            self.sink.emit(
                Diagnostic::warning(
                    W_NONBLOCKING,
                    "nonblocking assignment is evaluated with blocking semantics",
                    first.span,
                )
                .with_note("assignments take effect immediately, in source order"),
            );
        }

        let mut body = Vec::with_capacity(block.body.len());
        let mut failed = false;
        for assign in &block.body {
            match self.lower_assign(assign) {
                Some(lowered) => body.push(lowered),
                None => failed = true,
            }
        }
        if failed {
            return None;
        }

        if matches!(sensitivity, Sensitivity::List(_)) && !sensitivity.is_edge_triggered() {
            self.warn_incomplete_sensitivity(&sensitivity, &body);
        }

        Some(Statement::Behavioral {
            sensitivity,
            body,
            span: block.span,
        })
    }

    fn warn_incomplete_sensitivity(&self, sensitivity: &Sensitivity, body: &[Assignment]) {
        let mut written = HashSet::new();
        let mut reported = HashSet::new();
        for assign in body {
            let mut missing = Vec::new();
            assign.value.for_each_ident(&mut |name, span| {
                if !sensitivity.contains(name) && !written.contains(&name) && reported.insert(name) {
                    missing.push((name, span));
                }
            });
            for (name, span) in missing {
                self.sink.emit(Diagnostic::warning(
                    W_INCOMPLETE_SENSITIVITY,
                    format!(
                        "'{}' is read in this block but missing from its sensitivity list",
                        self.name(name)
                    ),
                    span,
                ));
            }
            assign.target.for_each_name(&mut |name, _| {
                written.insert(name);
            });
        }
    }

    fn check_statement_limit(&self, statements: &[Statement], limits: &ParseLimits, decl: &ModuleDecl) {
        let count: usize = statements.iter().map(|s| s.assignments().len().max(1)).sum();
        if count > limits.max_statements {
            self.error(
                ErrorKind::StructuralError,
                format!(
                    "module '{}' has {count} statements; at most {} are allowed",
                    self.name(decl.name.name),
                    limits.max_statements
                ),
                decl.name.span,
            );
        }
    }

    fn check_outputs(&self) {
        for port in self.ports.iter().filter(|p| p.is_output()) {
            if !self.assigned.contains(&port.name) {
                let name = self.name(port.name);
                self.sink.emit(
                    Diagnostic::of_kind(
                        ErrorKind::UnassignedOutputError,
                        format!("output port '{name}' is never assigned"),
                        port.span,
                    )
                    .with_help(format!(
                        "drive it with 'assign {name} = ...;' or assign it inside an 'always' block"
                    )),
                );
            }
        }
    }

    fn warn_unused_inputs(&self) {
        for port in self.ports.iter().filter(|p| p.is_input()) {
            if !self.read.contains(&port.name) {
                self.sink.emit(Diagnostic::warning(
                    W_UNUSED_INPUT,
                    format!("input port '{}' is never read", self.name(port.name)),
                    port.span,
                ));
            }
        }
    }

    // Expressions

    fn unknown(&self, name: Ident, span: Span) {
        let text = self.name(name);
        self.sink.emit(
            Diagnostic::of_kind(
                ErrorKind::UnknownIdentifierError,
                format!("unknown identifier '{text}'"),
                span,
            )
            .with_help(format!(
                "declare it as a port or with 'wire {text};', or assign it before this point"
            )),
        );
    }

    /// Checks and records a read of `base`.
    fn read_name(&mut self, base: DeclName) -> bool {
        if !self.is_known(base.name) {
            self.unknown(base.name, base.span);
            return false;
        }
        self.read.insert(base.name);
        true
    }

    /// Lowers an expression. `None` means an error was reported, here or by
    /// the parser.
    fn lower_expr(&mut self, expr: &ast::Expr) -> Option<Expr> {
        match expr {
            ast::Expr::Error(_) => None,
            ast::Expr::Identifier { name, span } => {
                if !self.read_name(DeclName { name: *name, span: *span }) {
                    return None;
                }
                Some(Expr::Identifier {
                    name: *name,
                    span: *span,
                })
            }
            ast::Expr::Number { value, span } => Some(Expr::Literal {
                value: *value,
                span: *span,
            }),
            ast::Expr::Unary { op, operand, span } => {
                let operand = self.lower_expr(operand)?;
                Some(Expr::Unary {
                    op: *op,
                    operand: Box::new(operand),
                    span: *span,
                })
            }
            ast::Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let left = self.lower_expr(left);
                let right = self.lower_expr(right);
                Some(Expr::Binary {
                    op: *op,
                    left: Box::new(left?),
                    right: Box::new(right?),
                    span: *span,
                })
            }
            ast::Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                span,
            } => {
                let condition = self.lower_expr(condition);
                let when_true = self.lower_expr(then_expr);
                let when_false = self.lower_expr(else_expr);
                Some(Expr::Conditional {
                    condition: Box::new(condition?),
                    when_true: Box::new(when_true?),
                    when_false: Box::new(when_false?),
                    span: *span,
                })
            }
            ast::Expr::Concat { elements, span } => {
                let parts = self.lower_all(elements)?;
                Some(Expr::Concat { parts, span: *span })
            }
            ast::Expr::Repeat {
                count,
                elements,
                span,
            } => {
                let count = self.replication_count(count)?;
                let parts = self.lower_all(elements)?;
                let value = Expr::Concat { parts, span: *span };
                let min_width = u64::from(count).saturating_mul(value.min_width());
                if min_width > u64::from(Value::MAX_WIDTH) {
                    self.error(
                        ErrorKind::SyntaxError,
                        format!(
                            "replication is at least {min_width} bits wide; at most {} bits are supported",
                            Value::MAX_WIDTH
                        ),
                        *span,
                    );
                    return None;
                }
                Some(Expr::Repeat {
                    count,
                    value: Box::new(value),
                    span: *span,
                })
            }
            ast::Expr::Index { base, index, span } => {
                if !self.read_name(*base) {
                    return None;
                }
                match fold_constant(index) {
                    Some(bit) => {
                        let (offset, width) = self.select_bounds(*base, bit, bit, *span)?;
                        Some(Expr::Slice {
                            base: base.name,
                            offset,
                            width,
                            span: *span,
                        })
                    }
                    None => {
                        let index = self.lower_expr(index)?;
                        let lsb = self.shape(base.name).map_or(0, |(_, lsb)| lsb);
                        Some(Expr::Index {
                            base: base.name,
                            index: Box::new(index),
                            lsb,
                            span: *span,
                        })
                    }
                }
            }
            ast::Expr::PartSelect { base, select, span } => {
                if !self.read_name(*base) {
                    return None;
                }
                let (offset, width) = self.part_select(*base, select, *span)?;
                Some(Expr::Slice {
                    base: base.name,
                    offset,
                    width,
                    span: *span,
                })
            }
        }
    }

    fn lower_all(&mut self, elements: &[ast::Expr]) -> Option<Vec<Expr>> {
        let lowered: Vec<_> = elements.iter().map(|e| self.lower_expr(e)).collect();
        lowered.into_iter().collect()
    }

    fn replication_count(&self, count: &ast::Expr) -> Option<u32> {
        let span = count.span();
        match fold_constant(count) {
            None => {
                if !count.has_error() {
                    self.error(
                        ErrorKind::SyntaxError,
                        "a replication count must be a constant".to_string(),
                        span,
                    );
                }
                None
            }
            Some(0) => {
                self.error(
                    ErrorKind::SyntaxError,
                    "a replication count must be at least 1".to_string(),
                    span,
                );
                None
            }
            Some(n) if n > u64::from(Value::MAX_WIDTH) => {
                self.error(
                    ErrorKind::SyntaxError,
                    format!(
                        "replication count {n} exceeds the {}-bit value limit",
                        Value::MAX_WIDTH
                    ),
                    span,
                );
                None
            }
            Some(n) => u32::try_from(n).ok(),
        }
    }

    /// Resolves a part select to `(offset, width)` from bit 0.
    fn part_select(&self, base: DeclName, select: &PartSelect, span: Span) -> Option<(u32, u32)> {
        match select {
            PartSelect::Range { msb, lsb } => {
                let (Some(hi), Some(lo)) = (fold_constant(msb), fold_constant(lsb)) else {
                    if !msb.has_error() && !lsb.has_error() {
                        self.error(
                            ErrorKind::SyntaxError,
                            "part-select bounds must be constants".to_string(),
                            span,
                        );
                    }
                    return None;
                };
                if lo > hi {
                    self.error(
                        ErrorKind::SyntaxError,
                        format!(
                            "part-select [{hi}:{lo}] of '{}' is reversed",
                            self.name(base.name)
                        ),
                        span,
                    );
                    return None;
                }
                self.select_bounds(base, lo, hi, span)
            }
            PartSelect::Indexed {
                base: anchor,
                width,
                ascending,
            } => {
                let Some(width) = fold_constant(width).filter(|w| *w > 0) else {
                    self.error(
                        ErrorKind::SyntaxError,
                        "the width of an indexed part-select must be a positive constant".to_string(),
                        span,
                    );
                    return None;
                };
                let Some(anchor) = fold_constant(anchor) else {
                    self.error(
                        ErrorKind::UnsupportedConstructError,
                        "an indexed part-select with a variable base is not supported".to_string(),
                        span,
                    );
                    return None;
                };
                let bounds = if *ascending {
                    anchor.checked_add(width - 1).map(|hi| (anchor, hi))
                } else {
                    anchor.checked_sub(width - 1).map(|lo| (lo, anchor))
                };
                let Some((lo, hi)) = bounds else {
                    self.error(
                        ErrorKind::SyntaxError,
                        format!("part-select of '{}' is out of range", self.name(base.name)),
                        span,
                    );
                    return None;
                };
                self.select_bounds(base, lo, hi, span)
            }
        }
    }

    /// Checks `[hi:lo]` against the declared range of `base`.
    fn select_bounds(&self, base: DeclName, lo: u64, hi: u64, span: Span) -> Option<(u32, u32)> {
        let name = self.name(base.name);
        let (decl_lsb, decl_msb) = match self.shape(base.name) {
            Some((width, lsb)) => (u64::from(lsb), u64::from(lsb) + u64::from(width) - 1),
            // Implicit signals have no declared range; the evaluator checks
            // the select against the value it holds.
            None => (0, u64::from(Value::MAX_WIDTH) - 1),
        };
        if lo < decl_lsb || hi > decl_msb {
            let what = if lo == hi {
                format!("bit {lo}")
            } else {
                format!("[{hi}:{lo}]")
            };
            self.error(
                ErrorKind::SyntaxError,
                format!("{what} is outside the range [{decl_msb}:{decl_lsb}] of '{name}'"),
                span,
            );
            return None;
        }
        Some(((lo - decl_lsb) as u32, (hi - lo + 1) as u32))
    }

    // Targets

    fn lower_target(&mut self, target: &ast::Expr) -> Option<Target> {
        let lowered = self.lower_target_inner(target)?;
        lowered.for_each_name(&mut |name, _| {
            self.assigned.insert(name);
        });
        Some(lowered)
    }

    fn lower_target_inner(&self, target: &ast::Expr) -> Option<Target> {
        match target {
            ast::Expr::Error(_) => None,
            ast::Expr::Identifier { name, span } => {
                self.check_writable(*name, *span)?;
                Some(Target::Signal {
                    name: *name,
                    span: *span,
                })
            }
            ast::Expr::Index { base, index, span } => {
                self.check_writable(base.name, base.span)?;
                self.check_declared_for_select(base)?;
                let Some(bit) = fold_constant(index) else {
                    self.error(
                        ErrorKind::UnsupportedConstructError,
                        "assigning to a bit with a variable index is not supported".to_string(),
                        *span,
                    );
                    return None;
                };
                let (offset, _) = self.select_bounds(*base, bit, bit, *span)?;
                Some(Target::Bit {
                    name: base.name,
                    offset,
                    span: *span,
                })
            }
            ast::Expr::PartSelect { base, select, span } => {
                self.check_writable(base.name, base.span)?;
                self.check_declared_for_select(base)?;
                let (offset, width) = self.part_select(*base, select, *span)?;
                Some(Target::Slice {
                    name: base.name,
                    offset,
                    width,
                    span: *span,
                })
            }
            ast::Expr::Concat { elements, span } => {
                let parts: Vec<_> = elements
                    .iter()
                    .map(|e| self.lower_target_inner(e))
                    .collect();
                Some(Target::Concat {
                    parts: parts.into_iter().collect::<Option<_>>()?,
                    span: *span,
                })
            }
            other => {
                self.error(
                    ErrorKind::SyntaxError,
                    "invalid assignment target".to_string(),
                    other.span(),
                );
                None
            }
        }
    }

    fn check_writable(&self, name: Ident, span: Span) -> Option<()> {
        match self.port(name) {
            Some(port) if port.direction == Direction::Input => {
                self.sink.emit(
                    Diagnostic::of_kind(
                        ErrorKind::PortDeclarationError,
                        format!("input port '{}' cannot be assigned", self.name(name)),
                        span,
                    )
                    .with_label(Label::secondary(port.span, "declared as an input here")),
                );
                None
            }
            _ => Some(()),
        }
    }

    fn check_declared_for_select(&self, base: &DeclName) -> Option<()> {
        if self.shape(base.name).is_some() {
            return Some(());
        }
        let name = self.name(base.name);
        self.sink.emit(
            Diagnostic::of_kind(
                ErrorKind::UnknownIdentifierError,
                format!("'{name}' must be declared before assigning to part of it"),
                base.span,
            )
            .with_help(format!("declare it with 'wire [msb:lsb] {name};'")),
        );
        None
    }
}
